use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One point in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub line: usize,
    pub column: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// Source span of a node, as attached by the Markdown parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start: Point,
    pub end: Point,
}

/// Fields a typed node does not model (`data`, `title`, plugin extras) are
/// kept in `fields` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Parent {
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// `title` is left in `fields` so a `null` title survives a round trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Any node kind the link-card transformer does not inspect (headings,
/// lists, code, ...). Kept verbatim so it serializes back unchanged; only
/// `children` is typed so the scanner can walk through it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A Markdown syntax tree node in the mdast JSON shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Root(Parent),
    Paragraph(Parent),
    Text(Literal),
    Link(Link),
    Html(Literal),
    Other(OtherNode),
}

impl Node {
    pub fn root(children: Vec<Node>) -> Self {
        Node::Root(Parent {
            children,
            position: None,
            fields: Map::new(),
        })
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph(Parent {
            children,
            position: None,
            fields: Map::new(),
        })
    }

    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(Literal {
            value: value.into(),
            position: None,
            fields: Map::new(),
        })
    }

    pub fn link(url: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Link(Link {
            url: url.into(),
            children,
            position: None,
            fields: Map::new(),
        })
    }

    pub fn html(value: impl Into<String>) -> Self {
        Node::Html(Literal {
            value: value.into(),
            position: None,
            fields: Map::new(),
        })
    }

    /// The mdast `type` of this node.
    pub fn kind(&self) -> &str {
        match self {
            Node::Root(_) => "root",
            Node::Paragraph(_) => "paragraph",
            Node::Text(_) => "text",
            Node::Link(_) => "link",
            Node::Html(_) => "html",
            Node::Other(other) => &other.kind,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            Node::Root(p) | Node::Paragraph(p) => p.position,
            Node::Text(l) | Node::Html(l) => l.position,
            Node::Link(l) => l.position,
            Node::Other(other) => other
                .fields
                .get("position")
                .cloned()
                .and_then(|v| serde_json::from_value(v).ok()),
        }
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Root(p) | Node::Paragraph(p) => Some(&p.children),
            Node::Link(l) => Some(&l.children),
            Node::Other(other) => other.children.as_deref(),
            Node::Text(_) | Node::Html(_) => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Root(p) | Node::Paragraph(p) => Some(&mut p.children),
            Node::Link(l) => Some(&mut l.children),
            Node::Other(other) => other.children.as_mut(),
            Node::Text(_) | Node::Html(_) => None,
        }
    }

    /// Follow `path` (child indices from this node) down the tree.
    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        path.iter()
            .try_fold(self, |node, &i| node.children_mut()?.get_mut(i))
    }
}

// ── JSON (de)serialization ───────────────────────────────────────────────
//
// mdast discriminates on a `type` field. Known kinds serialize through an
// internally tagged mirror enum; everything else goes through `OtherNode`,
// which carries its own `type`.

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum TaggedRef<'a> {
    Root(&'a Parent),
    Paragraph(&'a Parent),
    Text(&'a Literal),
    Link(&'a Link),
    Html(&'a Literal),
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Root(p) => TaggedRef::Root(p).serialize(s),
            Node::Paragraph(p) => TaggedRef::Paragraph(p).serialize(s),
            Node::Text(l) => TaggedRef::Text(l).serialize(s),
            Node::Link(l) => TaggedRef::Link(l).serialize(s),
            Node::Html(l) => TaggedRef::Html(l).serialize(s),
            Node::Other(other) => other.serialize(s),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let Value::Object(mut map) = Value::deserialize(d)? else {
            return Err(de::Error::custom("expected an mdast node object"));
        };
        let kind = match map.get("type").and_then(Value::as_str) {
            Some(kind) => kind.to_string(),
            None => return Err(de::Error::missing_field("type")),
        };

        if !matches!(kind.as_str(), "root" | "paragraph" | "text" | "link" | "html") {
            return serde_json::from_value(Value::Object(map))
                .map(Node::Other)
                .map_err(de::Error::custom);
        }

        // The tag is implied by the variant; keep it out of `fields`.
        map.remove("type");
        let rest = Value::Object(map);
        let node = match kind.as_str() {
            "root" => serde_json::from_value(rest).map(Node::Root),
            "paragraph" => serde_json::from_value(rest).map(Node::Paragraph),
            "text" => serde_json::from_value(rest).map(Node::Text),
            "link" => serde_json::from_value(rest).map(Node::Link),
            _ => serde_json::from_value(rest).map(Node::Html),
        };
        node.map_err(de::Error::custom)
    }
}
