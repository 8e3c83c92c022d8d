use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{Node, Parent, Position};

static BARE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://\S+$").unwrap());

/// A paragraph found to hold nothing but a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandaloneUrlMatch {
    pub url: String,
    /// Child indices from the root down to the paragraph's parent.
    pub parent_path: Vec<usize>,
    /// Index of the paragraph within its parent.
    pub index: usize,
    pub position: Option<Position>,
}

/// The URL of a standalone-URL paragraph, or `None` if it has any other
/// shape.
///
/// Qualifies when the paragraph's only child is either text that is a bare
/// `http(s)` URL, or a link whose visible text is empty, its own target, or
/// a bare URL.
pub fn standalone_url(paragraph: &Parent) -> Option<String> {
    let [child] = paragraph.children.as_slice() else {
        return None;
    };

    match child {
        Node::Text(text) => {
            let value = text.value.trim();
            BARE_URL.is_match(value).then(|| value.to_string())
        }
        Node::Link(link) => match link.children.as_slice() {
            [] => Some(link.url.clone()),
            [Node::Text(text)] => {
                let value = text.value.trim();
                (value == link.url || BARE_URL.is_match(value)).then(|| link.url.clone())
            }
            _ => None,
        },
        _ => None,
    }
}

/// Every standalone-URL paragraph in `tree`, in document order.
pub fn collect_standalone_urls(tree: &Node) -> Vec<StandaloneUrlMatch> {
    let mut matches = Vec::new();
    let mut path = Vec::new();
    visit(tree, &mut path, &mut matches);
    matches
}

fn visit(node: &Node, path: &mut Vec<usize>, matches: &mut Vec<StandaloneUrlMatch>) {
    let Some(children) = node.children() else {
        return;
    };

    for (index, child) in children.iter().enumerate() {
        if let Node::Paragraph(paragraph) = child {
            if let Some(url) = standalone_url(paragraph) {
                matches.push(StandaloneUrlMatch {
                    url,
                    parent_path: path.clone(),
                    index,
                    position: paragraph.position,
                });
            }
        }

        path.push(index);
        visit(child, path, matches);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OtherNode;

    fn para(children: Vec<Node>) -> Parent {
        Parent {
            children,
            ..Default::default()
        }
    }

    fn strong(text: &str) -> Node {
        Node::Other(OtherNode {
            kind: "strong".into(),
            children: Some(vec![Node::text(text)]),
            fields: Default::default(),
        })
    }

    #[test]
    fn plain_text_url() {
        let p = para(vec![Node::text("https://example.com")]);
        assert_eq!(standalone_url(&p).as_deref(), Some("https://example.com"));

        let http = para(vec![Node::text("  http://example.com/path?q=1  ")]);
        assert_eq!(standalone_url(&http).as_deref(), Some("http://example.com/path?q=1"));
    }

    #[test]
    fn non_url_text() {
        assert_eq!(standalone_url(&para(vec![Node::text("just some text")])), None);
        assert_eq!(
            standalone_url(&para(vec![Node::text("Visit https://example.com")])),
            None
        );
        assert_eq!(
            standalone_url(&para(vec![Node::text("ftp://example.com")])),
            None
        );
    }

    #[test]
    fn link_whose_text_is_the_url() {
        let p = para(vec![Node::link(
            "https://example.com",
            vec![Node::text("https://example.com")],
        )]);
        assert_eq!(standalone_url(&p).as_deref(), Some("https://example.com"));
    }

    #[test]
    fn empty_link() {
        let p = para(vec![Node::link("https://example.com", vec![])]);
        assert_eq!(standalone_url(&p).as_deref(), Some("https://example.com"));
    }

    #[test]
    fn link_with_other_url_text_uses_target() {
        let p = para(vec![Node::link(
            "https://example.com/full",
            vec![Node::text("https://example.com/…")],
        )]);
        assert_eq!(standalone_url(&p).as_deref(), Some("https://example.com/full"));
    }

    #[test]
    fn link_with_custom_text() {
        let p = para(vec![Node::link(
            "https://example.com",
            vec![Node::text("Click here")],
        )]);
        assert_eq!(standalone_url(&p), None);
    }

    #[test]
    fn styled_link_text() {
        let p = para(vec![Node::link(
            "https://example.com",
            vec![strong("https://example.com")],
        )]);
        assert_eq!(standalone_url(&p), None);
    }

    #[test]
    fn multiple_children() {
        let p = para(vec![
            Node::text("See "),
            Node::link("https://example.com", vec![Node::text("https://example.com")]),
        ]);
        assert_eq!(standalone_url(&p), None);
        assert_eq!(standalone_url(&para(vec![])), None);
    }

    #[test]
    fn collects_in_document_order_with_paths() {
        let tree = Node::root(vec![
            Node::paragraph(vec![Node::text("https://first.example")]),
            Node::paragraph(vec![Node::text("Some prose.")]),
            Node::Other(OtherNode {
                kind: "blockquote".into(),
                children: Some(vec![Node::paragraph(vec![Node::link(
                    "https://quoted.example",
                    vec![],
                )])]),
                fields: Default::default(),
            }),
            Node::paragraph(vec![Node::text("https://last.example")]),
        ]);

        let matches = collect_standalone_urls(&tree);
        let urls: Vec<_> = matches.iter().map(|m| m.url.as_str()).collect();
        assert_eq!(
            urls,
            ["https://first.example", "https://quoted.example", "https://last.example"]
        );
        assert!(matches[0].parent_path.is_empty());
        assert_eq!(matches[0].index, 0);
        assert_eq!(matches[1].parent_path, vec![2]);
        assert_eq!(matches[1].index, 0);
        assert!(matches[2].parent_path.is_empty());
        assert_eq!(matches[2].index, 3);
    }

    #[test]
    fn parentless_paragraph_is_skipped() {
        let tree = Node::paragraph(vec![Node::text("https://example.com")]);
        assert!(collect_standalone_urls(&tree).is_empty());
    }

    #[test]
    fn leaf_tree_has_no_matches() {
        assert!(collect_standalone_urls(&Node::text("https://example.com")).is_empty());
    }
}
