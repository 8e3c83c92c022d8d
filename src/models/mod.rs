mod link_card;
mod tree;

pub use link_card::{LinkCardCache, LinkMetadata};
pub use tree::{Link, Literal, Node, OtherNode, Parent, Point, Position};
