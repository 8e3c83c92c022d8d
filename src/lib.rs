//! Turn paragraphs that contain nothing but a URL into Open Graph link cards.
//!
//! The entry point is [`LinkCardTransformer::transform`], which takes an
//! mdast-shaped [`Node`] tree, resolves each standalone URL through a
//! persistent [`CacheManager`], and replaces the paragraph with an HTML node.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod html;
pub mod models;
pub mod transform;

pub use cache::CacheManager;
pub use config::{LinkCardOptions, OutputMode};
pub use error::{LinkCardError, LinkCardResult};
pub use models::{LinkCardCache, LinkMetadata, Node};
pub use transform::LinkCardTransformer;
