//! In-memory dependency graph built up by the collectors during one run.

mod accumulator;
mod types;

pub use accumulator::{Graph, GraphSnapshot};
pub use types::{Edge, NewNode, Node, NodeType, GLOBAL_REGION};
#[allow(unused_imports)]
pub use types::Relation;
