//! Storage-layer building blocks: the node page format and its collaborators.

pub mod node;
pub mod pager;
