//! Reconstruction of cflow's depth-annotated output into a call tree,
//! plus the two consumers of that tree: the hierarchical text view and
//! the Graphviz edge-list view.

mod builder;
mod dot;
mod lexer;
mod tree;
mod tree_view;

pub use builder::{CflowParser, TreeBuilder, MAX_SEARCH_DEPTH};
pub use dot::{DotRenderer, DotStyle};
pub use lexer::LineLexer;
pub use tree::{Branch, BranchItem, CallTree, Node};
pub use tree_view::TreeRenderer;
