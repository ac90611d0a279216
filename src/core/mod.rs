mod cflow;
mod engine;
mod scanner;

// Output parsing and tree reconstruction
mod call_graph;

pub use cflow::{CflowOptions, CflowOutput, CflowRunner};
pub use scanner::SourceScanner;

pub use call_graph::{
    Branch, BranchItem, CallTree, CflowParser, DotRenderer, DotStyle, LineLexer, Node,
    TreeBuilder, TreeRenderer, MAX_SEARCH_DEPTH,
};

// Export the main engine
pub use engine::{Engine, FileSource, RunRequest};
