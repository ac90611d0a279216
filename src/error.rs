use thiserror::Error;

/// Main error type for cflowgraph operations
#[derive(Error, Debug)]
pub enum CflowgraphError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("cflow error: {0}")]
    Cflow(String),

    #[error("Graphviz error: {0}")]
    Graphviz(String),

    #[error("Output parse error: {0}")]
    Parser(String),

    #[error("Could not find function {name} in cflow output (tried start depths 0 through {depth_bound})")]
    TargetNotFound { name: String, depth_bound: usize },

    #[error("Could not determine end of call graph for {name} (matched at depth {depth}, index {start})")]
    GraphEnd {
        name: String,
        depth: usize,
        start: usize,
    },
}

pub type Result<T> = std::result::Result<T, CflowgraphError>;
