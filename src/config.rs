use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CflowgraphError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source discovery settings
    pub discovery: DiscoveryConfig,

    /// cflow invocation settings
    pub cflow: CflowConfig,

    /// Output rendering settings
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Root path searched for sources when none is given on the CLI
    pub root: Option<PathBuf>,

    /// Path substrings to skip while walking
    pub exclude_paths: Vec<String>,

    /// File the discovered path list is written to
    pub paths_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CflowConfig {
    /// cflow binary to invoke
    pub binary: String,

    /// Default --depth passed to cflow (None = unlimited)
    pub depth: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Trailing path segments kept in the tree view (0 = whole path)
    pub path_parts: usize,

    /// Include signatures in the tree view by default
    pub show_signatures: bool,

    /// Graphviz rank direction
    pub rankdir: String,

    /// Graphviz node shape
    pub node_shape: String,

    /// Graphviz arrowhead style
    pub arrowhead: String,

    /// Default output file for dot rendering
    pub dotfile: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig {
                root: None,
                exclude_paths: vec![],
                paths_file: PathBuf::from("c.files"),
            },
            cflow: CflowConfig {
                binary: "cflow".to_string(),
                depth: None,
            },
            render: RenderConfig {
                path_parts: 4,
                show_signatures: false,
                rankdir: "LR".to_string(),
                node_shape: "box".to_string(),
                arrowhead: "vee".to_string(),
                dotfile: "dot.svg".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| CflowgraphError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CflowgraphError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                // Try common config file locations
                let candidates = [
                    "Cflowgraph.toml",
                    "cflowgraph.toml",
                    ".cflowgraph.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}
