use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{CflowgraphError, Result};
use super::CallTree;

/// Cosmetic defaults for the emitted graph. Layout is Graphviz's job;
/// these only seed the description.
#[derive(Debug, Clone)]
pub struct DotStyle {
    pub rankdir: String,
    pub node_shape: String,
    pub arrowhead: String,
}

impl Default for DotStyle {
    fn default() -> Self {
        Self {
            rankdir: "LR".to_string(),
            node_shape: "box".to_string(),
            arrowhead: "vee".to_string(),
        }
    }
}

/// Renders a [`CallTree`] as a Graphviz directed-graph description.
pub struct DotRenderer {
    style: DotStyle,
}

impl DotRenderer {
    pub fn new(style: DotStyle) -> Self {
        Self { style }
    }

    /// Emits the DOT text: one graph node per unique function name, one
    /// edge per caller/callee pair.
    ///
    /// Edges are deduplicated by unordered-pair identity before
    /// emission (first-seen orientation wins): the goal is a readable
    /// structural diagram, not a multiset of call sites.
    pub fn render(&self, tree: &CallTree) -> String {
        let mut names: Vec<&str> = Vec::new();
        let mut seen_names: HashSet<&str> = HashSet::new();
        let mut edges: Vec<(&str, &str)> = Vec::new();
        let mut seen_edges: HashSet<(&str, &str)> = HashSet::new();

        for (parent, node) in tree.edges() {
            if seen_names.insert(&node.name) {
                names.push(&node.name);
            }
            let Some(parent) = parent else { continue };
            let key = if parent.name <= node.name {
                (parent.name.as_str(), node.name.as_str())
            } else {
                (node.name.as_str(), parent.name.as_str())
            };
            if seen_edges.insert(key) {
                edges.push((&parent.name, &node.name));
            }
        }

        let mut dot = String::from("digraph callgraph {\n");
        dot.push_str(&format!("    rankdir={};\n", self.style.rankdir));
        dot.push_str(&format!(
            "    node [shape={}, fontname=\"monospace\"];\n",
            self.style.node_shape
        ));
        dot.push_str(&format!("    edge [arrowhead={}];\n\n", self.style.arrowhead));

        for name in &names {
            dot.push_str(&format!("    \"{}\";\n", escape(name)));
        }
        dot.push('\n');
        for (from, to) in &edges {
            dot.push_str(&format!("    \"{}\" -> \"{}\";\n", escape(from), escape(to)));
        }
        dot.push_str("}\n");
        dot
    }

    /// Writes `<stem>.dot` and asks Graphviz to lay it out as
    /// `<stem>.<format>`.
    pub fn write(&self, tree: &CallTree, stem: &Path, format: &str) -> Result<PathBuf> {
        let dot_path = stem.with_extension("dot");
        fs::write(&dot_path, self.render(tree))?;
        debug!("wrote graph description to {}", dot_path.display());

        let out_path = stem.with_extension(format);
        let output = Command::new("dot")
            .arg(format!("-T{}", format))
            .arg(&dot_path)
            .arg("-o")
            .arg(&out_path)
            .output()
            .map_err(|e| {
                CflowgraphError::Graphviz(format!(
                    "failed to run dot ({}); is Graphviz installed?",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(CflowgraphError::Graphviz(format!(
                "dot exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        info!("rendered graph to {}", out_path.display());
        Ok(out_path)
    }
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
