use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One entry from cflow's depth-annotated output.
///
/// `depth` is always present; cflow emits the signature, definition path
/// and line number together or not at all, so the three optional fields
/// are jointly present or jointly absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Nesting level as reported by cflow (0 = graph root)
    pub depth: usize,

    /// Function name including trailing parentheses, e.g. `main()`
    pub name: String,

    /// Full declaration signature
    pub signature: Option<String>,

    /// File the function is defined in
    pub path: Option<PathBuf>,

    /// Line number of the definition
    pub line: Option<usize>,
}

impl Node {
    /// Node carrying only a depth and a name, as cflow emits for calls
    /// it could not resolve to a definition.
    pub fn bare(depth: usize, name: impl Into<String>) -> Self {
        Self {
            depth,
            name: name.into(),
            signature: None,
            path: None,
            line: None,
        }
    }
}

/// A child of a [`Branch`]: either a call entry or a nested run of
/// deeper calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BranchItem {
    Node(Node),
    Branch(Branch),
}

/// An ordered run of children one call level below the enclosing node.
///
/// Order is the emission order of the source tool and is never sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    items: Vec<BranchItem>,
}

impl Branch {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn add_node(&mut self, node: Node) {
        self.items.push(BranchItem::Node(node));
    }

    pub fn add_branch(&mut self, branch: Branch) {
        self.items.push(BranchItem::Branch(branch));
    }

    pub fn items(&self) -> &[BranchItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Reconstructed call graph for one query.
///
/// Built once per parse, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallTree {
    /// Root function name, e.g. `main()`
    pub root: String,

    /// True when the root was not emitted as a standalone depth-zero
    /// graph. cflow does this for static functions, which forces the
    /// builder to dig the subgraph out of the stream.
    pub is_static: bool,

    /// Top-level children of the root
    pub branch: Branch,
}

impl CallTree {
    /// Depth-first `(depth, name)` pairs in emission order.
    ///
    /// Reconstruction preserves order, so this reproduces the lexed
    /// input sequence exactly.
    pub fn flatten(&self) -> Vec<(usize, String)> {
        let mut out = Vec::new();
        flatten_branch(&self.branch, &mut out);
        out
    }

    /// Depth-first `(parent, node)` pairs.
    ///
    /// The parent is the nearest enclosing node, not branch; top-level
    /// entries yield `None`. A branch with no preceding sibling node
    /// hands its children to the enclosing parent instead of creating
    /// an empty level.
    pub fn edges(&self) -> Vec<(Option<&Node>, &Node)> {
        let mut out = Vec::new();
        walk_edges(&self.branch, None, &mut out);
        out
    }
}

fn flatten_branch(branch: &Branch, out: &mut Vec<(usize, String)>) {
    for item in branch.items() {
        match item {
            BranchItem::Node(node) => out.push((node.depth, node.name.clone())),
            BranchItem::Branch(child) => flatten_branch(child, out),
        }
    }
}

fn walk_edges<'a>(
    branch: &'a Branch,
    parent: Option<&'a Node>,
    out: &mut Vec<(Option<&'a Node>, &'a Node)>,
) {
    let mut last_node: Option<&Node> = None;
    for item in branch.items() {
        match item {
            BranchItem::Node(node) => {
                out.push((parent, node));
                last_node = Some(node);
            }
            BranchItem::Branch(child) => {
                walk_edges(child, last_node.or(parent), out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with(items: Vec<BranchItem>) -> CallTree {
        CallTree {
            root: "a()".to_string(),
            is_static: false,
            branch: Branch { items },
        }
    }

    #[test]
    fn test_flatten_preserves_order() {
        let mut inner = Branch::new();
        inner.add_node(Node::bare(1, "b()"));
        let tree = tree_with(vec![
            BranchItem::Node(Node::bare(0, "a()")),
            BranchItem::Branch(inner),
            BranchItem::Node(Node::bare(0, "c()")),
        ]);

        assert_eq!(
            tree.flatten(),
            vec![
                (0, "a()".to_string()),
                (1, "b()".to_string()),
                (0, "c()".to_string()),
            ]
        );
    }

    #[test]
    fn test_edges_thread_enclosing_node() {
        let mut deeper = Branch::new();
        deeper.add_node(Node::bare(2, "c()"));
        let mut inner = Branch::new();
        inner.add_node(Node::bare(1, "b()"));
        inner.add_branch(deeper);
        let tree = tree_with(vec![
            BranchItem::Node(Node::bare(0, "a()")),
            BranchItem::Branch(inner),
        ]);

        let edges: Vec<(Option<String>, String)> = tree
            .edges()
            .iter()
            .map(|(p, n)| (p.map(|p| p.name.clone()), n.name.clone()))
            .collect();

        assert_eq!(
            edges,
            vec![
                (None, "a()".to_string()),
                (Some("a()".to_string()), "b()".to_string()),
                (Some("b()".to_string()), "c()".to_string()),
            ]
        );
    }

    #[test]
    fn test_leading_branch_attaches_to_enclosing_parent() {
        // A branch whose item list starts with a nested branch: the
        // nested children belong to the enclosing node, not to a
        // phantom sibling.
        let mut orphan = Branch::new();
        orphan.add_node(Node::bare(2, "c()"));
        let mut inner = Branch::new();
        inner.add_branch(orphan);
        let tree = tree_with(vec![
            BranchItem::Node(Node::bare(0, "a()")),
            BranchItem::Branch(inner),
        ]);

        let edges: Vec<(Option<String>, String)> = tree
            .edges()
            .iter()
            .map(|(p, n)| (p.map(|p| p.name.clone()), n.name.clone()))
            .collect();

        assert_eq!(
            edges,
            vec![
                (None, "a()".to_string()),
                (Some("a()".to_string()), "c()".to_string()),
            ]
        );
    }
}
