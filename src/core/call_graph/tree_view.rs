use std::path::Path;

use super::{Branch, BranchItem, CallTree, Node};

/// Renders a [`CallTree`] as an indented text hierarchy, one line per
/// node.
///
/// Styling beyond the structured text (color, paging) is the caller's
/// concern.
pub struct TreeRenderer {
    show_signatures: bool,
    path_parts: usize,
}

/// Logical child list of one node: nested branches folded onto the
/// preceding node, leading branches hoisted to the enclosing level.
struct Entry<'a> {
    node: &'a Node,
    children: Vec<Entry<'a>>,
}

impl TreeRenderer {
    /// `path_parts` is the number of trailing path segments kept when
    /// printing definition paths; 0 keeps the whole path.
    pub fn new(show_signatures: bool, path_parts: usize) -> Self {
        Self {
            show_signatures,
            path_parts,
        }
    }

    /// Renders the whole tree. Pure function of the tree and options:
    /// rendering twice yields identical text.
    pub fn render(&self, tree: &CallTree) -> String {
        let mut out = String::new();
        out.push_str(&tree.root);
        if tree.is_static {
            out.push_str(" (static)");
        }
        out.push('\n');

        let entries = collect_entries(&tree.branch);
        self.render_entries(&entries, "", &mut out);
        out
    }

    fn render_entries(&self, entries: &[Entry], prefix: &str, out: &mut String) {
        for (i, entry) in entries.iter().enumerate() {
            let last = i + 1 == entries.len();
            out.push_str(prefix);
            out.push_str(if last { "└── " } else { "├── " });
            out.push_str(&self.format_node(entry.node));
            out.push('\n');

            let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
            self.render_entries(&entry.children, &child_prefix, out);
        }
    }

    /// One output line: depth, name, optional signature, optional
    /// truncated path, optional line number. Absent fields are omitted,
    /// not placeholdered.
    fn format_node(&self, node: &Node) -> String {
        let mut line = format!("[{}]: {}", node.depth, node.name);
        if self.show_signatures {
            if let Some(signature) = &node.signature {
                line.push_str("  ");
                line.push_str(signature);
            }
        }
        if let Some(path) = &node.path {
            line.push(' ');
            line.push_str(&truncate_path(path, self.path_parts));
        }
        if let Some(line_no) = node.line {
            line.push_str(&format!(" ({})", line_no));
        }
        line
    }
}

/// Keeps the trailing `parts` segments of a path, marking elision with
/// a leading `.../`.
fn truncate_path(path: &Path, parts: usize) -> String {
    let segments: Vec<String> = path
        .iter()
        .map(|s| s.to_string_lossy().into_owned())
        .collect();
    if parts == 0 || segments.len() <= parts {
        return path.display().to_string();
    }
    format!(".../{}", segments[segments.len() - parts..].join("/"))
}

fn collect_entries(branch: &Branch) -> Vec<Entry<'_>> {
    let mut entries: Vec<Entry> = Vec::new();
    for item in branch.items() {
        match item {
            BranchItem::Node(node) => entries.push(Entry {
                node,
                children: Vec::new(),
            }),
            BranchItem::Branch(child) => {
                let nested = collect_entries(child);
                match entries.last_mut() {
                    Some(parent) => parent.children.extend(nested),
                    // No preceding sibling node: attach to the
                    // enclosing level instead of an empty group.
                    None => entries.extend(nested),
                }
            }
        }
    }
    entries
}
