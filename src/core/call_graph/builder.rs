use tracing::{debug, warn};

use crate::error::{CflowgraphError, Result};
use super::{Branch, CallTree, LineLexer, Node};

/// Upper bound on the start depths tried when digging a target
/// function's subgraph out of the stream. Graphs whose target only
/// appears deeper than this report the function as not found; the
/// bound is a tunable compatibility constant, not a guarantee.
pub const MAX_SEARCH_DEPTH: usize = 8;

/// Rebuilds the nested call tree from a flat, depth-annotated node
/// sequence.
///
/// The sequence may hold the graphs of many functions back to back:
/// cflow emits one depth-zero graph per function it could not fold
/// into another graph, and never isolates static functions at all.
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Builds the tree, optionally restricted to one function's
    /// subgraph.
    ///
    /// An empty node sequence is not an error and yields `Ok(None)`,
    /// for targeted and untargeted requests alike.
    pub fn build(self, target: Option<&str>) -> Result<Option<CallTree>> {
        if self.nodes.is_empty() {
            debug!("no nodes to build a tree from");
            return Ok(None);
        }

        let (start, stop, is_static) = match target {
            Some(name) => self.locate_subgraph(name)?,
            None => (0, self.nodes.len(), false),
        };

        let slice = &self.nodes[start..stop];
        let branch = reconstruct(slice);

        Ok(Some(CallTree {
            root: slice[0].name.clone(),
            is_static,
            branch,
        }))
    }

    /// Finds the contiguous slice of the sequence that belongs to the
    /// target function's call tree.
    ///
    /// Returns `(start, stop, is_static)` where `stop` is exclusive and
    /// `is_static` records that the match was not the first entry in
    /// the stream, i.e. cflow did not isolate the function itself.
    fn locate_subgraph(&self, target: &str) -> Result<(usize, usize, bool)> {
        let min_depth_seen = self
            .nodes
            .iter()
            .filter(|n| n.name == target)
            .map(|n| n.depth)
            .min();

        let Some(min_depth_seen) = min_depth_seen else {
            return Err(CflowgraphError::TargetNotFound {
                name: target.to_string(),
                depth_bound: MAX_SEARCH_DEPTH,
            });
        };

        for candidate in 0..=MAX_SEARCH_DEPTH {
            let start = self
                .nodes
                .iter()
                .position(|n| n.name == target && n.depth == candidate);
            let Some(start) = start else {
                debug!(
                    "{} not seen at depth {} (minimum seen: {})",
                    target, candidate, min_depth_seen
                );
                continue;
            };

            let is_static = start > 0;
            if is_static {
                debug!(
                    "{} was not isolated by cflow; found at index {} (depth {})",
                    target, start, candidate
                );
            }

            // The subgraph ends at the first later entry that is back
            // at or above the start depth.
            let stop = self.nodes[start + 1..]
                .iter()
                .position(|n| n.depth <= candidate)
                .map(|offset| start + 1 + offset)
                .ok_or_else(|| CflowgraphError::GraphEnd {
                    name: target.to_string(),
                    depth: candidate,
                    start,
                })?;
            debug!("found end of graph at index {}", stop);

            return Ok((start, stop, is_static));
        }

        warn!(
            "{} only appears at depth {} or deeper, beyond the search bound {}",
            target, min_depth_seen, MAX_SEARCH_DEPTH
        );
        Err(CflowgraphError::TargetNotFound {
            name: target.to_string(),
            depth_bound: MAX_SEARCH_DEPTH,
        })
    }
}

/// Depth reconstruction over one slice.
///
/// Runs a state machine over the current target depth with an explicit
/// frame stack, so pathologically deep graphs cannot exhaust the call
/// stack: an entry at the target depth is consumed into the current
/// branch; a deeper entry opens a child branch and becomes its first
/// candidate without being consumed; a shallower entry closes the
/// current branch and is re-examined one frame up. Exhausting the input
/// closes every open frame.
///
/// A jump of more than one level opens a single child branch, not one
/// per skipped level.
fn reconstruct(nodes: &[Node]) -> Branch {
    let mut current = Branch::new();
    let mut target = match nodes.first() {
        Some(node) => node.depth,
        None => return current,
    };
    let mut stack: Vec<(Branch, usize)> = Vec::new();

    let mut index = 0;
    while index < nodes.len() {
        let node = &nodes[index];
        if node.depth == target {
            current.add_node(node.clone());
            index += 1;
        } else if node.depth > target {
            stack.push((current, target));
            current = Branch::new();
            target = node.depth;
        } else {
            match stack.pop() {
                Some((mut parent, parent_target)) => {
                    parent.add_branch(current);
                    current = parent;
                    target = parent_target;
                }
                None => {
                    // Below the depth the slice opened at; nothing left
                    // to attach the remainder to.
                    debug!("entry at depth {} below slice root, stopping", node.depth);
                    break;
                }
            }
        }
    }

    while let Some((mut parent, _)) = stack.pop() {
        parent.add_branch(current);
        current = parent;
    }
    current
}

/// Parses raw cflow output into a [`CallTree`].
///
/// Ties the line lexer and the tree builder together; one instance can
/// serve many parses.
pub struct CflowParser {
    lexer: LineLexer,
}

impl CflowParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            lexer: LineLexer::new()?,
        })
    }

    /// Lexes `lines` and reconstructs the call tree, restricted to
    /// `target`'s subgraph when given (`target` carries the trailing
    /// parentheses, e.g. `main()`).
    pub fn parse<S: AsRef<str>>(
        &self,
        lines: &[S],
        target: Option<&str>,
    ) -> Result<Option<CallTree>> {
        let nodes = self.lexer.lex_lines(lines)?;
        debug!("lexed {} nodes from {} lines", nodes.len(), lines.len());
        TreeBuilder::new(nodes).build(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::BranchItem;

    fn nodes(pairs: &[(usize, &str)]) -> Vec<Node> {
        pairs
            .iter()
            .map(|(depth, name)| Node::bare(*depth, *name))
            .collect()
    }

    /// The worked example: two full graphs plus a static function that
    /// only ever appears as a callee.
    fn sample() -> Vec<Node> {
        nodes(&[
            (0, "a()"),
            (1, "b()"),
            (0, "c()"),
            (1, "a()"),
            (2, "d()"),
            (0, "e()"),
        ])
    }

    #[test]
    fn test_untargeted_build_preserves_order() {
        let tree = TreeBuilder::new(sample()).build(None).unwrap().unwrap();

        assert_eq!(tree.root, "a()");
        assert!(!tree.is_static);
        let flat: Vec<(usize, String)> = tree.flatten();
        let expected: Vec<(usize, String)> = sample()
            .iter()
            .map(|n| (n.depth, n.name.clone()))
            .collect();
        assert_eq!(flat, expected);
    }

    #[test]
    fn test_depth_jump_creates_single_branch() {
        let tree = TreeBuilder::new(nodes(&[(0, "a()"), (3, "b()")]))
            .build(None)
            .unwrap()
            .unwrap();

        // One nested branch holding the depth-3 node, not three.
        let items = tree.branch.items();
        assert_eq!(items.len(), 2);
        let BranchItem::Branch(child) = &items[1] else {
            panic!("expected a nested branch");
        };
        assert_eq!(child.items().len(), 1);
        assert!(matches!(&child.items()[0], BranchItem::Node(n) if n.name == "b()"));
    }

    #[test]
    fn test_target_found_at_depth_zero() {
        let tree = TreeBuilder::new(sample())
            .build(Some("a()"))
            .unwrap()
            .unwrap();

        assert_eq!(tree.root, "a()");
        assert!(!tree.is_static);
        assert_eq!(
            tree.flatten(),
            vec![(0, "a()".to_string()), (1, "b()".to_string())]
        );
    }

    #[test]
    fn test_static_target_found_by_depth_retry() {
        let tree = TreeBuilder::new(sample())
            .build(Some("d()"))
            .unwrap()
            .unwrap();

        assert_eq!(tree.root, "d()");
        assert!(tree.is_static);
        assert_eq!(tree.flatten(), vec![(2, "d()".to_string())]);
    }

    #[test]
    fn test_target_absent_is_not_found() {
        let err = TreeBuilder::new(sample()).build(Some("zzz()")).unwrap_err();
        assert!(matches!(err, CflowgraphError::TargetNotFound { name, .. } if name == "zzz()"));
    }

    #[test]
    fn test_target_beyond_search_bound_is_not_found() {
        let mut seq = vec![Node::bare(0, "a()")];
        for depth in 1..=9 {
            seq.push(Node::bare(depth, &format!("f{}()", depth)));
        }
        seq.push(Node::bare(0, "b()"));

        let err = TreeBuilder::new(seq).build(Some("f9()")).unwrap_err();
        assert!(matches!(err, CflowgraphError::TargetNotFound { .. }));
    }

    #[test]
    fn test_graph_end_undeterminable() {
        // The target's subgraph runs to the end of the stream, so no
        // entry at or above the start depth ever closes it.
        let err = TreeBuilder::new(nodes(&[(0, "a()"), (1, "b()")]))
            .build(Some("a()"))
            .unwrap_err();
        assert!(matches!(err, CflowgraphError::GraphEnd { name, .. } if name == "a()"));
    }

    #[test]
    fn test_empty_input_builds_nothing() {
        assert_eq!(TreeBuilder::new(vec![]).build(None).unwrap(), None);
        assert_eq!(TreeBuilder::new(vec![]).build(Some("a()")).unwrap(), None);
    }

    #[test]
    fn test_parse_round_trip() {
        let lines = vec![
            "{   0} a()".to_string(),
            "{   1} b()".to_string(),
            "{   0} c()".to_string(),
            "{   1} a()".to_string(),
            "{   2} d()".to_string(),
            "{   0} e()".to_string(),
        ];
        let parser = CflowParser::new().unwrap();
        let tree = parser.parse(&lines, None).unwrap().unwrap();

        let flat: Vec<String> = tree
            .flatten()
            .into_iter()
            .map(|(depth, name)| format!("{{   {}}} {}", depth, name))
            .collect();
        assert_eq!(flat, lines);
    }

    #[test]
    fn test_parse_empty_output() {
        let parser = CflowParser::new().unwrap();
        let no_lines: Vec<String> = Vec::new();
        assert_eq!(parser.parse(&no_lines, None).unwrap(), None);
        assert_eq!(parser.parse(&no_lines, Some("a()")).unwrap(), None);
    }
}
