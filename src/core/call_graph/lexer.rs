use std::path::PathBuf;

use regex::Regex;

use crate::error::{CflowgraphError, Result};
use super::Node;

/// Shape of one `cflow --print-level` output line:
///
/// ```text
/// {   2}     parse_opts() <int parse_opts (int argc, char **argv) at main.c:143>:
/// ```
///
/// The match is anchored at the start of the line but does not have to
/// consume it entirely; trailing content after a structural match is
/// ignored. The `<signature at path:line>` block is optional as a whole.
const LINE_PATTERN: &str = r"^\{\s+(\d+)\}\s+(\w+\(\))(?:\s<(.*\))\sat\s(.*):(\d+)>:)?";

/// Converts raw cflow output lines into [`Node`] records.
pub struct LineLexer {
    re: Regex,
}

impl LineLexer {
    pub fn new() -> Result<Self> {
        let re = Regex::new(LINE_PATTERN)
            .map_err(|e| CflowgraphError::Parser(e.to_string()))?;
        Ok(Self { re })
    }

    /// Lexes a single line.
    ///
    /// Lines that do not match the cflow shape are blank separators or
    /// banner text and lex to `Ok(None)`. A line that matches but whose
    /// numeric captures do not fit an integer means the assumed format
    /// has drifted and is a hard error.
    pub fn lex(&self, line: &str) -> Result<Option<Node>> {
        let caps = match self.re.captures(line) {
            Some(caps) => caps,
            None => return Ok(None),
        };

        let depth = caps[1].parse::<usize>().map_err(|e| {
            CflowgraphError::Parser(format!("bad depth in line {:?}: {}", line, e))
        })?;

        let line_no = match caps.get(5) {
            Some(m) => Some(m.as_str().parse::<usize>().map_err(|e| {
                CflowgraphError::Parser(format!("bad line number in line {:?}: {}", line, e))
            })?),
            None => None,
        };

        Ok(Some(Node {
            depth,
            name: caps[2].to_string(),
            signature: caps.get(3).map(|m| m.as_str().to_string()),
            path: caps.get(4).map(|m| PathBuf::from(m.as_str())),
            line: line_no,
        }))
    }

    /// Lexes a whole output capture, dropping non-matching lines.
    pub fn lex_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        for line in lines {
            if let Some(node) = self.lex(line.as_ref())? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }
}
