//! SEARCH/REPLACE diff format.
//!
//! The patch grammar consumed by `apply_diff`, bit-exact:
//!
//! ```text
//! <<<<<<< SEARCH
//! :start_line:<N>
//! -------
//! <lines to match, optional/empty>
//! =======
//! <replacement lines>
//! >>>>>>> REPLACE
//! ```
//!
//! One diff may contain multiple sequential blocks; they apply in document
//! order against the progressively updated line array. Application is
//! all-or-nothing: the patched content is computed in full before anything is
//! persisted, so a mismatch in any block leaves the file untouched.

use crate::error::{FsError, FsResult};

/// One parsed SEARCH/REPLACE block.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffBlock {
    /// 1-based line the block addresses.
    pub start_line: usize,
    pub search: Vec<String>,
    pub replace: Vec<String>,
}

const SEARCH_MARKER: &str = "<<<<<<< SEARCH";
const START_LINE_DIRECTIVE: &str = ":start_line:";
const SEARCH_SEPARATOR: &str = "-------";
const REPLACE_SEPARATOR: &str = "=======";
const REPLACE_MARKER: &str = ">>>>>>> REPLACE";

/// Parse a diff into its blocks. A diff with zero blocks is a format error.
pub fn parse(diff: &str) -> FsResult<Vec<DiffBlock>> {
    let lines: Vec<&str> = diff.split('\n').collect();
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while cursor < lines.len() {
        let line = lines[cursor].trim();
        if line.is_empty() {
            cursor += 1;
            continue;
        }
        if line != SEARCH_MARKER {
            return Err(FsError::InvalidDiff {
                reason: format!("expected {SEARCH_MARKER} but found \"{}\"", lines[cursor]),
            });
        }
        cursor += 1;

        let directive = lines.get(cursor).copied().unwrap_or_default();
        let Some(raw_line_number) = directive.strip_prefix(START_LINE_DIRECTIVE) else {
            return Err(FsError::InvalidDiff {
                reason: format!("missing {START_LINE_DIRECTIVE} directive"),
            });
        };
        let start_line: usize = raw_line_number
            .trim()
            .parse()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| FsError::InvalidDiff {
                reason: format!("invalid {START_LINE_DIRECTIVE} value \"{}\"", raw_line_number.trim()),
            })?;
        cursor += 1;

        if lines.get(cursor).map(|l| l.trim()) != Some(SEARCH_SEPARATOR) {
            return Err(FsError::InvalidDiff {
                reason: format!("missing {SEARCH_SEPARATOR} separator"),
            });
        }
        cursor += 1;

        let mut search = Vec::new();
        while cursor < lines.len() && lines[cursor].trim() != REPLACE_SEPARATOR {
            search.push(lines[cursor].to_string());
            cursor += 1;
        }
        if lines.get(cursor).map(|l| l.trim()) != Some(REPLACE_SEPARATOR) {
            return Err(FsError::InvalidDiff {
                reason: format!("missing {REPLACE_SEPARATOR} separator"),
            });
        }
        cursor += 1;

        let mut replace = Vec::new();
        while cursor < lines.len() && lines[cursor].trim() != REPLACE_MARKER {
            replace.push(lines[cursor].to_string());
            cursor += 1;
        }
        if lines.get(cursor).map(|l| l.trim()) != Some(REPLACE_MARKER) {
            return Err(FsError::InvalidDiff {
                reason: format!("missing {REPLACE_MARKER} terminator"),
            });
        }
        cursor += 1;

        blocks.push(DiffBlock {
            start_line,
            search,
            replace,
        });
    }

    if blocks.is_empty() {
        return Err(FsError::InvalidDiff {
            reason: "no diff blocks found".to_string(),
        });
    }
    Ok(blocks)
}

/// Apply parsed blocks to `content`, returning the patched text. Pure; the
/// caller persists the result only when every block applied.
pub fn apply(content: &str, blocks: &[DiffBlock]) -> FsResult<String> {
    let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();

    for block in blocks {
        let start_index = block.start_line - 1;
        if start_index > lines.len() {
            return Err(FsError::InvalidDiff {
                reason: format!("invalid start_line {} in diff block", block.start_line),
            });
        }
        if !block.search.is_empty() {
            let end_index = start_index + block.search.len();
            if end_index > lines.len() || lines[start_index..end_index] != block.search[..] {
                return Err(FsError::SearchMismatch {
                    start_line: block.start_line,
                });
            }
        }
        lines.splice(
            start_index..(start_index + block.search.len()).min(lines.len()),
            block.replace.iter().cloned(),
        );
    }

    Ok(lines.join("\n"))
}
