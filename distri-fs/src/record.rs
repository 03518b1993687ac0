//! Record and view types of the filesystem engine.

use serde::{Deserialize, Serialize};

/// What a record represents. Artifacts live in a reserved path namespace
/// disjoint from the user-visible tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Artifact,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
            EntryKind::Artifact => "artifact",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "file" => Some(EntryKind::File),
            "directory" => Some(EntryKind::Directory),
            "artifact" => Some(EntryKind::Artifact),
            _ => None,
        }
    }
}

/// One row of the backing store. `path` is normalized ('/'-joined, no leading
/// or trailing slash) and is the primary key. Timestamps are epoch millis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Metadata view of one entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileInfo {
    pub path: String,
    pub size: usize,
    pub is_file: bool,
    pub is_dir: bool,
    pub modified: i64,
    pub created: i64,
}

/// Nested tree view. Directories always carry a (possibly empty) children
/// vector; files never do.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectoryTreeNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DirectoryTreeNode>>,
    pub updated_at: i64,
}

/// A line matched by a content search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchMatch {
    /// 1-based line number.
    pub line: usize,
    pub content: String,
}

/// All matches within one file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileMatches {
    pub path: String,
    pub matches: Vec<SearchMatch>,
}

/// Result of a read or write, echoing the normalized path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadFileResult {
    pub path: String,
    pub content: String,
}

/// A line-range slice of an artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtifactSlice {
    pub artifact_id: String,
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub total_lines: usize,
}
