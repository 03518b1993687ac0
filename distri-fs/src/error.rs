//! Filesystem error types.

/// Errors surfaced by filesystem operations. Messages are written for tool
/// output: an agent reads them verbatim.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Artifact not found: {name}")]
    ArtifactNotFound { name: String },

    #[error("Directory is not empty: {path}. Pass recursive=true to delete.")]
    DirectoryNotEmpty { path: String },

    /// The diff text does not conform to the SEARCH/REPLACE block grammar.
    #[error("Invalid diff: {reason}")]
    InvalidDiff { reason: String },

    /// A block's search text did not match the addressed line range. Nothing
    /// was written.
    #[error("SEARCH segment did not match target content at line {start_line}")]
    SearchMismatch { start_line: usize },

    #[error("Storage error: {reason}")]
    Storage { reason: String },
}

pub type FsResult<T> = std::result::Result<T, FsError>;

impl From<sqlx::Error> for FsError {
    fn from(error: sqlx::Error) -> Self {
        Self::Storage {
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_path() {
        let error = FsError::DirectoryNotEmpty {
            path: "src".into(),
        };
        assert!(error.to_string().contains("src"));
        assert!(error.to_string().contains("recursive=true"));
    }
}
