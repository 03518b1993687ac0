//! The virtual filesystem engine and its per-project registry.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use regex::{Regex, RegexBuilder};
use tokio::sync::RwLock;
use tracing::warn;

use crate::diff;
use crate::error::{FsError, FsResult};
use crate::paths;
use crate::record::{
    ArtifactSlice, DirectoryTreeNode, EntryKind, FileInfo, FileMatches, FileRecord,
    ReadFileResult, SearchMatch,
};
use crate::store::{MemoryStore, RecordStore, SqliteStore};

/// Reserved path prefix keeping artifacts disjoint from the user-visible
/// tree.
pub const ARTIFACT_PREFIX: &str = "__artifact__/";

/// File name prefix of per-project SQLite databases.
const DB_PREFIX: &str = "distri-fs-";

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Content fetched from a remote source of truth.
#[derive(Debug, Clone)]
pub struct RemoteFile {
    pub content: String,
    pub updated_at: Option<i64>,
}

/// Hook consulted by `read_file` before serving local content. Receives the
/// locally cached `updated_at` as a version hint; returning `None` means the
/// local copy is current (or the remote has nothing).
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, path: &str, version_hint: Option<i64>) -> FsResult<Option<RemoteFile>>;
}

/// A POSIX-like filesystem over one project's record store.
pub struct ProjectFilesystem {
    project_id: String,
    store: Arc<dyn RecordStore>,
    remote: RwLock<Option<Arc<dyn RemoteFetcher>>>,
}

impl ProjectFilesystem {
    pub fn new(project_id: impl Into<String>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            project_id: project_id.into(),
            store,
            remote: RwLock::new(None),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Install or clear the remote-content hook.
    pub async fn set_remote_fetcher(&self, fetcher: Option<Arc<dyn RemoteFetcher>>) {
        *self.remote.write().await = fetcher;
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Write a file, auto-creating missing ancestor directories. An existing
    /// record keeps its `created_at`. Returns the written content for
    /// confirmation.
    pub async fn write_file(&self, path: &str, content: &str) -> FsResult<ReadFileResult> {
        let normalized = paths::normalize(path);
        self.ensure_parents(&normalized).await?;
        let timestamp = now_millis();
        let existing = self.store.get(&normalized).await?;
        self.store
            .put(FileRecord {
                path: normalized.clone(),
                kind: EntryKind::File,
                content: Some(content.to_string()),
                created_at: existing.map(|r| r.created_at).unwrap_or(timestamp),
                updated_at: timestamp,
            })
            .await?;
        Ok(ReadFileResult {
            path: normalized,
            content: content.to_string(),
        })
    }

    /// Read a file. When a remote fetcher is configured it is consulted
    /// first; fresher remote content updates the local cache before being
    /// served.
    pub async fn read_file(&self, path: &str) -> FsResult<ReadFileResult> {
        let normalized = paths::normalize(path);
        let mut record = self.store.get(&normalized).await?;

        let fetcher = self.remote.read().await.clone();
        if let Some(fetcher) = fetcher {
            let version_hint = record
                .as_ref()
                .filter(|r| r.content.is_some())
                .map(|r| r.updated_at);
            if let Some(remote) = fetcher.fetch(&normalized, version_hint).await? {
                let refreshed = FileRecord {
                    path: normalized.clone(),
                    kind: EntryKind::File,
                    content: Some(remote.content),
                    created_at: record
                        .as_ref()
                        .map(|r| r.created_at)
                        .unwrap_or_else(now_millis),
                    updated_at: remote.updated_at.unwrap_or_else(now_millis),
                };
                self.store.put(refreshed.clone()).await?;
                record = Some(refreshed);
            }
        }

        match record {
            Some(record) if record.kind == EntryKind::File => Ok(ReadFileResult {
                path: normalized,
                content: record.content.unwrap_or_default(),
            }),
            _ => Err(FsError::NotFound { path: normalized }),
        }
    }

    /// Apply a SEARCH/REPLACE diff to a file. All-or-nothing: the patched
    /// content is computed in full before any write, so a failing block
    /// leaves the file unchanged.
    pub async fn apply_diff(&self, path: &str, diff_text: &str) -> FsResult<ReadFileResult> {
        let current = self.read_file(path).await?;
        let blocks = diff::parse(diff_text)?;
        let patched = diff::apply(&current.content, &blocks)?;
        self.write_file(path, &patched).await
    }

    pub async fn copy_file(&self, source: &str, destination: &str) -> FsResult<()> {
        let source = self.read_file(source).await?;
        self.write_file(destination, &source.content).await?;
        Ok(())
    }

    /// Move is copy followed by a non-recursive delete of the source.
    pub async fn move_file(&self, source: &str, destination: &str) -> FsResult<()> {
        let normalized_source = paths::normalize(source);
        self.copy_file(&normalized_source, destination).await?;
        self.delete_entry(&normalized_source, false).await
    }

    pub async fn file_info(&self, path: &str) -> FsResult<FileInfo> {
        let normalized = paths::normalize(path);
        let record = self
            .store
            .get(&normalized)
            .await?
            .ok_or(FsError::NotFound {
                path: normalized.clone(),
            })?;
        Ok(FileInfo {
            path: normalized,
            size: record.content.as_ref().map(String::len).unwrap_or(0),
            is_file: record.kind == EntryKind::File,
            is_dir: record.kind == EntryKind::Directory,
            modified: record.updated_at,
            created: record.created_at,
        })
    }

    // ========================================================================
    // Directories
    // ========================================================================

    pub async fn create_directory(&self, path: &str) -> FsResult<()> {
        let normalized = paths::normalize(path);
        self.ensure_parents(&normalized).await?;
        self.ensure_directory(&normalized).await
    }

    /// Sorted relative entry names under `path`. Non-recursive mode excludes
    /// entries whose relative path still contains a separator.
    pub async fn list_directory(&self, path: &str, recursive: bool) -> FsResult<Vec<String>> {
        let normalized = paths::normalize(path);
        let records = self.store.all().await?;
        let mut results = BTreeSet::new();

        for record in records {
            if record.path.starts_with(ARTIFACT_PREFIX)
                || !paths::is_within(&normalized, &record.path)
            {
                continue;
            }
            let relative = if normalized.is_empty() {
                record.path.clone()
            } else if record.path.len() > normalized.len() {
                record.path[normalized.len() + 1..].to_string()
            } else {
                continue; // the directory itself
            };
            if relative.is_empty() {
                continue;
            }
            if !recursive && relative.contains('/') {
                continue;
            }
            results.insert(relative);
        }

        Ok(results.into_iter().collect())
    }

    /// Delete an entry. Deleting a non-empty directory requires
    /// `recursive = true`; a missing path is a no-op.
    pub async fn delete_entry(&self, path: &str, recursive: bool) -> FsResult<()> {
        let normalized = paths::normalize(path);
        let Some(record) = self.store.get(&normalized).await? else {
            return Ok(());
        };

        if record.kind != EntryKind::Directory {
            return self.store.delete(&normalized).await;
        }

        let records = self.store.all().await?;
        let descendants: Vec<String> = records
            .into_iter()
            .filter(|entry| {
                entry.path != normalized && paths::is_within(&normalized, &entry.path)
            })
            .map(|entry| entry.path)
            .collect();

        if !descendants.is_empty() && !recursive {
            return Err(FsError::DirectoryNotEmpty { path: normalized });
        }

        for path in descendants {
            self.store.delete(&path).await?;
        }
        self.store.delete(&normalized).await
    }

    /// Reconstruct the nested tree under `path`. Directories always carry a
    /// children vector, files never do. Children appear in path order.
    pub async fn tree(&self, path: &str) -> FsResult<DirectoryTreeNode> {
        let normalized = paths::normalize(path);
        let mut records: Vec<FileRecord> = self
            .store
            .all()
            .await?
            .into_iter()
            .filter(|record| {
                record.path != normalized
                    && !record.path.starts_with(ARTIFACT_PREFIX)
                    && paths::is_within(&normalized, &record.path)
            })
            .collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));

        // Group by immediate parent, then assemble depth-first. Sorted input
        // keeps each child list in path order.
        let mut children_of: HashMap<String, Vec<FileRecord>> = HashMap::new();
        for record in records {
            children_of
                .entry(paths::parent(&record.path))
                .or_default()
                .push(record);
        }

        fn build(
            path: &str,
            name: String,
            kind: EntryKind,
            updated_at: i64,
            children_of: &HashMap<String, Vec<FileRecord>>,
        ) -> DirectoryTreeNode {
            let children = if kind == EntryKind::File {
                None
            } else {
                Some(
                    children_of
                        .get(path)
                        .map(|records| {
                            records
                                .iter()
                                .map(|record| {
                                    build(
                                        &record.path,
                                        paths::basename(&record.path),
                                        record.kind,
                                        record.updated_at,
                                        children_of,
                                    )
                                })
                                .collect()
                        })
                        .unwrap_or_default(),
                )
            };
            DirectoryTreeNode {
                name,
                path: path.to_string(),
                kind,
                children,
                updated_at,
            }
        }

        Ok(build(
            &normalized,
            paths::basename(&normalized),
            EntryKind::Directory,
            now_millis(),
            &children_of,
        ))
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Paths under `path` matching a case-insensitive pattern. An invalid
    /// pattern yields an empty result set, never an error.
    pub async fn search_files(&self, path: &str, pattern: &str) -> FsResult<Vec<String>> {
        let Some(regex) = compile_pattern(pattern) else {
            return Ok(Vec::new());
        };
        let normalized = paths::normalize(path);
        let records = self.store.all().await?;
        let mut matches: Vec<String> = records
            .into_iter()
            .filter(|record| {
                record.kind != EntryKind::Directory
                    && !record.path.starts_with(ARTIFACT_PREFIX)
                    && paths::is_within(&normalized, &record.path)
                    && regex.is_match(&record.path)
            })
            .map(|record| record.path)
            .collect();
        matches.sort();
        Ok(matches)
    }

    /// Line matches inside files under `path`, same best-effort pattern
    /// handling as [`search_files`](Self::search_files).
    pub async fn search_within_files(
        &self,
        path: &str,
        pattern: &str,
    ) -> FsResult<Vec<FileMatches>> {
        let Some(regex) = compile_pattern(pattern) else {
            return Ok(Vec::new());
        };
        let normalized = paths::normalize(path);
        let mut records: Vec<FileRecord> = self
            .store
            .all()
            .await?
            .into_iter()
            .filter(|record| {
                record.kind == EntryKind::File && paths::is_within(&normalized, &record.path)
            })
            .collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(records
            .into_iter()
            .filter_map(|record| match_lines(&record, &regex))
            .collect())
    }

    // ========================================================================
    // Artifacts
    // ========================================================================

    pub async fn save_artifact(&self, name: &str, content: &str) -> FsResult<()> {
        let timestamp = now_millis();
        self.store
            .put(FileRecord {
                path: artifact_path(name),
                kind: EntryKind::Artifact,
                content: Some(content.to_string()),
                created_at: timestamp,
                updated_at: timestamp,
            })
            .await
    }

    pub async fn list_artifacts(&self) -> FsResult<Vec<FileRecord>> {
        let records = self.store.all().await?;
        Ok(records
            .into_iter()
            .filter(|record| {
                record.kind == EntryKind::Artifact && record.path.starts_with(ARTIFACT_PREFIX)
            })
            .collect())
    }

    /// Read an artifact, optionally slicing a 1-based inclusive line range.
    pub async fn read_artifact(
        &self,
        name: &str,
        start_line: Option<usize>,
        end_line: Option<usize>,
    ) -> FsResult<ArtifactSlice> {
        let path = artifact_path(name);
        let record = self
            .store
            .get(&path)
            .await?
            .ok_or(FsError::ArtifactNotFound {
                name: name.to_string(),
            })?;

        let content = record.content.unwrap_or_default();
        let lines: Vec<&str> = content.split('\n').collect();
        let total_lines = lines.len();
        let start = start_line.unwrap_or(1).max(1);
        let end = end_line.unwrap_or(total_lines).min(total_lines);
        let slice = if start > end {
            String::new()
        } else {
            lines[start - 1..end].join("\n")
        };

        Ok(ArtifactSlice {
            artifact_id: record.path,
            content: slice,
            start_line: start,
            end_line: end,
            total_lines,
        })
    }

    pub async fn search_artifacts(&self, pattern: &str) -> FsResult<Vec<FileMatches>> {
        let Some(regex) = compile_pattern(pattern) else {
            return Ok(Vec::new());
        };
        Ok(self
            .list_artifacts()
            .await?
            .iter()
            .filter_map(|record| match_lines(record, &regex))
            .collect())
    }

    pub async fn delete_artifact(&self, name: &str) -> FsResult<()> {
        self.store.delete(&artifact_path(name)).await
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    async fn ensure_directory(&self, path: &str) -> FsResult<()> {
        if path.is_empty() {
            return Ok(());
        }
        let existing = self.store.get(path).await?;
        if let Some(record) = &existing {
            if record.kind == EntryKind::Directory {
                return Ok(());
            }
        }
        let timestamp = now_millis();
        self.store
            .put(FileRecord {
                path: path.to_string(),
                kind: EntryKind::Directory,
                content: None,
                created_at: existing.map(|r| r.created_at).unwrap_or(timestamp),
                updated_at: timestamp,
            })
            .await
    }

    async fn ensure_parents(&self, path: &str) -> FsResult<()> {
        let mut parent = paths::parent(path);
        while !parent.is_empty() {
            self.ensure_directory(&parent).await?;
            parent = paths::parent(&parent);
        }
        Ok(())
    }
}

fn artifact_path(name: &str) -> String {
    format!("{ARTIFACT_PREFIX}{}", paths::normalize(name))
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(error) => {
            warn!(%error, "invalid search pattern, returning no matches");
            None
        }
    }
}

fn match_lines(record: &FileRecord, regex: &Regex) -> Option<FileMatches> {
    let content = record.content.as_deref().unwrap_or_default();
    let matches: Vec<SearchMatch> = content
        .split('\n')
        .enumerate()
        .filter(|(_, line)| regex.is_match(line))
        .map(|(index, line)| SearchMatch {
            line: index + 1,
            content: line.to_string(),
        })
        .collect();
    if matches.is_empty() {
        None
    } else {
        Some(FileMatches {
            path: record.path.clone(),
            matches,
        })
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Explicit per-project instance registry.
///
/// Owned by the composing application instead of living in module state, so
/// every test (and every embedder) gets its own isolated set of filesystems.
pub struct FilesystemRegistry {
    database_dir: Option<PathBuf>,
    instances: DashMap<String, Arc<ProjectFilesystem>>,
}

impl FilesystemRegistry {
    /// Registry whose filesystems live purely in memory.
    pub fn in_memory() -> Self {
        Self {
            database_dir: None,
            instances: DashMap::new(),
        }
    }

    /// Registry persisting one SQLite database per project under `dir`.
    pub fn with_database_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            database_dir: Some(dir.into()),
            instances: DashMap::new(),
        }
    }

    /// Get or create the filesystem for a project. An empty id maps to
    /// `default`.
    pub async fn for_project(&self, project_id: &str) -> FsResult<Arc<ProjectFilesystem>> {
        let id = if project_id.is_empty() {
            "default"
        } else {
            project_id
        };
        if let Some(existing) = self.instances.get(id) {
            return Ok(Arc::clone(existing.value()));
        }

        let store: Arc<dyn RecordStore> = match &self.database_dir {
            Some(dir) => Arc::new(SqliteStore::open(dir.join(format!("{DB_PREFIX}{id}.db"))).await?),
            None => Arc::new(MemoryStore::new()),
        };
        let filesystem = Arc::new(ProjectFilesystem::new(id, store));
        self.instances.insert(id.to_string(), filesystem.clone());
        Ok(filesystem)
    }

    /// The filesystem for a project, if one was created.
    pub fn get(&self, project_id: &str) -> Option<Arc<ProjectFilesystem>> {
        self.instances
            .get(project_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Drop a project's instance. Persisted data survives; the next
    /// `for_project` reopens it.
    pub fn dispose(&self, project_id: &str) {
        self.instances.remove(project_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs() -> ProjectFilesystem {
        ProjectFilesystem::new("test", Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn write_creates_ancestor_directories() {
        let fs = fs();
        fs.write_file("a/b/c.txt", "x").await.unwrap();

        let info_a = fs.file_info("a").await.unwrap();
        assert!(info_a.is_dir);
        let info_ab = fs.file_info("a/b").await.unwrap();
        assert!(info_ab.is_dir);

        let tree = fs.tree("").await.unwrap();
        let a = &tree.children.as_ref().unwrap()[0];
        assert_eq!(a.name, "a");
        let b = &a.children.as_ref().unwrap()[0];
        assert_eq!(b.name, "b");
        let c = &b.children.as_ref().unwrap()[0];
        assert_eq!(c.name, "c.txt");
        assert!(c.children.is_none());
    }

    #[tokio::test]
    async fn rewrite_preserves_created_at() {
        let fs = fs();
        fs.write_file("f.txt", "one").await.unwrap();
        let created = fs.file_info("f.txt").await.unwrap().created;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        fs.write_file("f.txt", "two").await.unwrap();
        let info = fs.file_info("f.txt").await.unwrap();
        assert_eq!(info.created, created);
        assert!(info.modified >= created);
        assert_eq!(fs.read_file("f.txt").await.unwrap().content, "two");
    }

    #[tokio::test]
    async fn read_missing_file_is_not_found() {
        let fs = fs();
        let error = fs.read_file("nope.txt").await.unwrap_err();
        assert!(matches!(error, FsError::NotFound { .. }));

        // A directory is not a readable file either.
        fs.create_directory("dir").await.unwrap();
        assert!(matches!(
            fs.read_file("dir").await.unwrap_err(),
            FsError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn list_directory_modes() {
        let fs = fs();
        fs.write_file("src/main.rs", "").await.unwrap();
        fs.write_file("src/util/helpers.rs", "").await.unwrap();
        fs.write_file("README.md", "").await.unwrap();

        let top = fs.list_directory("", false).await.unwrap();
        assert_eq!(top, vec!["README.md".to_string(), "src".to_string()]);

        let src_recursive = fs.list_directory("src", true).await.unwrap();
        assert_eq!(
            src_recursive,
            vec![
                "main.rs".to_string(),
                "util".to_string(),
                "util/helpers.rs".to_string()
            ]
        );

        let src_shallow = fs.list_directory("src", false).await.unwrap();
        assert_eq!(src_shallow, vec!["main.rs".to_string(), "util".to_string()]);
    }

    #[tokio::test]
    async fn delete_guards_non_empty_directories() {
        let fs = fs();
        fs.write_file("a/b/c.txt", "x").await.unwrap();

        let error = fs.delete_entry("a", false).await.unwrap_err();
        assert!(matches!(error, FsError::DirectoryNotEmpty { .. }));
        assert!(fs.read_file("a/b/c.txt").await.is_ok());

        fs.delete_entry("a", true).await.unwrap();
        assert!(fs.read_file("a/b/c.txt").await.is_err());
        assert!(fs.file_info("a").await.is_err());
        assert!(fs.list_directory("", true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_entry_is_a_noop() {
        let fs = fs();
        fs.delete_entry("ghost", false).await.unwrap();
    }

    #[tokio::test]
    async fn copy_and_move() {
        let fs = fs();
        fs.write_file("src.txt", "payload").await.unwrap();

        fs.copy_file("src.txt", "copy.txt").await.unwrap();
        assert_eq!(fs.read_file("copy.txt").await.unwrap().content, "payload");
        assert!(fs.read_file("src.txt").await.is_ok());

        fs.move_file("copy.txt", "moved/deep.txt").await.unwrap();
        assert_eq!(
            fs.read_file("moved/deep.txt").await.unwrap().content,
            "payload"
        );
        assert!(fs.read_file("copy.txt").await.is_err());
    }

    #[tokio::test]
    async fn diff_apply_end_to_end() {
        let fs = fs();
        fs.write_file("notes.md", "hello").await.unwrap();
        let diff = "<<<<<<< SEARCH\n:start_line:1\n-------\nhello\n=======\nhello world\n>>>>>>> REPLACE";
        fs.apply_diff("notes.md", diff).await.unwrap();

        let read = fs.read_file("notes.md").await.unwrap();
        assert_eq!(read.path, "notes.md");
        assert_eq!(read.content, "hello world");
    }

    #[tokio::test]
    async fn failing_second_block_leaves_file_untouched() {
        let fs = fs();
        fs.write_file("f.txt", "one\ntwo\nthree").await.unwrap();
        let diff = concat!(
            "<<<<<<< SEARCH\n:start_line:1\n-------\none\n=======\nONE\n>>>>>>> REPLACE\n",
            "<<<<<<< SEARCH\n:start_line:2\n-------\nnot the real line\n=======\nX\n>>>>>>> REPLACE\n",
        );

        let error = fs.apply_diff("f.txt", diff).await.unwrap_err();
        assert!(matches!(error, FsError::SearchMismatch { .. }));
        // First block's edit must not be partially persisted.
        assert_eq!(fs.read_file("f.txt").await.unwrap().content, "one\ntwo\nthree");
    }

    #[tokio::test]
    async fn search_files_and_contents() {
        let fs = fs();
        fs.write_file("src/alpha.rs", "fn main() {}\nlet answer = 42;")
            .await
            .unwrap();
        fs.write_file("docs/ALPHA.md", "The Answer\nis here")
            .await
            .unwrap();

        let by_name = fs.search_files("", "alpha").await.unwrap();
        assert_eq!(by_name.len(), 2);

        let by_content = fs.search_within_files("", "answer").await.unwrap();
        assert_eq!(by_content.len(), 2);
        let alpha = by_content
            .iter()
            .find(|m| m.path == "src/alpha.rs")
            .unwrap();
        assert_eq!(alpha.matches[0].line, 2);

        // Invalid patterns are best-effort empty, not errors.
        assert!(fs.search_files("", "[unclosed").await.unwrap().is_empty());
        assert!(fs
            .search_within_files("", "[unclosed")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn artifacts_live_outside_the_user_tree() {
        let fs = fs();
        fs.write_file("visible.txt", "user file").await.unwrap();
        fs.save_artifact("report.md", "line1\nline2\nline3")
            .await
            .unwrap();

        // Not visible through file operations.
        assert_eq!(
            fs.list_directory("", true).await.unwrap(),
            vec!["visible.txt".to_string()]
        );
        assert!(fs.tree("").await.unwrap().children.as_ref().unwrap().len() == 1);
        assert!(fs.search_files("", "report").await.unwrap().is_empty());

        let artifacts = fs.list_artifacts().await.unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].kind, EntryKind::Artifact);

        let slice = fs.read_artifact("report.md", Some(2), Some(3)).await.unwrap();
        assert_eq!(slice.content, "line2\nline3");
        assert_eq!(slice.total_lines, 3);
        assert_eq!(slice.start_line, 2);

        let hits = fs.search_artifacts("line2").await.unwrap();
        assert_eq!(hits.len(), 1);

        fs.delete_artifact("report.md").await.unwrap();
        assert!(fs.list_artifacts().await.unwrap().is_empty());
        assert!(matches!(
            fs.read_artifact("report.md", None, None).await.unwrap_err(),
            FsError::ArtifactNotFound { .. }
        ));
    }

    struct StaticRemote {
        content: &'static str,
        updated_at: i64,
    }

    #[async_trait]
    impl RemoteFetcher for StaticRemote {
        async fn fetch(
            &self,
            _path: &str,
            version_hint: Option<i64>,
        ) -> FsResult<Option<RemoteFile>> {
            if version_hint.map(|v| v >= self.updated_at).unwrap_or(false) {
                return Ok(None);
            }
            Ok(Some(RemoteFile {
                content: self.content.to_string(),
                updated_at: Some(self.updated_at),
            }))
        }
    }

    #[tokio::test]
    async fn remote_fetcher_refreshes_local_cache() {
        let fs = fs();
        fs.set_remote_fetcher(Some(Arc::new(StaticRemote {
            content: "remote truth",
            updated_at: i64::MAX,
        })))
        .await;

        // No local record at all: remote content materializes it.
        let read = fs.read_file("synced.txt").await.unwrap();
        assert_eq!(read.content, "remote truth");

        // Cache was updated, so a subsequent read without the fetcher serves
        // locally.
        fs.set_remote_fetcher(None).await;
        assert_eq!(fs.read_file("synced.txt").await.unwrap().content, "remote truth");
    }

    #[tokio::test]
    async fn remote_fetcher_respects_version_hint() {
        let fs = fs();
        fs.write_file("doc.txt", "local v2").await.unwrap();
        fs.set_remote_fetcher(Some(Arc::new(StaticRemote {
            content: "stale remote",
            updated_at: 0,
        })))
        .await;

        // The local copy is newer than the remote; the hint suppresses the
        // overwrite.
        assert_eq!(fs.read_file("doc.txt").await.unwrap().content, "local v2");
    }

    #[tokio::test]
    async fn registry_isolates_projects_and_caches_instances() {
        let registry = FilesystemRegistry::in_memory();
        let first = registry.for_project("alpha").await.unwrap();
        let again = registry.for_project("alpha").await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        first.write_file("only-in-alpha.txt", "x").await.unwrap();
        let other = registry.for_project("beta").await.unwrap();
        assert!(other.read_file("only-in-alpha.txt").await.is_err());

        registry.dispose("alpha");
        assert!(registry.get("alpha").is_none());

        let defaulted = registry.for_project("").await.unwrap();
        assert_eq!(defaulted.project_id(), "default");
    }
}
