//! End-to-end filesystem scenarios over the persistent store.

use distri_fs::{FilesystemRegistry, FsError};

#[tokio::test]
async fn write_patch_read_round_trip_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let registry = FilesystemRegistry::with_database_dir(dir.path());
    let fs = registry.for_project("workspace").await.unwrap();

    fs.write_file("notes.md", "hello").await.unwrap();

    let diff =
        "<<<<<<< SEARCH\n:start_line:1\n-------\nhello\n=======\nhello world\n>>>>>>> REPLACE";
    fs.apply_diff("notes.md", diff).await.unwrap();

    let read = fs.read_file("notes.md").await.unwrap();
    assert_eq!(read.path, "notes.md");
    assert_eq!(read.content, "hello world");

    // Reopen the same project after disposing the instance: data persists.
    registry.dispose("workspace");
    let reopened = registry.for_project("workspace").await.unwrap();
    assert_eq!(
        reopened.read_file("notes.md").await.unwrap().content,
        "hello world"
    );
}

#[tokio::test]
async fn nested_workspace_behaviour_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let registry = FilesystemRegistry::with_database_dir(dir.path());
    let fs = registry.for_project("nested").await.unwrap();

    fs.write_file("a/b/c.txt", "x").await.unwrap();

    // Ancestors were materialized as directory records.
    assert!(fs.file_info("a").await.unwrap().is_dir);
    assert!(fs.file_info("a/b").await.unwrap().is_dir);

    // The tree shows c.txt two levels deep.
    let tree = fs.tree("").await.unwrap();
    let a = &tree.children.as_ref().unwrap()[0];
    let b = &a.children.as_ref().unwrap()[0];
    let c = &b.children.as_ref().unwrap()[0];
    assert_eq!(c.path, "a/b/c.txt");
    assert!(c.children.is_none());

    // Non-recursive delete refuses, recursive removes the whole subtree.
    assert!(matches!(
        fs.delete_entry("a", false).await.unwrap_err(),
        FsError::DirectoryNotEmpty { .. }
    ));
    fs.delete_entry("a", true).await.unwrap();
    assert!(fs.read_file("a/b/c.txt").await.is_err());
    assert!(fs.list_directory("", true).await.unwrap().is_empty());
}
