//! Tests for the crash-safe file store.

use tempfile::TempDir;
use vitrine_storage::{FileStore, TEMP_SUFFIX};

#[tokio::test]
async fn test_write_and_read() {
    let temp_dir = TempDir::new().unwrap();
    let files = FileStore::new(temp_dir.path()).await.unwrap();

    files.write("a.jpg", b"hello").await.unwrap();

    assert_eq!(files.read("a.jpg").await.unwrap(), b"hello");
    assert!(files.exists("a.jpg").await);
    assert!(!temp_dir.path().join(format!("a.jpg{}", TEMP_SUFFIX)).exists());
}

#[tokio::test]
async fn test_write_replaces_existing() {
    let temp_dir = TempDir::new().unwrap();
    let files = FileStore::new(temp_dir.path()).await.unwrap();

    files.write("doc.json", b"first version").await.unwrap();
    files.write("doc.json", b"second").await.unwrap();

    assert_eq!(files.read("doc.json").await.unwrap(), b"second");
}

#[tokio::test]
async fn test_creates_missing_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("nested").join("images");

    let files = FileStore::new(&root).await.unwrap();
    files.write("x.jpg", b"x").await.unwrap();

    assert!(root.join("x.jpg").is_file());
}

#[tokio::test]
async fn test_read_missing_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let files = FileStore::new(temp_dir.path()).await.unwrap();

    let err = files.read("absent.jpg").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let files = FileStore::new(temp_dir.path()).await.unwrap();

    files.write("gone.jpg", b"data").await.unwrap();
    files.delete("gone.jpg").await.unwrap();
    files.delete("gone.jpg").await.unwrap();

    assert!(!files.exists("gone.jpg").await);
}

#[tokio::test]
async fn test_rejects_path_traversal() {
    let temp_dir = TempDir::new().unwrap();
    let files = FileStore::new(temp_dir.path().join("root")).await.unwrap();

    assert!(files.write("../escape.jpg", b"x").await.is_err());
    assert!(files.write("sub/file.jpg", b"x").await.is_err());
    assert!(files.write("", b"x").await.is_err());
    assert!(files.read("..").await.is_err());
    assert!(!temp_dir.path().join("escape.jpg").exists());
}

#[tokio::test]
async fn test_list_skips_directories() {
    let temp_dir = TempDir::new().unwrap();
    let files = FileStore::new(temp_dir.path()).await.unwrap();

    files.write("b.jpg", b"b").await.unwrap();
    files.write("a.jpg", b"a").await.unwrap();
    std::fs::create_dir(temp_dir.path().join("thumbs")).unwrap();

    assert_eq!(files.list().await.unwrap(), vec!["a.jpg", "b.jpg"]);
}

#[tokio::test]
async fn test_failed_write_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let files = FileStore::new(temp_dir.path()).await.unwrap();

    // A directory in the final position makes the rename fail.
    std::fs::create_dir(temp_dir.path().join("blocked.jpg")).unwrap();
    std::fs::write(temp_dir.path().join("blocked.jpg").join("keep"), b"k").unwrap();

    assert!(files.write("blocked.jpg", b"data").await.is_err());
    assert!(!temp_dir.path().join("blocked.jpg.tmp").exists());
}
