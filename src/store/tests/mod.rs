use super::*;
use serde::Deserialize;
use tempfile::TempDir;


#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Doc {
    name: String,
    count: u32,
}

#[tokio::test]
async fn load_or_default_on_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let doc: Doc = load_or_default(&temp_dir.path().join("absent.json")).await;
    assert_eq!(doc, Doc::default());
}

#[tokio::test]
async fn load_or_default_on_malformed_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    tokio::fs::write(&path, b"{\"name\": \"half").await.unwrap();

    let doc: Doc = load_or_default(&path).await;
    assert_eq!(doc, Doc::default());
}

#[tokio::test]
async fn save_atomic_creates_parents_and_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("data").join("nested").join("doc.json");
    let doc = Doc {
        name: "queue".into(),
        count: 3,
    };

    save_atomic(&path, &doc).await.unwrap();

    let loaded: Doc = load_or_default(&path).await;
    assert_eq!(loaded, doc);
    assert!(!path.with_file_name("doc.json.tmp").exists());
}

#[tokio::test]
async fn save_atomic_replaces_previous_contents() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("doc.json");

    save_atomic(&path, &Doc { name: "a".into(), count: 1 }).await.unwrap();
    save_atomic(&path, &Doc { name: "b".into(), count: 2 }).await.unwrap();

    let loaded: Doc = load_or_default(&path).await;
    assert_eq!(loaded.name, "b");
    assert_eq!(loaded.count, 2);
}

#[tokio::test]
async fn save_atomic_reports_persist_error() {
    let temp_dir = TempDir::new().unwrap();
    // A regular file where a directory is expected
    let blocker = temp_dir.path().join("blocker");
    tokio::fs::write(&blocker, b"").await.unwrap();
    let path = blocker.join("doc.json");

    let err = save_atomic(&path, &Doc::default()).await.unwrap_err();
    assert!(matches!(err, Error::Persist { .. }), "got {err:?}");
    assert_eq!(err.error_code(), "persist_error");
}

#[test]
fn temp_path_appends_suffix_to_file_name() {
    assert_eq!(
        temp_path(Path::new("/data/download_queue.json")),
        PathBuf::from("/data/download_queue.json.tmp")
    );
}
