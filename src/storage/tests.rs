use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::storage::{in_memory::InMemoryStore, ObjectData, ObjectStore};

async fn run_test_put_get_roundtrip<S: ObjectStore>(store: &S) {
    store
        .put("raw_data/doc1.txt", b"hello".to_vec(), "text/plain")
        .await
        .unwrap();

    let data = store.get("raw_data/doc1.txt").await.unwrap();
    assert_eq!(data, Some(ObjectData::Text("hello".to_string())));
}

async fn run_test_get_missing_is_none<S: ObjectStore>(store: &S) {
    let data = store.get("raw_data/nope.txt").await.unwrap();
    assert!(data.is_none());
}

async fn run_test_list_strips_folder_prefix<S: ObjectStore>(store: &S) {
    store
        .put("raw_data/FR/a.txt", b"a".to_vec(), "text/plain")
        .await
        .unwrap();
    store
        .put("raw_data/FR/b.txt", b"b".to_vec(), "text/plain")
        .await
        .unwrap();
    store
        .put("other/c.txt", b"c".to_vec(), "text/plain")
        .await
        .unwrap();

    let keys = store.list("raw_data/FR").await.unwrap();
    assert_eq!(keys, vec!["a.txt".to_string(), "b.txt".to_string()]);
}

async fn run_test_gzip_convention<S: ObjectStore>(store: &S) {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"compressed text").unwrap();
    let compressed = encoder.finish().unwrap();

    store
        .put("archive/page.html.gz", compressed, "application/gzip")
        .await
        .unwrap();

    let data = store.get("archive/page.html.gz").await.unwrap();
    assert_eq!(data, Some(ObjectData::Text("compressed text".to_string())));
}

async fn run_test_json_convention<S: ObjectStore>(store: &S) {
    store
        .put(
            "meta/info.json",
            br#"{"count": 2}"#.to_vec(),
            "application/json",
        )
        .await
        .unwrap();

    let data = store.get("meta/info.json").await.unwrap();
    assert_eq!(
        data,
        Some(ObjectData::Json(serde_json::json!({"count": 2})))
    );
}

async fn run_test_delete_and_exists<S: ObjectStore>(store: &S) {
    store
        .put("tmp/x.txt", b"x".to_vec(), "text/plain")
        .await
        .unwrap();
    assert!(store.exists("tmp/x.txt").await.unwrap());

    store.delete("tmp/x.txt").await.unwrap();
    assert!(!store.exists("tmp/x.txt").await.unwrap());
    assert!(store.get("tmp/x.txt").await.unwrap().is_none());
}

#[tokio::test]
async fn test_put_get_roundtrip() {
    run_test_put_get_roundtrip(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_get_missing_is_none() {
    run_test_get_missing_is_none(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_list_strips_folder_prefix() {
    run_test_list_strips_folder_prefix(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_gzip_convention() {
    run_test_gzip_convention(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_json_convention() {
    run_test_json_convention(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_delete_and_exists() {
    run_test_delete_and_exists(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn test_non_utf8_decodes_as_bytes() {
    let store = InMemoryStore::new();
    store
        .put("raw_data/blob.bin", vec![0x00, 0x9f, 0x92], "application/octet-stream")
        .await
        .unwrap();

    let data = store.get("raw_data/blob.bin").await.unwrap();
    assert_eq!(data, Some(ObjectData::Bytes(vec![0x00, 0x9f, 0x92])));
}
