// =========================
// tests/unit/store_tests.rs
// =========================
//! Cache-aside behaviour of the student store over both record backends
use std::sync::Arc;
use students_backend_lib::error::AppError;
use students_backend_lib::storage::{Cache, FlatFileRecordStore, MemoryRecordStore, RecordStore};
use students_backend_lib::store::{course_cache_key, student_cache_key, StudentDraft, StudentStore};
use students_common::ProfileUpdate;
use tempfile::TempDir;

use crate::test_utils::SwitchableCache;

fn draft(email: &str, courses: &[&str]) -> StudentDraft {
    StudentDraft {
        email: email.to_string(),
        password_hash: "$scrypt$ln=4,r=8,p=1$c2FsdA$aGFzaA".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        age: 36,
        course_ids: courses.iter().map(|c| c.to_string()).collect(),
    }
}

fn rename(first_name: &str) -> ProfileUpdate {
    ProfileUpdate {
        first_name: Some(first_name.to_string()),
        ..ProfileUpdate::default()
    }
}

/// Both record backends, each paired with a fresh switchable cache
fn backends(temp_dir: &TempDir) -> Vec<(StudentStore, Arc<SwitchableCache>)> {
    let records: Vec<Arc<dyn RecordStore>> = vec![
        Arc::new(MemoryRecordStore::new()),
        Arc::new(FlatFileRecordStore::new(temp_dir.path()).unwrap()),
    ];
    records
        .into_iter()
        .map(|records| {
            let cache = SwitchableCache::new();
            (StudentStore::new(records, cache.clone()), cache)
        })
        .collect()
}

#[tokio::test]
async fn test_read_populates_and_update_evicts() {
    let temp_dir = TempDir::new().unwrap();
    for (store, cache) in backends(&temp_dir) {
        let created = store.create(draft("a@x.com", &["c1"])).await.unwrap();
        let key = student_cache_key(&created.id);

        assert_eq!(store.read(&created.id).await.unwrap().unwrap(), created);
        assert!(cache.get(&key).await.unwrap().is_some());

        store.update(&created.id, &rename("Grace")).await.unwrap();
        assert!(cache.get(&key).await.unwrap().is_none());

        let read = store.read(&created.id).await.unwrap().unwrap();
        assert_eq!(read.first_name, "Grace");
        assert_eq!(read.email, created.email);
        assert_eq!(read.password_hash, created.password_hash);
    }
}

#[tokio::test]
async fn test_no_stale_read_after_delete() {
    let temp_dir = TempDir::new().unwrap();
    for (store, _cache) in backends(&temp_dir) {
        let created = store.create(draft("a@x.com", &["c1"])).await.unwrap();
        store.read(&created.id).await.unwrap();
        assert_eq!(store.read_by_course("c1").await.unwrap().len(), 1);

        store.delete(&created.id).await.unwrap();
        assert!(store.read(&created.id).await.unwrap().is_none());
        assert!(store.read_by_course("c1").await.unwrap().is_empty());
        assert!(matches!(
            store.delete(&created.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}

#[tokio::test]
async fn test_create_evicts_course_listing() {
    let temp_dir = TempDir::new().unwrap();
    for (store, cache) in backends(&temp_dir) {
        store.create(draft("a@x.com", &["c1"])).await.unwrap();
        store.read_by_course("c1").await.unwrap();
        assert!(cache.get(&course_cache_key("c1")).await.unwrap().is_some());

        store.create(draft("b@x.com", &["c1"])).await.unwrap();
        assert!(cache.get(&course_cache_key("c1")).await.unwrap().is_none());
        assert_eq!(store.read_by_course("c1").await.unwrap().len(), 2);
    }
}

#[tokio::test]
async fn test_cache_outage_falls_back_to_records() {
    let temp_dir = TempDir::new().unwrap();
    for (store, cache) in backends(&temp_dir) {
        let created = store.create(draft("a@x.com", &["c1"])).await.unwrap();

        cache.set_fail_reads(true);
        cache.set_fail_writes(true);
        assert_eq!(store.read(&created.id).await.unwrap().unwrap(), created);
        assert_eq!(store.read_by_course("c1").await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn test_failed_eviction_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    for (store, cache) in backends(&temp_dir) {
        let created = store.create(draft("a@x.com", &["c1"])).await.unwrap();

        cache.set_fail_deletes(true);
        let err = store.update(&created.id, &rename("Grace")).await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
        assert!(err.is_retryable());

        // The durable write itself went through
        cache.set_fail_deletes(false);
        cache.set_fail_reads(true);
        assert_eq!(store.read(&created.id).await.unwrap().unwrap().first_name, "Grace");
    }
}

#[tokio::test]
async fn test_corrupt_cache_entry_is_discarded() {
    let temp_dir = TempDir::new().unwrap();
    for (store, cache) in backends(&temp_dir) {
        let created = store.create(draft("a@x.com", &[])).await.unwrap();
        let key = student_cache_key(&created.id);
        cache.set(&key, "{not json".to_string()).await.unwrap();

        assert_eq!(store.read(&created.id).await.unwrap().unwrap(), created);
        let repaired = cache.get(&key).await.unwrap().unwrap();
        assert!(repaired.contains(&created.id));
    }
}
