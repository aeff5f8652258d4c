// ======================================
// tests/integration/concurrency_tests.rs
// ======================================
//! Concurrent writers against one store
use futures_util::future::join_all;
use std::sync::Arc;
use students_backend_lib::error::AppError;
use students_backend_lib::storage::MemoryCache;
use students_common::ProfileUpdate;

use crate::test_utils::{memory_state, new_student, setup_test_env, SwitchableCache};

async fn race_sign_ups(state: Arc<students_backend_lib::AppState>) {
    let attempts = (0..16).map(|i| {
        let state = state.clone();
        tokio::spawn(async move {
            state
                .students
                .sign_up(new_student("race@x.com", &format!("p{i}")))
                .await
        })
    });

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(result, Err(AppError::DuplicateEmail)));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sign_ups_flat_file() {
    let (state, _temp_dir) = setup_test_env();
    race_sign_ups(state).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sign_ups_memory() {
    race_sign_ups(memory_state(Arc::new(MemoryCache::new()))).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_leave_a_whole_record() {
    let (state, _temp_dir) = setup_test_env();
    let created = state
        .students
        .sign_up(new_student("a@x.com", "p1"))
        .await
        .unwrap();

    let writers = (0..8u32).map(|i| {
        let state = state.clone();
        let id = created.id.clone();
        tokio::spawn(async move {
            state
                .students
                .update_student(
                    &id,
                    ProfileUpdate {
                        first_name: Some(format!("first{i}")),
                        last_name: Some(format!("last{i}")),
                        age: Some(20 + i),
                    },
                )
                .await
        })
    });
    for joined in join_all(writers).await {
        joined.unwrap().unwrap();
    }

    // Whichever writer won, its fields arrived together
    let read = state.students.get_student(&created.id).await.unwrap();
    let n = read.first_name.trim_start_matches("first");
    assert_eq!(read.last_name, format!("last{n}"));
    assert_eq!(read.age, 20 + n.parse::<u32>().unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reads_during_cache_outage() {
    let cache = SwitchableCache::new();
    let state = memory_state(cache.clone());
    let created = state
        .students
        .sign_up(new_student("a@x.com", "p1"))
        .await
        .unwrap();
    cache.set_fail_reads(true);

    let readers = (0..8).map(|_| {
        let state = state.clone();
        let id = created.id.clone();
        tokio::spawn(async move { state.students.get_student(&id).await })
    });
    for joined in join_all(readers).await {
        assert_eq!(joined.unwrap().unwrap(), created);
    }
}
