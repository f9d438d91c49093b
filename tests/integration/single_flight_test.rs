//! Integration tests for seal-only admission.

use std::sync::Arc;
use std::time::Duration;

use airlock_core::config::seal::SealConfig;
use airlock_core::traits::{Airlock, Seal};
use airlock_core::types::NO_QUEUE_POSITION;
use airlock_service::OpportunisticAirlock;
use airlock_store::StoreManager;

fn seal_config(limit: u32) -> SealConfig {
    SealConfig {
        resource: "submit-order".to_string(),
        limit,
        ttl_seconds: 30,
        ..SealConfig::default()
    }
}

#[tokio::test]
async fn test_double_click_is_rejected_not_blocked() {
    let store = StoreManager::memory();
    let seal = store.seal(&seal_config(1)).unwrap();
    let airlock = OpportunisticAirlock::new(Arc::new(seal), "orders");

    let first = airlock.enter("A", 0).await.unwrap();
    assert!(first.is_admitted());

    let second = tokio::time::timeout(Duration::from_secs(1), airlock.enter("A", 0))
        .await
        .expect("enter must not block")
        .unwrap();
    assert!(!second.is_admitted());
    assert_eq!(second.position(), Some(NO_QUEUE_POSITION));
}

#[tokio::test]
async fn test_capacity_is_never_exceeded() {
    let store = StoreManager::memory();
    let seal = Arc::new(store.seal(&seal_config(2)).unwrap());

    let attempts = futures::future::join_all((0..3).map(|_| seal.try_acquire())).await;
    let granted = attempts
        .into_iter()
        .map(|r| r.unwrap())
        .filter(Option::is_some)
        .count();
    assert_eq!(granted, 2);
    assert_eq!(seal.available().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_crashed_holder_frees_slot_after_ttl() {
    let store = StoreManager::memory();
    let seal = store.seal(&seal_config(1)).unwrap();

    let token = seal.try_acquire().await.unwrap().unwrap();
    assert!(seal.try_acquire().await.unwrap().is_none());

    tokio::time::advance(Duration::from_secs(31)).await;
    assert!(seal.is_expired(&token).await.unwrap());
    assert!(seal.try_acquire().await.unwrap().is_some());
}
