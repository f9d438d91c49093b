//! Integration tests for the lottery waiting room.

mod helpers;

use std::collections::HashSet;

use airlock_core::traits::{Airlock, Queue};

#[tokio::test]
async fn test_lottery_admits_everyone_eventually() {
    let t = helpers::TestApp::new(
        r#"
        [seal]
        limit = 1

        [queue]
        policy = "lottery"
        "#,
    )
    .await;
    let airlock = t.app.airlock.as_ref();

    let holder = airlock.enter("holder", 0).await.unwrap();
    let mut current = holder.token().cloned().unwrap();

    let waiting = ["A", "B", "C"];
    for id in waiting {
        assert!(!airlock.enter(id, 0).await.unwrap().is_admitted());
    }

    let mut admitted = HashSet::new();
    for _ in 0..waiting.len() {
        airlock.release(&current).await.unwrap();
        let candidate = t.app.queue.peek().await.unwrap().unwrap();
        assert_eq!(airlock.position(&candidate).await.unwrap(), Some(1));

        let entry = airlock.enter(&candidate, 0).await.unwrap();
        current = entry.token().cloned().unwrap();
        admitted.insert(candidate);
    }

    assert_eq!(admitted.len(), 3);
    assert!(t.app.queue.is_empty().await.unwrap());
}
