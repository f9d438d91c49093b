//! Integration tests for the supervisor driven by the worker runner.

mod helpers;

use std::time::Duration;

use airlock_core::traits::Airlock;
use tokio::sync::watch;

#[tokio::test(start_paused = true)]
async fn test_unclaimed_candidates_are_evicted_in_order() {
    let t = helpers::TestApp::new(
        r#"
        [seal]
        limit = 1

        [supervisor]
        claim_window_seconds = 5
        tick_interval_ms = 1000
        "#,
    )
    .await;
    let airlock = t.app.airlock.as_ref();

    let holder = airlock.enter("holder", 0).await.unwrap();
    airlock.enter("A", 0).await.unwrap();
    airlock.enter("B", 0).await.unwrap();
    airlock.release(holder.token().unwrap()).await.unwrap();

    let runner = t.app.runner(&t.config);
    let stats = runner.stats();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let handle = tokio::spawn(async move { runner.run(cancel_rx).await });

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(t.app.supervisor.last_notified().await.as_deref(), Some("A"));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(airlock.position("A").await.unwrap(), None);
    assert_eq!(t.app.supervisor.last_notified().await.as_deref(), Some("B"));

    cancel_tx.send(true).unwrap();
    handle.await.unwrap();
    assert!(stats.evicted() >= 1);
    assert_eq!(stats.failures(), 0);
}

#[tokio::test]
async fn test_presence_sweep_follows_notifier_subscriptions() {
    let t = helpers::TestApp::new(
        r#"
        [seal]
        limit = 1

        [supervisor]
        presence_sweep = true
        "#,
    )
    .await;
    let airlock = t.app.airlock.as_ref();

    airlock.enter("holder", 0).await.unwrap();
    let inbox_a = t.inbox("A").await;
    let _inbox_b = t.inbox("B").await;
    let inbox_c = t.inbox("C").await;
    for id in ["A", "B", "C"] {
        airlock.enter(id, 0).await.unwrap();
    }

    let report = t.app.supervisor.tick().await.unwrap();
    assert!(report.evicted.is_empty());
    assert_eq!(airlock.position("C").await.unwrap(), Some(3));

    drop(inbox_c);
    drop(inbox_a);
    let report = t.app.supervisor.tick().await.unwrap();
    assert_eq!(report.evicted, vec!["A".to_string(), "C".to_string()]);
    assert_eq!(airlock.position("B").await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_presence_sweep_evicts_callers_never_subscribed() {
    let t = helpers::TestApp::new(
        r#"
        [seal]
        limit = 1

        [supervisor]
        presence_sweep = true
        "#,
    )
    .await;
    let airlock = t.app.airlock.as_ref();

    airlock.enter("holder", 0).await.unwrap();
    let _inbox_b = t.inbox("B").await;
    airlock.enter("A", 0).await.unwrap();
    airlock.enter("B", 0).await.unwrap();

    let report = t.app.supervisor.tick().await.unwrap();
    assert_eq!(report.evicted, vec!["A".to_string()]);
    assert_eq!(airlock.position("B").await.unwrap(), Some(1));
}
