//! Integration tests for the FIFO waiting room.

mod helpers;

use airlock_core::traits::{Airlock, Queue};
use airlock_core::types::ClaimResult;
use airlock_service::SkipReason;

#[tokio::test]
async fn test_release_notify_claim_flow() {
    let t = helpers::TestApp::fifo(1).await;
    let airlock = t.app.airlock.as_ref();
    let mut inbox = t.inbox("B").await;

    let a = airlock.enter("A", 0).await.unwrap();
    assert!(a.is_admitted());

    let b = airlock.enter("B", 0).await.unwrap();
    assert_eq!(b.position(), Some(1));
    assert_eq!(b.topic(), "airlock/B");

    airlock.release(a.token().unwrap()).await.unwrap();
    let notification = inbox.recv().await.unwrap();
    assert_eq!(notification.identifier, "B");
    let nonce = notification.claim_nonce.expect("claims are enabled by default");

    let claimed = airlock.claim("B", &nonce).await.unwrap();
    assert!(claimed.is_admitted());

    let again = airlock.claim("B", "wrong-nonce").await.unwrap();
    assert!(matches!(again, ClaimResult::Missed { .. }));
}

#[tokio::test]
async fn test_token_crosses_process_boundary() {
    let t = helpers::TestApp::fifo(1).await;
    let airlock = t.app.airlock.as_ref();

    let entry = airlock.enter("A", 0).await.unwrap();
    let encoded = entry.token().unwrap().encode().unwrap();

    let decoded = airlock_core::types::Token::decode(&encoded).unwrap();
    airlock.release(&decoded).await.unwrap();
    assert!(airlock.enter("B", 0).await.unwrap().is_admitted());
}

#[tokio::test]
async fn test_supervisor_notifies_when_capacity_frees() {
    let t = helpers::TestApp::fifo(1).await;
    let airlock = t.app.airlock.as_ref();
    let supervisor = t.app.supervisor.as_ref();
    let mut inbox = t.inbox("B").await;

    let a = airlock.enter("A", 0).await.unwrap();
    airlock.enter("B", 0).await.unwrap();

    let report = supervisor.tick().await.unwrap();
    assert_eq!(report.skipped, Some(SkipReason::NoCapacity));
    assert!(inbox.try_recv().is_err());

    // Returned without going through the airlock, so only the supervisor
    // can promote B.
    airlock_core::traits::Seal::release(t.app.seal.as_ref(), a.token().unwrap())
        .await
        .unwrap();

    let report = supervisor.tick().await.unwrap();
    assert_eq!(report.notified.as_deref(), Some("B"));
    let nonce = inbox.recv().await.unwrap().claim_nonce.unwrap();
    assert!(airlock.claim("B", &nonce).await.unwrap().is_admitted());
    assert_eq!(t.app.queue.position("B").await.unwrap(), None);
}

#[tokio::test]
async fn test_events_are_published() {
    let t = helpers::TestApp::fifo(1).await;
    let mut events = t.app.events.subscribe();

    let a = t.app.airlock.enter("A", 0).await.unwrap();
    t.app.airlock.release(a.token().unwrap()).await.unwrap();

    let first = events.recv().await.unwrap();
    assert!(matches!(
        first.payload,
        airlock_core::events::AirlockEvent::Admitted { .. }
    ));
    let second = events.recv().await.unwrap();
    assert!(matches!(
        second.payload,
        airlock_core::events::AirlockEvent::Released { .. }
    ));
}
