//! Shared test helpers for integration tests.
#![allow(dead_code)]

use airlock_core::config::AppConfig;
use airlock_realtime::Notification;
use airlock_server::AirlockApp;
use tokio::sync::broadcast;

/// Waiting room on the in-memory backend.
pub struct TestApp {
    /// The wired application.
    pub app: AirlockApp,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Build an app from inline TOML overrides on top of the defaults.
    pub async fn new(overrides: &str) -> Self {
        let config = AppConfig::from_toml(overrides).expect("Failed to parse test config");
        let app = AirlockApp::build(&config)
            .await
            .expect("Failed to build application");
        Self { app, config }
    }

    /// Room with `limit` permits and a FIFO queue.
    pub async fn fifo(limit: u32) -> Self {
        Self::new(&format!(
            r#"
            [seal]
            resource = "it-room"
            limit = {limit}
            ttl_seconds = 60

            [supervisor]
            claim_window_seconds = 30
            "#
        ))
        .await
    }

    /// Subscribe to notifications for `identifier`.
    pub async fn inbox(&self, identifier: &str) -> broadcast::Receiver<Notification> {
        let topic = airlock_core::traits::Airlock::topic(self.app.airlock.as_ref(), identifier);
        self.app
            .notifier
            .as_broadcast()
            .expect("Test apps use the broadcast notifier")
            .subscribe(&topic)
            .await
    }
}
