//! Application graph built from [`AppConfig`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::info;

use airlock_core::config::AppConfig;
use airlock_core::events::DomainEvent;
use airlock_core::result::AppResult;
use airlock_core::traits::ReservationStore;
use airlock_realtime::NotifierDispatch;
use airlock_service::{
    EventAirlock, QueueAirlock, SealCapacityGate, Supervisor, TracingAirlock,
};
use airlock_store::{QueueDispatch, SealDispatch, StoreManager};
use airlock_worker::SupervisorRunner;

/// The airlock handed to request handlers: a queue airlock wrapped in the
/// logging and event decorators.
pub type AppAirlock = EventAirlock<TracingAirlock<QueueAirlock>>;

/// Every long-lived component of a running waiting room.
#[derive(Debug, Clone)]
pub struct AirlockApp {
    /// Backend the components were built on.
    pub store: StoreManager,
    /// Capacity permits.
    pub seal: Arc<SealDispatch>,
    /// Waiting callers.
    pub queue: Arc<QueueDispatch>,
    /// Claim nonces, when enabled.
    pub reservations: Option<Arc<dyn ReservationStore>>,
    /// Notification transport. Also answers presence for the sweep.
    pub notifier: Arc<NotifierDispatch>,
    /// Admission façade.
    pub airlock: Arc<AppAirlock>,
    /// Queue maintenance.
    pub supervisor: Arc<Supervisor>,
    /// Domain events from the airlock and supervisor.
    pub events: broadcast::Sender<DomainEvent>,
}

impl AirlockApp {
    /// Build the application graph.
    pub async fn build(config: &AppConfig) -> AppResult<Self> {
        let claim_window = Duration::from_secs(config.supervisor.claim_window_seconds);
        let topic_prefix = config.queue.topic_prefix.as_str();

        let store = StoreManager::new(&config.store).await?;
        let seal = Arc::new(store.seal(&config.seal)?);
        let queue = Arc::new(store.queue(&config.queue, claim_window)?);
        let reservations = store.reservations(&config.reservation);
        let notifier = Arc::new(NotifierDispatch::new(&config.notifier, &config.store).await?);
        let (events, _) = broadcast::channel(config.notifier.channel_buffer_size.max(1));

        let mut airlock = QueueAirlock::new(seal.clone(), queue.clone(), topic_prefix)
            .with_notifier(notifier.clone());
        if let Some(reservations) = &reservations {
            airlock = airlock.with_reservations(reservations.clone(), claim_window);
        }
        let airlock = Arc::new(EventAirlock::with_sender(
            TracingAirlock::new(airlock, config.seal.resource.clone()),
            events.clone(),
        ));

        let mut supervisor =
            Supervisor::new(queue.clone(), notifier.clone(), topic_prefix, claim_window)
                .with_gate(Arc::new(SealCapacityGate::new(seal.clone())))
                .with_events(events.clone());
        if let Some(reservations) = &reservations {
            supervisor = supervisor.with_reservations(reservations.clone());
        }
        if config.supervisor.presence_sweep {
            // Callers listen on the notifier, so its subscriptions are the
            // presence signal.
            supervisor = supervisor.with_presence(notifier.clone());
        }

        info!(
            backend = store.backend(),
            policy = queue.policy(),
            resource = %config.seal.resource,
            limit = config.seal.limit,
            claims = reservations.is_some(),
            "Airlock application built"
        );

        Ok(Self {
            store,
            seal,
            queue,
            reservations,
            notifier,
            airlock,
            supervisor: Arc::new(supervisor),
            events,
        })
    }

    /// A runner that ticks this application's supervisor.
    pub fn runner(&self, config: &AppConfig) -> SupervisorRunner {
        SupervisorRunner::new(self.supervisor.clone(), &config.supervisor)
    }
}
