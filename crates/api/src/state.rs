use std::sync::Arc;

use crewline_events::store::{
    AuditSink, CertificateSource, InboxStore, NotificationStore, SettingsStore, TemplateStore,
    TimesheetSource, UserDirectory,
};
use crewline_events::{
    Clock, DeliveryDeps, DeliveryWorker, NotificationScheduler, Providers, SchedulerDeps,
    SystemClock,
};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database pool, absent when running on the in-memory backend.
    pub pool: Option<crewline_db::DbPool>,
    pub config: Arc<ServerConfig>,
    pub worker: Arc<DeliveryWorker>,
    pub scheduler: Arc<NotificationScheduler>,
}

impl AppState {
    /// Wire the worker and scheduler over a single storage backend, with
    /// the production providers and the system clock.
    pub fn with_backend<B>(pool: Option<crewline_db::DbPool>, config: ServerConfig, backend: Arc<B>) -> Self
    where
        B: NotificationStore
            + UserDirectory
            + TemplateStore
            + SettingsStore
            + AuditSink
            + InboxStore
            + TimesheetSource
            + CertificateSource
            + 'static,
    {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let providers = Providers::live(backend.clone());
        let worker = DeliveryWorker::new(DeliveryDeps::from_backend(
            backend.clone(),
            providers,
            clock.clone(),
        ));
        let scheduler = NotificationScheduler::new(SchedulerDeps::from_backend(backend, clock));

        Self {
            pool,
            config: Arc::new(config),
            worker: Arc::new(worker),
            scheduler: Arc::new(scheduler),
        }
    }
}
