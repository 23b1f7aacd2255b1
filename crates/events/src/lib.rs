//! Crewline notification pipeline.
//!
//! This crate owns everything between "a notification request exists" and
//! "every eligible channel has been attempted":
//!
//! - [`store`]: collaborator traits the pipeline reads from and writes to.
//! - [`delivery`]: channel providers (SMTP email, Twilio WhatsApp, in-app inbox).
//! - [`DeliveryWorker`]: the per-request delivery state machine.
//! - [`NotificationScheduler`]: periodic jobs that produce new requests.
//! - [`PgBackend`] and [`MemoryBackend`]: implementations of every store trait.

pub mod audit;
pub mod clock;
pub mod delivery;
pub mod memory;
pub mod pg;
pub mod schedule;
pub mod store;
pub mod worker;

pub use clock::{Clock, FixedClock, SystemClock};
pub use delivery::Providers;
pub use memory::MemoryBackend;
pub use pg::PgBackend;
pub use schedule::{JobKind, JobReport, NotificationScheduler, SchedulerDeps};
pub use store::{StoreError, StoreResult};
pub use worker::{DeliveryDeps, DeliveryError, DeliveryReport, DeliveryWorker};
