//! Crewline domain core.
//!
//! Pure, I/O-free building blocks for the notification pipeline: channel
//! policy, quiet-hours evaluation, template rendering, and the notification
//! status state machine. Every other crate in the workspace depends on this
//! one; it depends on none of them.

pub mod audit;
pub mod channels;
pub mod error;
pub mod notification;
pub mod quiet_hours;
pub mod recipient;
pub mod roles;
pub mod settings;
pub mod template;
pub mod types;
