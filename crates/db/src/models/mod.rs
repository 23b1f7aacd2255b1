pub mod audit;
pub mod certificate;
pub mod inbox;
pub mod integration_settings;
pub mod notification;
pub mod template;
pub mod timesheet;
pub mod user;
