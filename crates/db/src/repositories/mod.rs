pub mod audit_repo;
pub mod certificate_repo;
pub mod inbox_repo;
pub mod integration_settings_repo;
pub mod notification_repo;
pub mod template_repo;
pub mod timesheet_repo;
pub mod user_repo;

pub use audit_repo::AuditLogRepo;
pub use certificate_repo::CertificateRepo;
pub use inbox_repo::InboxRepo;
pub use integration_settings_repo::IntegrationSettingsRepo;
pub use notification_repo::NotificationRepo;
pub use template_repo::TemplateRepo;
pub use timesheet_repo::TimesheetRepo;
pub use user_repo::UserRepo;
