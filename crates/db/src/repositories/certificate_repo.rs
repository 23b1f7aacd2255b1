//! Read queries over `employee_certificates`.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::certificate::ExpiringCertificate;

pub struct CertificateRepo;

impl CertificateRepo {
    /// Certificates of active employees expiring within `[from, to]`
    /// (inclusive), joined with the holder's name and supervisor.
    pub async fn list_expiring_between(
        pool: &PgPool,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExpiringCertificate>, sqlx::Error> {
        sqlx::query_as::<_, ExpiringCertificate>(
            "SELECT c.id, c.name, c.expires_on, \
                    u.id AS employee_id, u.display_name AS employee_name, u.supervisor_id \
             FROM employee_certificates c \
             JOIN users u ON u.id = c.employee_id \
             WHERE u.is_active AND c.expires_on BETWEEN $1 AND $2 \
             ORDER BY c.expires_on ASC, c.id ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }
}
