//! In-app inbox message model.

use crewline_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `inbox_messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InboxMessage {
    pub id: DbId,
    pub user_id: DbId,
    pub notification_id: DbId,
    pub text: String,
    pub is_read: bool,
    pub created_at: Timestamp,
}
