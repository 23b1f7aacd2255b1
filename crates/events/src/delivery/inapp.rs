//! In-app delivery: append to the recipient's inbox.

use std::sync::Arc;

use async_trait::async_trait;
use crewline_core::types::DbId;

use super::{ProviderReceipt, PROVIDER_INAPP};
use crate::store::{InboxStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum InAppError {
    #[error("Inbox write failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InAppMessage {
    pub user_id: DbId,
    pub text: String,
    pub notification_id: DbId,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InAppProvider: Send + Sync {
    async fn send(&self, message: &InAppMessage) -> Result<ProviderReceipt, InAppError>;
}

pub struct InboxInAppProvider {
    inbox: Arc<dyn InboxStore>,
}

impl InboxInAppProvider {
    pub fn new(inbox: Arc<dyn InboxStore>) -> Self {
        Self { inbox }
    }
}

#[async_trait]
impl InAppProvider for InboxInAppProvider {
    async fn send(&self, message: &InAppMessage) -> Result<ProviderReceipt, InAppError> {
        let entry_id = self
            .inbox
            .append(message.user_id, message.notification_id, &message.text)
            .await?;
        Ok(ProviderReceipt::new(PROVIDER_INAPP, entry_id.to_string()))
    }
}
