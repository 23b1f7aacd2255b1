//! Delivery worker: moves one notification request from `scheduled` to a
//! terminal status.
//!
//! Per invocation:
//!
//! 1. Load the request. Unknown id is [`DeliveryError::NotFound`].
//! 2. Terminal requests are reported as-is without side effects.
//! 3. Load the recipient (a missing user is an empty contact profile).
//! 4. Inside quiet hours and not high priority: mark `skipped_quiet_hours`.
//! 5. Missing template: mark `failed`, return [`DeliveryError::TemplateNotFound`].
//! 6. Render, pick eligible channels, dispatch them concurrently.
//! 7. Record the aggregated outcome once and emit an audit event.
//!
//! Provider failures are captured per channel and never abort siblings.
//! Storage failures propagate to the caller.

use std::sync::Arc;

use crewline_core::audit::action_types;
use crewline_core::channels::{normalize_channels, Channel};
use crewline_core::notification::{
    ChannelResult, DeliveryOutcome, NotificationRequest, NotificationStatus,
};
use crewline_core::quiet_hours::is_quiet_at;
use crewline_core::recipient::Recipient;
use crewline_core::settings::IntegrationSettings;
use crewline_core::template::{placeholders, render, RenderedContent, TemplateContent};
use crewline_core::types::DbId;
use futures::future::join_all;
use serde::Serialize;

use crate::audit::{emit, AuditEvent};
use crate::clock::Clock;
use crate::delivery::{
    EmailMessage, InAppMessage, ProviderReceipt, Providers, WhatsAppMessage, PROVIDER_INAPP,
    PROVIDER_SMTP, PROVIDER_TWILIO,
};
use crate::store::{
    AuditSink, NotificationStore, SettingsStore, StoreError, TemplateStore, UserDirectory,
};

// ---------------------------------------------------------------------------
// Error / report
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Notification {0} not found")]
    NotFound(DbId),

    /// Permanent: the request has been marked `failed`.
    #[error("Template {template_key} not found.")]
    TemplateNotFound {
        notification_id: DbId,
        template_key: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a single invocation did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryReport {
    pub notification_id: DbId,
    pub status: NotificationStatus,
    /// Channels dispatched by this invocation.
    pub attempted: usize,
    /// The request was already terminal; nothing was done.
    pub already_terminal: bool,
    pub results: Vec<ChannelResult>,
}

impl DeliveryReport {
    fn existing(request: NotificationRequest) -> Self {
        Self {
            notification_id: request.id,
            status: request.status,
            attempted: 0,
            already_terminal: true,
            results: request.results,
        }
    }
}

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

/// Everything the worker reads from or writes to.
#[derive(Clone)]
pub struct DeliveryDeps {
    pub notifications: Arc<dyn NotificationStore>,
    pub users: Arc<dyn UserDirectory>,
    pub templates: Arc<dyn TemplateStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub audit: Arc<dyn AuditSink>,
    pub providers: Providers,
    pub clock: Arc<dyn Clock>,
}

impl DeliveryDeps {
    /// Wire every store from one backend.
    pub fn from_backend<B>(backend: Arc<B>, providers: Providers, clock: Arc<dyn Clock>) -> Self
    where
        B: NotificationStore + UserDirectory + TemplateStore + SettingsStore + AuditSink + 'static,
    {
        Self {
            notifications: backend.clone(),
            users: backend.clone(),
            templates: backend.clone(),
            settings: backend.clone(),
            audit: backend,
            providers,
            clock,
        }
    }
}

/// Channels of `requested` that can actually be dispatched to `user`.
///
/// Email needs an address and a configured SMTP integration. WhatsApp needs a
/// phone number, the user's opt-in and a configured WhatsApp integration.
/// In-app has no precondition.
pub fn eligible_channels(
    requested: &[Channel],
    user: &Recipient,
    settings: &IntegrationSettings,
) -> Vec<Channel> {
    normalize_channels(requested)
        .into_iter()
        .filter(|channel| match channel {
            Channel::Email => user.email_address().is_some() && settings.smtp.is_configured(),
            Channel::WhatsApp => {
                user.phone_number().is_some()
                    && user.whatsapp_opt_in
                    && settings.whatsapp.is_configured()
            }
            Channel::InApp => true,
        })
        .collect()
}

/// Inputs shared by every channel of one dispatch.
struct DispatchContext<'a> {
    request: &'a NotificationRequest,
    user: &'a Recipient,
    template: &'a TemplateContent,
    rendered: &'a RenderedContent,
    settings: &'a IntegrationSettings,
}

// ---------------------------------------------------------------------------
// DeliveryWorker
// ---------------------------------------------------------------------------

pub struct DeliveryWorker {
    deps: DeliveryDeps,
}

impl DeliveryWorker {
    pub fn new(deps: DeliveryDeps) -> Self {
        Self { deps }
    }

    /// Deliver one notification request. Safe to call repeatedly.
    pub async fn deliver(&self, id: DbId) -> Result<DeliveryReport, DeliveryError> {
        let request = self
            .deps
            .notifications
            .get(id)
            .await?
            .ok_or(DeliveryError::NotFound(id))?;

        if request.is_terminal() {
            tracing::debug!(notification_id = %id, status = %request.status, "Already terminal");
            return Ok(DeliveryReport::existing(request));
        }

        let user = match self.deps.users.get_user(request.user_id).await? {
            Some(user) => user,
            None => {
                tracing::warn!(
                    notification_id = %id,
                    user_id = %request.user_id,
                    "Recipient not found, using empty contact profile"
                );
                Recipient::empty(request.user_id)
            }
        };

        let now = self.deps.clock.now();
        let quiet = is_quiet_at(
            user.notify_prefs.quiet_hours.as_ref(),
            user.timezone.as_deref(),
            now,
        );
        if quiet && !request.priority_high {
            return self.skip_quiet_hours(&request, &user).await;
        }

        let Some(template) = self.deps.templates.get_template(&request.template_key).await? else {
            return Err(self.fail_template_missing(&request).await?);
        };

        let settings = self.deps.settings.integration_settings().await?;
        let rendered = render(&template, &request.payload);
        let unresolved = unresolved_placeholders(&rendered);
        if !unresolved.is_empty() {
            tracing::warn!(
                notification_id = %id,
                template_key = %request.template_key,
                ?unresolved,
                "Template placeholders missing from payload"
            );
        }

        let channels = eligible_channels(&request.channels, &user, &settings);
        tracing::debug!(
            notification_id = %id,
            requested = ?request.channels,
            eligible = ?channels,
            "Dispatching channels"
        );

        let ctx = DispatchContext {
            request: &request,
            user: &user,
            template: &template,
            rendered: &rendered,
            settings: &settings,
        };
        let results = join_all(channels.iter().map(|&channel| self.dispatch(channel, &ctx))).await;

        let outcome = DeliveryOutcome::from_results(results);
        let applied = self.deps.notifications.record_delivery(id, &outcome).await?;
        if !applied {
            tracing::warn!(notification_id = %id, "Request finalised concurrently, keeping stored outcome");
            return self.report_stored(id).await;
        }

        tracing::info!(
            notification_id = %id,
            status = %outcome.status,
            attempted = outcome.results.len(),
            "Notification delivered"
        );
        emit(
            self.deps.audit.as_ref(),
            AuditEvent::new(action_types::NOTIFICATION_DELIVERED)
                .for_notification(id)
                .with_details(serde_json::json!({
                    "status": outcome.status,
                    "results": outcome.results,
                })),
        )
        .await;

        Ok(DeliveryReport {
            notification_id: id,
            status: outcome.status,
            attempted: outcome.results.len(),
            already_terminal: false,
            results: outcome.results,
        })
    }

    /// Deliver every request due at the current time, up to `limit`.
    ///
    /// Per-request failures are logged and do not stop the sweep. Returns the
    /// number of requests processed without error.
    pub async fn deliver_due(&self, limit: i64) -> Result<usize, StoreError> {
        let now = self.deps.clock.now();
        let due = self.deps.notifications.list_due(now, limit).await?;
        let mut delivered = 0;
        for id in due {
            match self.deliver(id).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    tracing::error!(notification_id = %id, error = %e, "Delivery failed");
                }
            }
        }
        Ok(delivered)
    }

    // -----------------------------------------------------------------------
    // Short-circuit paths
    // -----------------------------------------------------------------------

    async fn skip_quiet_hours(
        &self,
        request: &NotificationRequest,
        user: &Recipient,
    ) -> Result<DeliveryReport, DeliveryError> {
        let applied = self
            .deps
            .notifications
            .mark_skipped_quiet_hours(request.id)
            .await?;
        if !applied {
            return self.report_stored(request.id).await;
        }

        tracing::info!(notification_id = %request.id, "Skipped: recipient in quiet hours");
        emit(
            self.deps.audit.as_ref(),
            AuditEvent::new(action_types::NOTIFICATION_SKIPPED_QUIET_HOURS)
                .for_notification(request.id)
                .with_details(serde_json::json!({
                    "user_id": request.user_id,
                    "template_key": request.template_key,
                    "timezone": user.timezone,
                })),
        )
        .await;

        Ok(DeliveryReport {
            notification_id: request.id,
            status: NotificationStatus::SkippedQuietHours,
            attempted: 0,
            already_terminal: false,
            results: Vec::new(),
        })
    }

    async fn fail_template_missing(
        &self,
        request: &NotificationRequest,
    ) -> Result<DeliveryError, StoreError> {
        let applied = self
            .deps
            .notifications
            .mark_template_missing(request.id, &request.template_key)
            .await?;
        tracing::error!(
            notification_id = %request.id,
            template_key = %request.template_key,
            applied,
            "Template not found"
        );
        Ok(DeliveryError::TemplateNotFound {
            notification_id: request.id,
            template_key: request.template_key.clone(),
        })
    }

    async fn report_stored(&self, id: DbId) -> Result<DeliveryReport, DeliveryError> {
        let stored = self
            .deps
            .notifications
            .get(id)
            .await?
            .ok_or(DeliveryError::NotFound(id))?;
        Ok(DeliveryReport::existing(stored))
    }

    // -----------------------------------------------------------------------
    // Channel dispatch
    // -----------------------------------------------------------------------

    async fn dispatch(&self, channel: Channel, ctx: &DispatchContext<'_>) -> ChannelResult {
        let providers = &self.deps.providers;
        let result = match channel {
            Channel::Email => {
                let message = EmailMessage {
                    to: ctx.user.email_address().unwrap_or_default().to_string(),
                    subject: ctx.rendered.subject.clone(),
                    html: ctx.rendered.email_html.clone(),
                };
                let sent = providers.email.send(&message, &ctx.settings.smtp).await;
                settle(channel, PROVIDER_SMTP, sent)
            }
            Channel::WhatsApp => {
                let message = WhatsAppMessage {
                    to_e164: ctx.user.phone_number().unwrap_or_default().to_string(),
                    template_body: ctx.template.whatsapp_source().to_string(),
                    variables: ctx.request.payload.clone(),
                    message_id: ctx.request.id,
                };
                let sent = providers.whatsapp.send(&message, &ctx.settings.whatsapp).await;
                settle(channel, PROVIDER_TWILIO, sent)
            }
            Channel::InApp => {
                let message = InAppMessage {
                    user_id: ctx.request.user_id,
                    text: ctx.rendered.inapp_text.clone(),
                    notification_id: ctx.request.id,
                };
                let sent = providers.in_app.send(&message).await;
                settle(channel, PROVIDER_INAPP, sent)
            }
        };
        if let Some(error) = &result.error {
            tracing::warn!(
                notification_id = %ctx.request.id,
                %channel,
                error = %error,
                "Channel dispatch failed"
            );
        }
        result
    }
}

/// Normalise a provider outcome into a [`ChannelResult`].
fn settle<E: std::fmt::Display>(
    channel: Channel,
    provider: &str,
    sent: Result<ProviderReceipt, E>,
) -> ChannelResult {
    match sent {
        Ok(receipt) => ChannelResult::ok(channel, receipt.provider, receipt.message_id),
        Err(e) => ChannelResult::error(channel, provider, e.to_string()),
    }
}

fn unresolved_placeholders(rendered: &RenderedContent) -> Vec<String> {
    let mut names = placeholders(&rendered.subject);
    names.extend(placeholders(&rendered.email_html));
    names.extend(placeholders(&rendered.inapp_text));
    names.sort();
    names.dedup();
    names
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
