//! Seam to the external notification sender.
//!
//! The core never delivers anything. It builds a [`NotificationRequest`]
//! and hands it to a [`Notifier`]; the outcome travels back to the caller
//! alongside the successful mutation and is never allowed to fail a
//! status or cost change.

use crate::model::{Channels, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Typed template context for customer-facing messages.
///
/// A closed struct rather than an open map, so senders can rely on the
/// fields actually existing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateContext {
    pub status: Status,
    pub total_cost: i64,
    pub estimated_completion: Option<DateTime<Utc>>,
}

/// What the external sender needs to deliver one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub ticket_number: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub message: String,
    pub channels: Channels,
    pub context: TemplateContext,
}

/// Best-effort delivery outcome, reported next to the mutation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum DeliveryOutcome {
    Sent,
    Failed { reason: String },
    Skipped,
}

/// External delivery collaborator (email/WhatsApp gateway, etc.).
pub trait Notifier {
    /// Attempt delivery. Implementations report failure through the
    /// outcome, not by panicking or returning an error the mutation path
    /// would have to unwind.
    fn send(&self, request: &NotificationRequest) -> DeliveryOutcome;
}

/// Default notifier: records the intent in the log stream and delivers
/// nothing. Used by the CLI and by tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn send(&self, request: &NotificationRequest) -> DeliveryOutcome {
        if request.channels.is_empty() {
            tracing::debug!(ticket = %request.ticket_number, "no channels requested; skipping");
            return DeliveryOutcome::Skipped;
        }

        tracing::info!(
            ticket = %request.ticket_number,
            via = %request.channels,
            "notification requested: {}",
            request.message
        );
        DeliveryOutcome::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::{DeliveryOutcome, LoggingNotifier, NotificationRequest, Notifier, TemplateContext};
    use crate::model::{Channels, Status};

    fn request(channels: Channels) -> NotificationRequest {
        NotificationRequest {
            ticket_number: "FT-TEST42".into(),
            customer_email: Some("kim@example.com".into()),
            customer_phone: None,
            message: "Your laptop is ready for pickup".into(),
            channels,
            context: TemplateContext {
                status: Status::ReadyForPickup,
                total_cost: 800,
                estimated_completion: None,
            },
        }
    }

    #[test]
    fn logging_notifier_reports_sent_when_channels_present() {
        let outcome = LoggingNotifier.send(&request(Channels {
            whatsapp: true,
            email: false,
        }));
        assert_eq!(outcome, DeliveryOutcome::Sent);
    }

    #[test]
    fn logging_notifier_skips_without_channels() {
        let outcome = LoggingNotifier.send(&request(Channels::none()));
        assert_eq!(outcome, DeliveryOutcome::Skipped);
    }

    #[test]
    fn delivery_outcome_json_is_tagged() {
        let json = serde_json::to_value(DeliveryOutcome::Failed {
            reason: "gateway timeout".into(),
        })
        .unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["reason"], "gateway timeout");
    }
}
