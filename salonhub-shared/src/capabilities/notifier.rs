/// Notification delivery
///
/// Services announce bookings, reschedules and cancellations through a
/// [`Notifier`]. Delivery is best-effort: a failed send after a successful
/// write is logged by the caller and never undoes the write.
///
/// # Implementations
///
/// - [`LoggingNotifier`]: writes a structured log line and nothing else
/// - [`OutboxNotifier`]: stores the notification in the platform partition
///   for the salon's inbox
///
/// # Example
///
/// ```no_run
/// use salonhub_shared::capabilities::{Channel, LoggingNotifier, Notifier, OutgoingNotification};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let notifier = LoggingNotifier::new();
/// notifier
///     .send(&OutgoingNotification {
///         salon_id: Uuid::new_v4(),
///         recipient: "noor@example.com".to_string(),
///         channel: Channel::Email,
///         subject: "Appointment booked".to_string(),
///         body: "See you on Friday at 10:00".to_string(),
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```

use crate::capabilities::CapabilityError;
use crate::db::router::ModelHandle;
use crate::models::notification::{CreateNotification, Notification};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

/// Delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    InApp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::InApp => "in_app",
        }
    }

    /// Picks a channel from the shape of a recipient address
    pub fn for_recipient(recipient: &str) -> Self {
        if recipient.contains('@') {
            Channel::Email
        } else if recipient.starts_with('+') || recipient.chars().all(|c| c.is_ascii_digit()) {
            Channel::Sms
        } else {
            Channel::InApp
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message to deliver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingNotification {
    pub salon_id: Uuid,
    pub recipient: String,
    pub channel: Channel,
    pub subject: String,
    pub body: String,
}

/// Notification delivery capability
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Delivers one notification
    async fn send(&self, notification: &OutgoingNotification) -> Result<(), CapabilityError>;
}

/// Notifier that only logs
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    pub fn new() -> Self {
        LoggingNotifier
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    fn name(&self) -> &str {
        "logging"
    }

    async fn send(&self, notification: &OutgoingNotification) -> Result<(), CapabilityError> {
        info!(
            salon_id = %notification.salon_id,
            recipient = %notification.recipient,
            channel = %notification.channel,
            subject = %notification.subject,
            "Notification"
        );
        Ok(())
    }
}

/// Notifier that persists into the `notifications` table
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    notifications: ModelHandle<Notification>,
}

impl OutboxNotifier {
    pub fn new(notifications: ModelHandle<Notification>) -> Self {
        Self { notifications }
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    fn name(&self) -> &str {
        "outbox"
    }

    async fn send(&self, notification: &OutgoingNotification) -> Result<(), CapabilityError> {
        let stored = Notification::create(
            self.notifications.pool(),
            CreateNotification {
                salon_id: notification.salon_id,
                recipient: notification.recipient.clone(),
                channel: notification.channel.as_str().to_string(),
                subject: notification.subject.clone(),
                body: notification.body.clone(),
            },
        )
        .await
        .map_err(|e| CapabilityError::Delivery(e.to_string()))?;

        debug!(notification_id = %stored.id, "Stored notification in outbox");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_for_recipient() {
        assert_eq!(Channel::for_recipient("noor@example.com"), Channel::Email);
        assert_eq!(Channel::for_recipient("+15550100"), Channel::Sms);
        assert_eq!(Channel::for_recipient("5550100"), Channel::Sms);
        assert_eq!(Channel::for_recipient("front-desk"), Channel::InApp);
    }

    #[tokio::test]
    async fn test_logging_notifier_always_succeeds() {
        let notifier = LoggingNotifier::new();
        let result = notifier
            .send(&OutgoingNotification {
                salon_id: Uuid::new_v4(),
                recipient: "front-desk".to_string(),
                channel: Channel::InApp,
                subject: "Hello".to_string(),
                body: "World".to_string(),
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(notifier.name(), "logging");
    }
}
