/// Capabilities the service layer depends on abstractly
///
/// Delivery channels and payment gateways are outside SalonHub. Services
/// talk to them through these traits and get concrete implementations
/// injected at start-up; tests substitute fakes.
///
/// - `notifier`: [`Notifier`] with [`LoggingNotifier`] and [`OutboxNotifier`]
/// - `payment`: [`PaymentProcessor`] with [`ManualPaymentProcessor`]

pub mod notifier;
pub mod payment;

pub use notifier::{Channel, LoggingNotifier, Notifier, OutboxNotifier, OutgoingNotification};
pub use payment::{ManualPaymentProcessor, PaymentProcessor, PaymentReceipt, PaymentRequest};

/// Failure reported by an external capability
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// A notification could not be delivered
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    /// The payment was refused
    #[error("Payment declined: {0}")]
    PaymentDeclined(String),

    /// The payment provider failed for reasons unrelated to the payment
    #[error("Payment provider error: {0}")]
    Provider(String),
}
