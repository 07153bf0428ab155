//! Alert delivery for the automation engine.
//!
//! - [`Alerter`] is the seam the engine calls; it reports whether an alert
//!   reached at least one channel and never fails the caller.
//! - [`AlertDispatcher`] fans an alert out to the configured channels.
//! - [`delivery`] holds the external channels (webhook, email).

pub mod delivery;
pub mod dispatcher;

use adpilot_core::alert::AlertEvent;
use async_trait::async_trait;

pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::webhook::WebhookDelivery;
pub use dispatcher::{AlertConfig, AlertDispatcher};

/// Sends alerts about automation outcomes.
#[async_trait]
pub trait Alerter: Send + Sync {
    /// Deliver an alert. Returns `true` if it was delivered somewhere.
    async fn send_alert(&self, event: &AlertEvent) -> bool;
}
