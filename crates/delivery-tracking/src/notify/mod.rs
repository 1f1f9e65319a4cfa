//! # Notifications
//!
//! The delivery service only knows the [`NotificationDispatcher`] capability: send an email,
//! send an SMS. What gets said lives in [`Notification`], a closed set of messages, each of
//! which renders its own subject, HTML body and SMS text.
//!
//! Sending is best effort. A failed send is logged and never fails the operation that
//! triggered it.

mod message;
mod tracing_dispatcher;

pub use message::{Audience, Notification};
pub use tracing_dispatcher::TracingDispatcher;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("notification provider failed: {0}")]
    Provider(String),
}

/// Outbound email and SMS.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body_html: &str) -> Result<(), NotifyError>;

    async fn send_sms(&self, to: &str, message: &str) -> Result<(), NotifyError>;
}
