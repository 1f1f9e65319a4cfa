use super::{NotificationDispatcher, NotifyError};
use async_trait::async_trait;
use tracing::info;

/// Dispatcher that only logs. Used when no email or SMS provider is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDispatcher;

#[async_trait]
impl NotificationDispatcher for TracingDispatcher {
    async fn send_email(&self, to: &str, subject: &str, body_html: &str) -> Result<(), NotifyError> {
        if !to.contains('@') {
            return Err(NotifyError::InvalidRecipient(to.to_string()));
        }
        info!(to, subject, body_len = body_html.len(), "Email sent");
        Ok(())
    }

    async fn send_sms(&self, to: &str, message: &str) -> Result<(), NotifyError> {
        if to.trim().is_empty() {
            return Err(NotifyError::InvalidRecipient(to.to_string()));
        }
        info!(to, message, "SMS sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_obviously_bad_recipients() {
        let dispatcher = TracingDispatcher;
        assert!(dispatcher.send_email("buyer@example.com", "Hi", "<p>Hi</p>").await.is_ok());
        assert!(matches!(
            dispatcher.send_email("not-an-address", "Hi", "").await,
            Err(NotifyError::InvalidRecipient(_))
        ));
        assert!(dispatcher.send_sms("  ", "Hi").await.is_err());
    }
}
