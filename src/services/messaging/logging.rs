use async_trait::async_trait;

use super::MessagingProvider;

/// Writes messages to the log instead of sending them. Used when no SMS
/// gateway is configured.
pub struct LogSmsProvider;

#[async_trait]
impl MessagingProvider for LogSmsProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!(to = %to, body = %body, "sms (not sent, no gateway configured)");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
