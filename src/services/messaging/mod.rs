pub mod logging;
pub mod twilio;

use async_trait::async_trait;

/// Outbound SMS. Booking logic never calls this; only verification codes
/// are sent.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()>;

    fn name(&self) -> &'static str;
}

pub fn otp_message(code: &str, ttl_seconds: i64) -> String {
    let minutes = (ttl_seconds + 59) / 60;
    format!("Your verification code is {code}. It expires in {minutes} minutes.")
}
