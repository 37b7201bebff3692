//! Delivery of OTP codes to voters.

use std::fmt::Display;
use std::sync::Arc;

use aws_sdk_sns::Client as SnsClient;
use chrono::Duration;
use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::model::otp::Code;

/// Subject line used for emailed codes.
const EMAIL_SUBJECT: &str = "SecureVote verification code";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Sms,
    Email,
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sms => f.write_str("SMS"),
            Self::Email => f.write_str("email"),
        }
    }
}

/// Something that can deliver a short message to a phone number or email address.
#[rocket::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel: Channel, destination: &str, message: &str)
        -> Result<(), NotifyError>;
}

/// Shared handle on whichever notifier the server was configured with.
pub type SharedNotifier = Arc<dyn Notifier>;

/// The text sent alongside a freshly issued code.
pub fn otp_message(code: &Code, ttl: Duration) -> String {
    format!(
        "Your SecureVote verification code is {code}. It expires in {} minutes.",
        ttl.num_minutes().max(1)
    )
}

/// Sends SMS through Amazon SNS and email through an HTTP relay.
pub struct ExternalNotifier {
    sns: SnsClient,
    http: reqwest::Client,
    relay: EmailRelay,
}

/// Where and how to post outgoing email.
#[derive(Debug, Clone)]
pub struct EmailRelay {
    pub url: String,
    pub token: String,
    pub sender: String,
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl ExternalNotifier {
    pub fn new(sns: SnsClient, relay: EmailRelay) -> Self {
        Self {
            sns,
            http: reqwest::Client::new(),
            relay,
        }
    }

    async fn send_sms(&self, phone_number: &str, message: &str) -> Result<(), NotifyError> {
        self.sns
            .publish()
            .phone_number(phone_number)
            .message(message)
            .send()
            .await
            .map_err(|e| NotifyError::Sms(e.to_string()))?;
        Ok(())
    }

    async fn send_email(&self, address: &str, message: &str) -> Result<(), NotifyError> {
        let body = RelayMessage {
            from: &self.relay.sender,
            to: address,
            subject: EMAIL_SUBJECT,
            text: message,
        };
        self.http
            .post(&self.relay.url)
            .bearer_auth(&self.relay.token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[rocket::async_trait]
impl Notifier for ExternalNotifier {
    async fn send(
        &self,
        channel: Channel,
        destination: &str,
        message: &str,
    ) -> Result<(), NotifyError> {
        match channel {
            Channel::Sms => self.send_sms(destination, message).await?,
            Channel::Email => self.send_email(destination, message).await?,
        }
        debug!("Sent {channel} notification");
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to send SMS: {0}")]
    Sms(String),
    #[error("failed to send email: {0}")]
    Email(#[from] reqwest::Error),
}

#[cfg(test)]
pub use recording::RecordingNotifier;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_contains_code_and_lifetime() {
        let code: Code = "042917".parse().unwrap();
        let message = otp_message(&code, Duration::seconds(300));
        assert!(message.contains("042917"));
        assert!(message.contains("5 minutes"));
    }

    #[rocket::async_test]
    async fn recording_notifier_finds_latest_code() {
        let notifier = RecordingNotifier::new();
        let first: Code = "111111".parse().unwrap();
        let second: Code = "222222".parse().unwrap();
        let ttl = Duration::seconds(300);

        notifier
            .send(Channel::Sms, "+447700900123", &otp_message(&first, ttl))
            .await
            .unwrap();
        notifier
            .send(Channel::Email, "voter@example.com", &otp_message(&first, ttl))
            .await
            .unwrap();
        notifier
            .send(Channel::Sms, "+447700900123", &otp_message(&second, ttl))
            .await
            .unwrap();

        assert_eq!(3, notifier.sent().len());
        assert_eq!(Some(second), notifier.last_code("+447700900123"));
        assert_eq!(Some(first), notifier.last_code("voter@example.com"));
        assert_eq!(None, notifier.last_code("nobody@example.com"));
    }
}
