//! SMTP email transport
//!
//! One STARTTLS relay connection per configured host, authenticated with
//! the credentials from config. Messages are plain text; the from address
//! defaults to the SMTP username upstream in config loading.

use super::EmailSender;
use crate::config::SmtpConfig;
use crate::core::error::ConfigError;
use anyhow::Context;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Debug)]
pub struct SmtpEmailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, ConfigError> {
        let from: Mailbox =
            config
                .from_address
                .parse()
                .map_err(|e| ConfigError::InvalidValue {
                    var: "SMTP_FROM".to_string(),
                    value: config.from_address.clone(),
                    message: format!("not a valid mailbox: {e}"),
                })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| ConfigError::InvalidValue {
                var: "SMTP_HOST".to_string(),
                value: config.host.clone(),
                message: e.to_string(),
            })?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("invalid recipient address")?)
            .subject(subject)
            .body(body.to_string())
            .context("failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("SMTP send failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(from_address: &str) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "kitchen@example.com".to_string(),
            password: "secret".to_string(),
            from_address: from_address.to_string(),
        }
    }

    #[tokio::test]
    async fn test_new_accepts_plain_address() {
        assert!(SmtpEmailer::new(&config("kitchen@example.com")).is_ok());
    }

    #[test]
    fn test_new_rejects_malformed_from_address() {
        let err = SmtpEmailer::new(&config("not an address")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref var, .. } if var == "SMTP_FROM"));
    }
}
