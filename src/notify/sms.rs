//! Twilio-style SMS transport
//!
//! Plain REST: one form-encoded POST per message against the account's
//! `Messages.json` endpoint, authenticated with the account SID and auth
//! token as basic auth.

use super::SmsSender;
use crate::config::TwilioConfig;
use anyhow::Context;
use async_trait::async_trait;

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

pub struct TwilioSmsSender {
    http: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioSmsSender {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            API_BASE, self.config.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send(&self, to: &str, body: &str) -> anyhow::Result<()> {
        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("From", self.config.from_number.as_str()),
                ("To", to),
                ("Body", body),
            ])
            .send()
            .await
            .context("SMS provider request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("SMS provider rejected message ({status}): {detail}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url_embeds_account_sid() {
        let sender = TwilioSmsSender::new(TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            from_number: "+15550001111".to_string(),
        });
        assert_eq!(
            sender.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }
}
