use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use super::{Email, Mailer};

/// Delivers through a transactional-mail HTTP API that accepts a JSON message
/// and a bearer API key.
pub struct HttpMailer {
    api_url: String,
    api_key: String,
    from_name: String,
    from_email: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct Sender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    from: Sender<'a>,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from_name: String, from_email: String) -> Self {
        Self {
            api_url,
            api_key,
            from_name,
            from_email,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> anyhow::Result<()> {
        let message = OutgoingMessage {
            from: Sender {
                name: &self.from_name,
                email: &self.from_email,
            },
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        };

        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .context("failed to reach mail API")?
            .error_for_status()
            .context("mail API returned error")?;

        tracing::debug!(to = %email.to, subject = %email.subject, "email delivered");
        Ok(())
    }
}
