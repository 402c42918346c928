use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::{
    core::config::MailConfig,
    mailer::{Mailer, OutgoingEmail},
};

/// Mailer backed by a transactional e-mail HTTP API.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

impl HttpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build the e-mail HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: format!("{} <{}>", config.sender_name, config.sender_address),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&SendRequest {
                from: &self.from,
                to: [&email.to],
                subject: &email.subject,
                html: &email.html,
            })
            .send()
            .await
            .context("E-mail provider is unreachable")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("E-mail provider answered {status}: {text}");
        }

        Ok(())
    }
}
