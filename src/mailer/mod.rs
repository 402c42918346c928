//! Outgoing e-mail. Sending happens after the request's work is committed
//! and never affects the response.

pub mod http;
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;

pub use http::HttpMailer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[automock]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

/// Sends `email` on a detached task and logs the outcome.
pub fn dispatch(mailer: Arc<dyn Mailer>, email: OutgoingEmail) {
    tokio::spawn(async move {
        let to = email.to.clone();
        let subject = email.subject.clone();

        match mailer.send(email).await {
            Ok(()) => tracing::info!("E-mail '{subject}' sent to {to}"),
            Err(err) => tracing::error!("Failed to send e-mail '{subject}' to {to}: {err:?}"),
        }
    });
}
