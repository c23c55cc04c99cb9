//! Reply delivery over SMTP.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use mailimage_core::{AppError, Config, Sender};
use std::sync::Arc;

use super::{Notifier, Reply, ReplyComposer};

/// Sends replies through the configured relay.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    composer: ReplyComposer,
}

impl SmtpNotifier {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let host = config.smtp_host.as_str();
        let port = config.smtp_port;
        let from: Mailbox = config
            .smtp_from
            .parse()
            .map_err(|e| AppError::InvalidInput(format!("Invalid SMTP_FROM: {}", e)))?;

        let credentials = match (&config.smtp_user, &config.smtp_password) {
            (Some(u), Some(p)) => Some(Credentials::new(u.clone(), p.clone())),
            _ => None,
        };

        let mailer = if config.smtp_tls {
            let b = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| AppError::Notification(format!("Invalid SMTP relay: {}", e)))?
                .port(port);
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            tracing::info!(host = %host, port = port, "Reply mailer initialized (SMTP with STARTTLS)");
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            tracing::info!(host = %host, port = port, "Reply mailer initialized (SMTP)");
            b.build()
        };

        Ok(Self {
            mailer: Arc::new(mailer),
            from,
            composer: ReplyComposer::from_config(config),
        })
    }

    fn build_message(&self, reply: &Reply) -> Result<Message, AppError> {
        let address: Address = reply.to.address.parse().map_err(|e| {
            AppError::Notification(format!("Invalid recipient {}: {}", reply.to.address, e))
        })?;
        let name = (!reply.to.name.is_empty()).then(|| reply.to.name.clone());

        Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(name, address))
            .subject(reply.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(reply.body.clone())
            .map_err(|e| AppError::Notification(e.to_string()))
    }

    async fn send(&self, reply: Reply) -> Result<(), AppError> {
        let email = self.build_message(&reply)?;
        self.mailer
            .send(email)
            .await
            .map_err(|e| AppError::Notification(e.to_string()))?;
        tracing::info!(subject = %reply.subject, "Reply mail sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify_success(
        &self,
        recipient: &Sender,
        subject: &str,
        delete_link: &str,
    ) -> Result<(), AppError> {
        self.send(self.composer.success(recipient, subject, delete_link))
            .await
    }

    async fn notify_errors(
        &self,
        recipient: &Sender,
        subject: &str,
        messages: &[String],
    ) -> Result<(), AppError> {
        self.send(self.composer.errors(recipient, subject, messages))
            .await
    }
}
