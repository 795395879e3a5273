//! SMTP alert mail channel.

use async_trait::async_trait;
use lettre::message::{Mailbox, Message, header};
use lettre::transport::smtp::AsyncSmtpTransport;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncTransport, Tokio1Executor};

use crate::error::{AppError, Result};
use crate::models::EmailConfig;
use crate::notify::{Channel, expand_subject};

/// Sends the report body to every configured recipient.
pub struct EmailChannel {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    reply_to: Option<Mailbox>,
    recipients: Vec<Mailbox>,
    subject: String,
    critical: bool,
}

impl EmailChannel {
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)
            .map_err(|e| AppError::config(format!("email server '{}': {e}", config.server)))?
            .port(config.port);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            from: parse_mailbox(&config.from)?,
            reply_to: config
                .reply_to
                .as_deref()
                .map(parse_mailbox)
                .transpose()?,
            recipients: config
                .recipients
                .iter()
                .map(|r| parse_mailbox(r))
                .collect::<Result<_>>()?,
            subject: config.subject.clone(),
            critical: config.critical,
        })
    }
}

#[async_trait]
impl Channel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    fn critical(&self) -> bool {
        self.critical
    }

    async fn post(&self, chunk: &str) -> Result<()> {
        let subject = expand_subject(&self.subject);

        for recipient in &self.recipients {
            let mut builder = Message::builder()
                .from(self.from.clone())
                .to(recipient.clone())
                .subject(subject.as_str())
                .header(header::ContentType::TEXT_PLAIN);
            if let Some(reply_to) = &self.reply_to {
                builder = builder.reply_to(reply_to.clone());
            }

            let message = builder
                .body(chunk.to_string())
                .map_err(|e| AppError::delivery("email", e))?;

            self.mailer
                .send(message)
                .await
                .map_err(|e| AppError::delivery("email", e))?;
            log::info!("email sent to {recipient}");
        }
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| AppError::config(format!("invalid email address '{address}': {e}")))
}
