//! Operator-facing alert channel.
//!
//! Fires on fetch failures and critical delivery failures only. Strictly
//! best-effort: its own failures are logged and never affect the run.

use lettre::message::{Mailbox, Message, header};
use lettre::transport::smtp::AsyncSmtpTransport;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncTransport, Tokio1Executor};

use crate::error::{AppError, Result};
use crate::models::AdminConfig;
use crate::notify::expand_subject;

/// Delivers operator alerts over SMTP, or just logs them when no mail
/// settings are configured.
pub struct AdminNotifier {
    mailer: Option<AdminMailer>,
}

struct AdminMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
    subject: String,
}

impl AdminNotifier {
    /// Log-only notifier.
    pub fn disabled() -> Self {
        Self { mailer: None }
    }

    pub fn from_config(config: &AdminConfig) -> Result<Self> {
        let Some(email) = &config.email else {
            return Ok(Self::disabled());
        };

        // Operator relays commonly sit behind STARTTLS submission ports.
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&email.server)
            .map_err(|e| AppError::config(format!("admin server '{}': {e}", email.server)))?
            .port(email.port);

        if let (Some(user), Some(pass)) = (&email.username, &email.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: Some(AdminMailer {
                transport: builder.build(),
                from: parse_mailbox(&email.from)?,
                recipients: email
                    .recipients
                    .iter()
                    .map(|r| parse_mailbox(r))
                    .collect::<Result<_>>()?,
                subject: email.subject.clone(),
            }),
        })
    }

    /// Raise an operator alert. Never fails; transport problems are logged.
    pub async fn alert(&self, message: &str) {
        log::error!("admin alert: {message}");

        let Some(mailer) = &self.mailer else {
            return;
        };

        let subject = expand_subject(&mailer.subject);
        for recipient in &mailer.recipients {
            let built = Message::builder()
                .from(mailer.from.clone())
                .to(recipient.clone())
                .subject(subject.as_str())
                .header(header::ContentType::TEXT_PLAIN)
                .body(message.to_string());

            match built {
                Ok(mail) => {
                    if let Err(e) = mailer.transport.send(mail).await {
                        log::warn!("admin alert to {recipient} failed: {e}");
                    }
                }
                Err(e) => log::warn!("admin alert message build failed: {e}"),
            }
        }
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| AppError::config(format!("invalid email address '{address}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdminEmailConfig;

    #[tokio::test]
    async fn test_disabled_notifier_only_logs() {
        // must not panic or block without mail settings
        AdminNotifier::disabled().alert("fetch failed").await;
    }

    #[test]
    fn test_from_config_without_email_is_log_only() {
        let notifier = AdminNotifier::from_config(&AdminConfig::default()).unwrap();
        assert!(notifier.mailer.is_none());
    }

    #[test]
    fn test_from_config_with_email() {
        let config = AdminConfig {
            email: Some(AdminEmailConfig {
                server: "smtp.example.org".into(),
                port: 587,
                from: "watcher@example.org".into(),
                username: Some("watcher".into()),
                password: Some("hunter2".into()),
                recipients: vec!["ops@example.org".into()],
                subject: "Run failed ({date_time})".into(),
            }),
        };
        let notifier = AdminNotifier::from_config(&config).unwrap();
        assert!(notifier.mailer.is_some());
    }
}
