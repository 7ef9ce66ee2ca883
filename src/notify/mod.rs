// Email delivery for the daily and weekly reports

use anyhow::{anyhow, Context, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::config::EmailSettings;

pub trait Notifier {
    fn send_html(&self, subject: &str, to: &str, html: &str, attachments: &[PathBuf]) -> Result<()>;
}

/// SMTP sender using STARTTLS and login credentials
pub struct SmtpMailer {
    settings: EmailSettings,
}

impl SmtpMailer {
    pub fn new(settings: &EmailSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    fn build_message(
        &self,
        subject: &str,
        to: &str,
        html: &str,
        attachments: &[PathBuf],
    ) -> Result<Message> {
        let from: Mailbox = self
            .settings
            .from
            .parse()
            .with_context(|| format!("Invalid sender address: {}", self.settings.from))?;
        let to: Mailbox = to
            .parse()
            .with_context(|| format!("Invalid recipient address: {}", to))?;

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(html.to_string()));
        for path in attachments {
            let bytes =
                fs::read(path).with_context(|| format!("Failed to read attachment {:?}", path))?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("attachment")
                .to_string();
            let content_type = ContentType::parse("application/octet-stream")
                .map_err(|e| anyhow!("Invalid attachment content type: {:?}", e))?;
            body = body.singlepart(Attachment::new(name).body(bytes, content_type));
        }

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(body)
            .context("Failed to build email")
    }
}

impl Notifier for SmtpMailer {
    fn send_html(&self, subject: &str, to: &str, html: &str, attachments: &[PathBuf]) -> Result<()> {
        let message = self.build_message(subject, to, html, attachments)?;

        let mailer = SmtpTransport::starttls_relay(&self.settings.smtp_server)
            .with_context(|| format!("Invalid SMTP server: {}", self.settings.smtp_server))?
            .port(self.settings.smtp_port)
            .credentials(Credentials::new(
                self.settings.smtp_user.clone(),
                self.settings.smtp_password.clone(),
            ))
            .build();

        mailer.send(&message).context("Failed to send email")?;
        info!("Email \"{}\" sent to {}", subject, to);
        Ok(())
    }
}
