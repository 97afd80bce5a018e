//! Outbound email for feedback responses.

use askama::Template;
use lettre::{
    Address, AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::path::Path;

use crate::config::MailConfig;
use crate::errors::AppError;

pub struct Mailer {
    transport: MailTransport,
    from_email: String,
    from_name: String,
}

enum MailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl Mailer {
    pub fn new(config: &MailConfig) -> Result<Self, String> {
        let transport = match &config.smtp_host {
            Some(host) => {
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .map_err(|e| format!("create SMTP transport: {e}"))?
                    .port(config.smtp_port);
                if !config.smtp_username.is_empty() {
                    builder = builder.credentials(Credentials::new(
                        config.smtp_username.clone(),
                        config.smtp_password.clone(),
                    ));
                }
                log::info!("Mail: SMTP relay {host}:{}", config.smtp_port);
                MailTransport::Smtp(builder.build())
            }
            None => {
                let dir = Path::new(&config.mail_dir);
                if !dir.exists() {
                    std::fs::create_dir_all(dir)
                        .map_err(|e| format!("create mail directory {}: {e}", config.mail_dir))?;
                }
                log::info!("Mail: no SMTP_HOST, writing messages to {}", config.mail_dir);
                MailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(dir))
            }
        };

        Ok(Self {
            transport,
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }

    pub async fn send(&self, to_email: &str, to_name: Option<&str>, subject: &str, html: &str) -> Result<(), String> {
        let from_address = self
            .from_email
            .parse::<Address>()
            .map_err(|e| format!("parse from address: {e}"))?;
        let from = Mailbox::new(Some(self.from_name.clone()), from_address);

        let to_address = to_email
            .trim()
            .parse::<Address>()
            .map_err(|e| format!("parse recipient '{to_email}': {e}"))?;
        let display = to_name.map(str::trim).filter(|n| !n.is_empty()).map(String::from);
        let to = Mailbox::new(display, to_address);

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| format!("build message: {e}"))?;

        match &self.transport {
            MailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| format!("SMTP send: {e}"))?;
            }
            MailTransport::File(file) => {
                file.send(message).await.map_err(|e| format!("file send: {e}"))?;
            }
        }
        Ok(())
    }
}

#[derive(Template)]
#[template(path = "email/feedback_response.html")]
struct FeedbackResponseEmail<'a> {
    subject: &'a str,
    name: &'a str,
    topic: &'a str,
    status: &'a str,
    response: &'a str,
}

/// Subject and HTML body telling a submitter their feedback was answered.
pub fn feedback_response_email(
    name: &str,
    topic: &str,
    status: &str,
    response: &str,
) -> Result<(String, String), AppError> {
    let subject = format!("Update on your feedback: {topic}");
    let body = FeedbackResponseEmail {
        subject: &subject,
        name: name.trim(),
        topic,
        status,
        response: response.trim(),
    }
    .render()?;
    Ok((subject, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config(dir: &str) -> MailConfig {
        MailConfig {
            smtp_host: None,
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "noreply@src.local".into(),
            from_name: "SRC Portal".into(),
            mail_dir: dir.into(),
        }
    }

    #[test]
    fn response_email_escapes_and_includes_response() {
        let (subject, body) =
            feedback_response_email("Jane & Co", "President", "Resolved", "Fixed <soon>").unwrap();
        assert_eq!(subject, "Update on your feedback: President");
        assert!(body.contains("Hello Jane &amp; Co,"));
        assert!(body.contains("Fixed &lt;soon&gt;"));
        assert!(body.contains("<strong>Resolved</strong>"));
    }

    #[test]
    fn response_block_omitted_when_empty() {
        let (_, body) = feedback_response_email("", "Welfare", "Resolved", "  ").unwrap();
        assert!(body.contains("Hello,"));
        assert!(!body.contains("Response:"));
    }

    #[tokio::test]
    async fn file_transport_writes_message() {
        let dir = std::env::temp_dir().join(format!("src-portal-mail-{}", std::process::id()));
        let mailer = Mailer::new(&file_config(dir.to_str().unwrap())).unwrap();
        mailer
            .send("jane@x.com", Some("Jane"), "Hello", "<p>hi</p>")
            .await
            .unwrap();
        let written = std::fs::read_dir(&dir).unwrap().count();
        assert!(written >= 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn display_name_with_comma_is_accepted() {
        let dir = std::env::temp_dir().join(format!("src-portal-mail-comma-{}", std::process::id()));
        let mailer = Mailer::new(&file_config(dir.to_str().unwrap())).unwrap();
        mailer
            .send("jane@x.com", Some("Doe, Jane"), "Hello", "<p>hi</p>")
            .await
            .unwrap();
        assert!(mailer.send("not an address", Some("Jane"), "Hello", "<p>hi</p>").await.is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
