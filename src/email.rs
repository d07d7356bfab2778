use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

/// An HTML message ready to hand to a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

/// SMTP transport with STARTTLS and credentials.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .context("smtp relay")?
            .port(config.port)
            .credentials(credentials)
            .build();
        let from = config
            .from_address
            .parse::<Mailbox>()
            .with_context(|| format!("invalid MAIL_FROM {}", config.from_address))?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML);
        for to in &email.recipients {
            let mailbox = to
                .parse::<Mailbox>()
                .with_context(|| format!("invalid recipient {to}"))?;
            builder = builder.to(mailbox);
        }
        let message = builder.body(email.html_body).context("build message")?;

        self.transport.send(message).await.context("smtp send")?;
        tracing::info!(recipients = ?email.recipients, subject = %email.subject, "email sent");
        Ok(())
    }
}
