//! SMTP email transport implementation

use async_trait::async_trait;
use clap::Parser;
use lettre::{
    message::{Mailbox, Mailboxes, MessageBuilder, MultiPart, SinglePart},
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use crate::domain::{
    config::ConfigParams,
    email::{ConnectionParams, CredentialParams, Envelope, Mailer, MailerError, MailerFactory},
};

/// Port used for implicit TLS connections
pub const SECURE_PORT: u16 = 465;

/// Port used for plain connections upgraded with STARTTLS
pub const SUBMISSION_PORT: u16 = 587;

/// SMTP configuration
#[derive(Clone, Default, Debug, Parser)]
pub struct SmtpConfig {
    /// The SMTP host
    #[clap(long = "smtp-host", env = "SMTP_HOST")]
    pub host: Option<String>,

    /// The SMTP port
    #[clap(long = "smtp-port", env = "SMTP_PORT")]
    pub port: Option<u16>,

    /// Use implicit TLS instead of STARTTLS
    #[clap(long = "smtp-secure", env = "SMTP_SECURE")]
    pub secure: bool,

    /// The SASL mechanism: plain, login or xoauth2
    #[clap(long = "smtp-auth-type", env = "SMTP_AUTH_TYPE")]
    pub auth_type: Option<String>,

    /// The SMTP username
    #[clap(long = "smtp-user", env = "SMTP_USER")]
    pub username: Option<String>,

    /// The SMTP password
    #[clap(long = "smtp-password", env = "SMTP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl From<&SmtpConfig> for ConfigParams {
    fn from(smtp: &SmtpConfig) -> Self {
        let mut config = ConfigParams::new();

        if let Some(host) = &smtp.host {
            config.set("connection.host", host);
            config.set("connection.secure", smtp.secure.to_string());
        }
        if let Some(port) = smtp.port {
            config.set("connection.port", port.to_string());
        }
        if let Some(auth_type) = &smtp.auth_type {
            config.set("credential.type", auth_type);
        }
        if let Some(username) = &smtp.username {
            config.set("credential.username", username);
        }
        if let Some(password) = &smtp.password {
            config.set("credential.password", password);
        }

        config
    }
}

/// SMTP mailer
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Wrap an existing lettre transport
    pub fn new(transport: AsyncSmtpTransport<Tokio1Executor>) -> Self {
        Self { transport }
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").finish_non_exhaustive()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, envelope: Envelope) -> Result<(), MailerError> {
        let message = build_message(envelope)?;

        match self.transport.send(message).await {
            Ok(response) => {
                debug!(code = %response.code(), "message accepted");
                Ok(())
            }
            Err(e) => Err(MailerError::SendError(e.to_string())),
        }
    }
}

/// Builds [`SmtpMailer`]s for resolved connections
#[derive(Clone, Debug, Default)]
pub struct SmtpMailerFactory;

impl SmtpMailerFactory {
    /// Create a new factory
    pub fn new() -> Self {
        Self
    }
}

impl MailerFactory for SmtpMailerFactory {
    type Mailer = SmtpMailer;

    fn create(
        &self,
        connection: &ConnectionParams,
        credential: Option<CredentialParams>,
    ) -> Result<SmtpMailer, MailerError> {
        let transport_error = |e: lettre::transport::smtp::Error| {
            MailerError::TransportError(format!("{}: {e}", connection.host))
        };

        let mut builder = if connection.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&connection.host)
                .map_err(transport_error)?
                .port(connection.port.unwrap_or(SECURE_PORT))
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&connection.host)
                .port(connection.port.unwrap_or(SUBMISSION_PORT))
                .tls(Tls::Opportunistic(
                    TlsParameters::builder(connection.host.clone())
                        .build()
                        .map_err(transport_error)?,
                ))
        };

        if let Some(credential) = credential {
            if let Some(auth_type) = credential.auth_type.as_deref() {
                builder = builder.authentication(vec![mechanism(auth_type)?]);
            }

            builder = builder.credentials(Credentials::new(
                credential.username,
                credential.password,
            ));
        }

        Ok(SmtpMailer::new(builder.build()))
    }
}

fn mechanism(auth_type: &str) -> Result<Mechanism, MailerError> {
    match auth_type.to_ascii_lowercase().as_str() {
        "plain" => Ok(Mechanism::Plain),
        "login" => Ok(Mechanism::Login),
        "xoauth2" | "oauth2" => Ok(Mechanism::Xoauth2),
        other => Err(MailerError::TransportError(format!(
            "unsupported authentication type \"{other}\""
        ))),
    }
}

fn mailboxes(addresses: &str) -> Result<Mailboxes, MailerError> {
    addresses
        .parse()
        .map_err(|_| MailerError::InvalidEmail(addresses.to_string()))
}

fn mailbox(address: &str) -> Result<Mailbox, MailerError> {
    address
        .parse()
        .map_err(|_| MailerError::InvalidEmail(address.to_string()))
}

/// Converts an [`Envelope`] into a lettre [`Message`]
pub fn build_message(envelope: Envelope) -> Result<Message, MailerError> {
    let mut builder: MessageBuilder = Message::builder();

    if let Some(from) = envelope.from.as_deref() {
        builder = builder.from(mailbox(from)?);
    }

    for to in mailboxes(&envelope.to)? {
        builder = builder.to(to);
    }

    if let Some(cc) = envelope.cc.as_deref() {
        for cc in mailboxes(cc)? {
            builder = builder.cc(cc);
        }
    }

    if let Some(bcc) = envelope.bcc.as_deref() {
        for bcc in mailboxes(bcc)? {
            builder = builder.bcc(bcc);
        }
    }

    if let Some(reply_to) = envelope.reply_to.as_deref() {
        builder = builder.reply_to(mailbox(reply_to)?);
    }

    if let Some(subject) = envelope.subject {
        builder = builder.subject(subject);
    }

    let message = match (envelope.text, envelope.html) {
        (Some(text), Some(html)) => {
            builder.multipart(MultiPart::alternative_plain_html(text, html))
        }
        (None, Some(html)) => builder.singlepart(SinglePart::html(html)),
        (Some(text), None) => builder.singlepart(SinglePart::plain(text)),
        (None, None) => builder.singlepart(SinglePart::plain(String::new())),
    };

    message.map_err(|e| MailerError::InvalidMessage(e.to_string()))
}
