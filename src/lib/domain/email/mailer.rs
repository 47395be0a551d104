//! Email transport ports

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

mod errors;

pub use errors::MailerError;

use super::connection::{ConnectionParams, CredentialParams};

/// A fully rendered message, ready for the transport
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Sender address
    pub from: Option<String>,

    /// Destination addresses, comma separated
    pub to: String,

    /// Carbon-copy addresses, comma separated
    pub cc: Option<String>,

    /// Blind carbon-copy addresses, comma separated
    pub bcc: Option<String>,

    /// Reply-to address
    pub reply_to: Option<String>,

    /// Rendered subject
    pub subject: Option<String>,

    /// Rendered plain text body
    pub text: Option<String>,

    /// Rendered HTML body
    pub html: Option<String>,
}

/// Sends rendered messages
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Send an email
    ///
    /// # Arguments
    /// * `envelope` - The [`Envelope`] to deliver.
    ///
    /// # Returns
    /// A [`Result`] indicating success or failure.
    async fn send(&self, envelope: Envelope) -> Result<(), MailerError>;
}

/// Creates [`Mailer`] transports for a resolved connection
pub trait MailerFactory: Send + Sync + 'static {
    /// The transport this factory builds
    type Mailer: Mailer;

    /// Create a transport
    ///
    /// # Arguments
    /// * `connection` - Where the server lives.
    /// * `credential` - How to authenticate, if at all.
    fn create(
        &self,
        connection: &ConnectionParams,
        credential: Option<CredentialParams>,
    ) -> Result<Self::Mailer, MailerError>;
}

#[cfg(test)]
mock! {
    pub Mailer {}

    #[async_trait]
    impl Mailer for Mailer {
        async fn send(&self, envelope: Envelope) -> Result<(), MailerError>;
    }
}

#[cfg(test)]
mock! {
    pub MailerFactory {}

    impl MailerFactory for MailerFactory {
        type Mailer = MockMailer;

        fn create(
            &self,
            connection: &ConnectionParams,
            credential: Option<CredentialParams>,
        ) -> Result<MockMailer, MailerError>;
    }
}
