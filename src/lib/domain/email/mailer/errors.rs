//! Mailer errors

use thiserror::Error;

/// Errors raised by a [`super::Mailer`] or [`super::MailerFactory`]
#[derive(Debug, Error)]
pub enum MailerError {
    /// An error occurred while sending the email
    #[error("An error occurred while sending the email: {0}")]
    SendError(String),

    /// Invalid email address
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// The message could not be assembled
    #[error("Invalid email message: {0}")]
    InvalidMessage(String),

    /// The transport could not be created
    #[error("Failed to create email transport: {0}")]
    TransportError(String),

    /// Unknown error
    #[error(transparent)]
    UnknownError(anyhow::Error),
}

impl From<anyhow::Error> for MailerError {
    fn from(err: anyhow::Error) -> Self {
        MailerError::UnknownError(err)
    }
}
