//! Error types for the email module

use thiserror::Error;
use tracing::debug;

use crate::domain::config::ConfigError;

use super::mailer::MailerError;

/// Errors returned by the email service
#[derive(Debug, Error)]
pub enum EmailError {
    /// Sending is disabled, the transport is closed, or there is no address
    /// to send to
    #[error("{message}")]
    Disabled {
        /// The correlation id of the call
        correlation_id: String,

        /// Human readable reason
        message: String,
    },

    /// A template could not be rendered
    #[error("Failed to render template: {0}")]
    Template(#[from] handlebars::RenderError),

    /// The connection or credential configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The transport failed
    #[error(transparent)]
    Mailer(#[from] MailerError),

    /// Unknown error
    #[error(transparent)]
    UnknownError(#[from] anyhow::Error),
}

impl EmailError {
    /// Error code of [`EmailError::Disabled`]
    pub const DISABLED_CODE: &'static str = "EMAIL_DISABLED";

    /// Create a [`EmailError::Disabled`] error
    pub fn disabled(correlation_id: &str, message: &str) -> Self {
        debug!(correlation_id, "{message}");

        Self::Disabled {
            correlation_id: correlation_id.to_string(),
            message: message.to_string(),
        }
    }

    /// Machine readable error code
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Disabled { .. } => Some(Self::DISABLED_CODE),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for EmailError {
    fn from(err: tokio::task::JoinError) -> Self {
        EmailError::UnknownError(err.into())
    }
}
