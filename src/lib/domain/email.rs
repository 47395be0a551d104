//! Templated email delivery.

mod connection;
mod controller;
mod errors;
mod mailer;
mod message;
mod parameters;
mod service;
mod templates;

pub use connection::{ConnectionParams, CredentialParams};
pub use controller::{EmailController, EmailSettings};
pub use errors::EmailError;
pub use mailer::{Envelope, Mailer, MailerError, MailerFactory};
pub use message::{EmailMessage, EmailRecipient, MessageTemplate, DEFAULT_LANGUAGE};
pub use parameters::TemplateParameters;
pub use service::EmailService;
pub use templates::TemplateRenderer;
