//! Email service

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

use super::{
    errors::EmailError,
    message::{EmailMessage, EmailRecipient},
    parameters::TemplateParameters,
};

/// Email service
#[async_trait]
pub trait EmailService: Clone + Send + Sync + 'static {
    /// Sends a message to the addresses in its `to` field.
    ///
    /// # Arguments
    /// * `correlation_id` - Identifies the call in logs and errors.
    /// * `message` - The [`EmailMessage`] to render and send.
    /// * `parameters` - Template variables, overriding the configured defaults.
    ///
    /// # Returns
    /// A [`Result`] which is [`Ok`] if the message was sent or sending is
    /// disabled, or an [`Err`] containing an [`EmailError`].
    async fn send_message(
        &self,
        correlation_id: &str,
        message: &EmailMessage,
        parameters: &TemplateParameters,
    ) -> Result<(), EmailError>;

    /// Sends a message to a single recipient, rendered in the recipient's
    /// language with the recipient's fields available to the templates.
    ///
    /// # Arguments
    /// * `correlation_id` - Identifies the call in logs and errors.
    /// * `recipient` - The [`EmailRecipient`] to send to.
    /// * `message` - The [`EmailMessage`] to render and send.
    /// * `parameters` - Template variables, overriding the configured defaults.
    async fn send_message_to_recipient(
        &self,
        correlation_id: &str,
        recipient: &EmailRecipient,
        message: &EmailMessage,
        parameters: &TemplateParameters,
    ) -> Result<(), EmailError>;

    /// Sends a message to each recipient independently.
    ///
    /// # Returns
    /// The first error encountered, if any.
    async fn send_message_to_recipients(
        &self,
        correlation_id: &str,
        recipients: &[EmailRecipient],
        message: &EmailMessage,
        parameters: &TemplateParameters,
    ) -> Result<(), EmailError>;
}

#[cfg(test)]
mock! {
    pub EmailService {}

    impl Clone for EmailService {
        fn clone(&self) -> Self;
    }

    #[async_trait]
    impl EmailService for EmailService {
        async fn send_message(
            &self,
            correlation_id: &str,
            message: &EmailMessage,
            parameters: &TemplateParameters,
        ) -> Result<(), EmailError>;

        async fn send_message_to_recipient(
            &self,
            correlation_id: &str,
            recipient: &EmailRecipient,
            message: &EmailMessage,
            parameters: &TemplateParameters,
        ) -> Result<(), EmailError>;

        async fn send_message_to_recipients(
            &self,
            correlation_id: &str,
            recipients: &[EmailRecipient],
            message: &EmailMessage,
            parameters: &TemplateParameters,
        ) -> Result<(), EmailError>;
    }
}
