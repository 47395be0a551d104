//! Email controller

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use futures::future::try_join_all;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::config::{ConfigError, ConfigParams};

use super::{
    connection::{ConnectionParams, CredentialParams},
    errors::EmailError,
    mailer::{Envelope, Mailer, MailerFactory},
    message::{EmailMessage, EmailRecipient, DEFAULT_LANGUAGE},
    parameters::TemplateParameters,
    service::EmailService,
    templates::TemplateRenderer,
};

/// Defaults applied to every message
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmailSettings {
    /// Default sender address
    pub from: Option<String>,

    /// Default carbon-copy addresses
    pub cc: Option<String>,

    /// Default blind carbon-copy addresses
    pub bcc: Option<String>,

    /// Default reply-to address
    pub reply_to: Option<String>,

    /// Default template variables
    pub parameters: TemplateParameters,

    /// Silently drop every message
    pub disabled: bool,
}

/// Renders and sends messages through a transport built by `F`.
///
/// Clones share configuration and the open transport.
pub struct EmailController<F: MailerFactory> {
    settings: Arc<EmailSettings>,
    config: Arc<ConfigParams>,
    renderer: Arc<TemplateRenderer>,
    factory: Arc<F>,
    transport: Arc<RwLock<Option<Arc<F::Mailer>>>>,
}

impl<F: MailerFactory> EmailController<F> {
    /// Create a closed, unconfigured controller
    pub fn new(factory: F) -> Self {
        Self {
            settings: Arc::new(EmailSettings::default()),
            config: Arc::new(ConfigParams::new()),
            renderer: Arc::new(TemplateRenderer::new()),
            factory: Arc::new(factory),
            transport: Arc::new(RwLock::new(None)),
        }
    }

    /// Applies `config`.
    ///
    /// Message defaults and the disabled flag keep their previous values when
    /// their keys are absent; the `parameters` section replaces the default
    /// template variables. Connection and credential keys are resolved on
    /// [`Self::open`].
    pub fn configure(&mut self, config: &ConfigParams) -> Result<(), ConfigError> {
        let current = &self.settings;

        let settings = EmailSettings {
            from: config
                .get_as_string("message.from")
                .or_else(|| current.from.clone()),
            cc: config
                .get_as_string("message.cc")
                .or_else(|| current.cc.clone()),
            bcc: config
                .get_as_string("message.bcc")
                .or_else(|| current.bcc.clone()),
            reply_to: config
                .get_as_string("message.reply_to")
                .or_else(|| current.reply_to.clone()),
            parameters: TemplateParameters::from_config(&config.section("parameters")),
            disabled: config
                .get_as_bool("options.disabled")?
                .unwrap_or(current.disabled),
        };

        if settings.disabled {
            warn!("sending emails is disabled");
        }

        self.settings = Arc::new(settings);
        self.config = Arc::new(config.clone());

        Ok(())
    }

    /// The active settings
    pub fn settings(&self) -> &EmailSettings {
        &self.settings
    }

    /// Whether a transport is open
    pub async fn is_open(&self) -> bool {
        self.transport.read().await.is_some()
    }

    /// Resolves the connection and credentials and opens the transport.
    ///
    /// Does nothing if already open. Without a configured connection the
    /// controller stays closed.
    pub async fn open(&self, correlation_id: &str) -> Result<(), EmailError> {
        let mut transport = self.transport.write().await;
        if transport.is_some() {
            return Ok(());
        }

        let connection = ConnectionParams::resolve(&self.config)?;
        let credential = CredentialParams::lookup(&self.config)?;

        let Some(connection) = connection else {
            warn!(correlation_id, "no SMTP connection configured");
            return Ok(());
        };

        let mailer = self.factory.create(&connection, credential)?;

        info!(
            correlation_id,
            host = %connection.host,
            port = ?connection.port,
            secure = connection.secure,
            "opened email transport"
        );

        *transport = Some(Arc::new(mailer));

        Ok(())
    }

    /// Discards the transport
    pub async fn close(&self, correlation_id: &str) {
        if self.transport.write().await.take().is_some() {
            info!(correlation_id, "closed email transport");
        }
    }

    async fn mailer(&self) -> Option<Arc<F::Mailer>> {
        self.transport.read().await.clone()
    }

    fn render_envelope(
        &self,
        message: &EmailMessage,
        to: &str,
        parameters: &TemplateParameters,
        language: &str,
    ) -> Result<Envelope, EmailError> {
        let settings = &self.settings;

        Ok(Envelope {
            from: message.from.clone().or_else(|| settings.from.clone()),
            to: to.to_string(),
            cc: message.cc.clone().or_else(|| settings.cc.clone()),
            bcc: message.bcc.clone().or_else(|| settings.bcc.clone()),
            reply_to: message
                .reply_to
                .clone()
                .or_else(|| settings.reply_to.clone()),
            subject: self
                .renderer
                .render(message.subject.as_ref(), parameters, language)?,
            text: self
                .renderer
                .render(message.text.as_ref(), parameters, language)?,
            html: self
                .renderer
                .render(message.html.as_ref(), parameters, language)?,
        })
    }
}

fn address(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl<F: MailerFactory> EmailService for EmailController<F> {
    async fn send_message(
        &self,
        correlation_id: &str,
        message: &EmailMessage,
        parameters: &TemplateParameters,
    ) -> Result<(), EmailError> {
        if self.settings.disabled {
            debug!(correlation_id, "skipping message, emails are disabled");
            return Ok(());
        }

        let (Some(mailer), Some(to)) = (self.mailer().await, address(message.to.as_deref()))
        else {
            return Err(EmailError::disabled(
                correlation_id,
                "emails disabled, or email recipient not set",
            ));
        };

        let parameters = self.settings.parameters.override_with(parameters);
        let envelope = self.render_envelope(message, to, &parameters, DEFAULT_LANGUAGE)?;

        debug!(correlation_id, to, "sending message");

        mailer.send(envelope).await?;

        Ok(())
    }

    async fn send_message_to_recipient(
        &self,
        correlation_id: &str,
        recipient: &EmailRecipient,
        message: &EmailMessage,
        parameters: &TemplateParameters,
    ) -> Result<(), EmailError> {
        if self.settings.disabled {
            debug!(correlation_id, "skipping message, emails are disabled");
            return Ok(());
        }

        let (Some(mailer), Some(to)) = (self.mailer().await, address(recipient.email.as_deref()))
        else {
            return Err(EmailError::disabled(
                correlation_id,
                "emails disabled, or recipients email not set",
            ));
        };

        let parameters = self
            .settings
            .parameters
            .override_with(parameters)
            .override_with_map(&recipient.to_variables());

        let language = recipient.language();
        let envelope = self.render_envelope(message, to, &parameters, language)?;

        debug!(correlation_id, to, language, "sending message to recipient");

        mailer.send(envelope).await?;

        Ok(())
    }

    async fn send_message_to_recipients(
        &self,
        correlation_id: &str,
        recipients: &[EmailRecipient],
        message: &EmailMessage,
        parameters: &TemplateParameters,
    ) -> Result<(), EmailError> {
        if self.settings.disabled {
            debug!(correlation_id, "skipping message, emails are disabled");
            return Ok(());
        }

        if !self.is_open().await || recipients.is_empty() {
            return Err(EmailError::disabled(
                correlation_id,
                "emails disabled, or no recipients sent",
            ));
        }

        debug!(
            correlation_id,
            recipients = recipients.len(),
            "sending message to recipients"
        );

        let message = Arc::new(message.clone());
        let parameters = Arc::new(parameters.clone());

        // Dropping a JoinHandle detaches its task, so sends still in flight
        // when another one fails run to completion unobserved.
        let sends = recipients.iter().cloned().map(|recipient| {
            let controller = self.clone();
            let correlation_id = correlation_id.to_string();
            let message = Arc::clone(&message);
            let parameters = Arc::clone(&parameters);

            let handle = tokio::spawn(async move {
                controller
                    .send_message_to_recipient(&correlation_id, &recipient, &message, &parameters)
                    .await
            });

            async move { handle.await? }
        });

        try_join_all(sends).await?;

        Ok(())
    }
}

impl<F: MailerFactory> Clone for EmailController<F> {
    fn clone(&self) -> Self {
        Self {
            settings: Arc::clone(&self.settings),
            config: Arc::clone(&self.config),
            renderer: Arc::clone(&self.renderer),
            factory: Arc::clone(&self.factory),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<F: MailerFactory> fmt::Debug for EmailController<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailController")
            .field("settings", &self.settings)
            .field("transport", &"Mailer")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use testresult::TestResult;

    use crate::domain::email::{
        tests::{MockMailer, MockMailerFactory},
        MailerError, MessageTemplate,
    };

    use super::*;

    fn config(extra: &[(&str, &str)]) -> ConfigParams {
        let mut config = ConfigParams::from_tuples([
            ("message.from", "noreply@example.com"),
            ("message.cc", "audit@example.com"),
            ("parameters.name", "customer"),
            ("parameters.signature", "The Team"),
            ("connection.host", "smtp.example.com"),
            ("connection.port", "2525"),
        ]);

        for (key, value) in extra {
            config.set(*key, *value);
        }

        config
    }

    async fn open_controller(
        config: ConfigParams,
        mailer: MockMailer,
    ) -> TestResult<EmailController<MockMailerFactory>> {
        let mut factory = MockMailerFactory::new();
        factory
            .expect_create()
            .times(1)
            .return_once(move |_, _| Ok(mailer));

        let mut controller = EmailController::new(factory);
        controller.configure(&config)?;
        controller.open("test").await?;

        Ok(controller)
    }

    fn welcome_message() -> EmailMessage {
        EmailMessage {
            subject: Some(MessageTemplate::from([
                ("en", "Welcome, {{name}}"),
                ("fr", "Bienvenue, {{name}}"),
            ])),
            text: Some(MessageTemplate::from("Regards, {{signature}}")),
            ..Default::default()
        }
    }

    fn recipient(email: &str, name: &str, language: Option<&str>) -> EmailRecipient {
        EmailRecipient {
            name: Some(name.to_string()),
            language: language.map(str::to_string),
            ..EmailRecipient::new(email)
        }
    }

    #[test]
    fn test_configure_reads_message_defaults() -> TestResult {
        let mut controller = EmailController::new(MockMailerFactory::new());

        controller.configure(&config(&[("message.reply_to", "support@example.com")]))?;

        let settings = controller.settings();
        assert_eq!(settings.from.as_deref(), Some("noreply@example.com"));
        assert_eq!(settings.cc.as_deref(), Some("audit@example.com"));
        assert_eq!(settings.bcc, None);
        assert_eq!(settings.reply_to.as_deref(), Some("support@example.com"));
        assert_eq!(settings.parameters.get("signature"), Some(&json!("The Team")));
        assert!(!settings.disabled);

        controller.configure(&ConfigParams::from_tuples([("options.disabled", "true")]))?;

        let settings = controller.settings();
        assert_eq!(settings.from.as_deref(), Some("noreply@example.com"));
        assert!(settings.parameters.is_empty());
        assert!(settings.disabled);

        Ok(())
    }

    #[tokio::test]
    async fn test_open_is_idempotent() -> TestResult {
        let mut factory = MockMailerFactory::new();
        factory
            .expect_create()
            .withf(|connection, credential| {
                connection.host == "smtp.example.com"
                    && connection.port == Some(2525)
                    && !connection.secure
                    && credential.as_ref().map(|c| c.username.as_str()) == Some("mailer")
            })
            .times(1)
            .returning(|_, _| Ok(MockMailer::new()));

        let mut controller = EmailController::new(factory);
        controller.configure(&config(&[("credential.username", "mailer")]))?;

        assert!(!controller.is_open().await);

        controller.open("test").await?;
        controller.open("test").await?;

        assert!(controller.is_open().await);

        controller.close("test").await;

        assert!(!controller.is_open().await);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_opens_create_one_transport() -> TestResult {
        let mut factory = MockMailerFactory::new();
        factory.expect_create().times(1).returning(|_, _| {
            std::thread::sleep(std::time::Duration::from_millis(50));
            Ok(MockMailer::new())
        });

        let mut controller = EmailController::new(factory);
        controller.configure(&config(&[]))?;

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.open("first").await }
        });
        let second = tokio::spawn({
            let controller = controller.clone();
            async move { controller.open("second").await }
        });

        let (first, second) = tokio::join!(first, second);
        first??;
        second??;

        assert!(controller.is_open().await);

        Ok(())
    }

    #[tokio::test]
    async fn test_open_without_connection_stays_closed() -> TestResult {
        let mut factory = MockMailerFactory::new();
        factory.expect_create().times(0);

        let mut controller = EmailController::new(factory);
        controller.configure(&ConfigParams::from_tuples([(
            "message.from",
            "noreply@example.com",
        )]))?;

        controller.open("test").await?;

        assert!(!controller.is_open().await);

        Ok(())
    }

    #[tokio::test]
    async fn test_open_propagates_resolution_errors() -> TestResult {
        let mut factory = MockMailerFactory::new();
        factory.expect_create().times(0);

        let mut controller = EmailController::new(factory);
        controller.configure(&config(&[("connection.port", "not-a-port")]))?;

        let result = controller.open("test").await;

        assert!(matches!(result, Err(EmailError::Config(_))));
        assert!(!controller.is_open().await);

        Ok(())
    }

    #[tokio::test]
    async fn test_open_propagates_factory_errors() -> TestResult {
        let mut factory = MockMailerFactory::new();
        factory
            .expect_create()
            .returning(|_, _| Err(MailerError::TransportError("unreachable".to_string())));

        let mut controller = EmailController::new(factory);
        controller.configure(&config(&[]))?;

        let result = controller.open("test").await;

        assert!(matches!(result, Err(EmailError::Mailer(_))));

        Ok(())
    }

    #[tokio::test]
    async fn test_disabled_controller_skips_silently() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(0);

        let controller = open_controller(config(&[("options.disabled", "true")]), mailer).await?;

        let message = EmailMessage {
            to: Some("user@example.com".to_string()),
            ..welcome_message()
        };

        controller
            .send_message("test", &message, &TemplateParameters::new())
            .await?;
        controller
            .send_message_to_recipient(
                "test",
                &EmailRecipient::default(),
                &message,
                &TemplateParameters::new(),
            )
            .await?;
        controller
            .send_message_to_recipients("test", &[], &message, &TemplateParameters::new())
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_disabled_controller_does_not_need_transport() -> TestResult {
        let mut controller = EmailController::new(MockMailerFactory::new());
        controller.configure(&ConfigParams::from_tuples([("options.disabled", "yes")]))?;

        controller
            .send_message("test", &welcome_message(), &TemplateParameters::new())
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_send_message_requires_open_transport() -> TestResult {
        let mut controller = EmailController::new(MockMailerFactory::new());
        controller.configure(&config(&[]))?;

        let message = EmailMessage {
            to: Some("user@example.com".to_string()),
            ..welcome_message()
        };

        let result = controller
            .send_message("corr-1", &message, &TemplateParameters::new())
            .await;

        let err = result.expect_err("sending without a transport must fail");

        assert_eq!(err.code(), Some("EMAIL_DISABLED"));
        assert_eq!(err.to_string(), "emails disabled, or email recipient not set");
        assert!(matches!(
            err,
            EmailError::Disabled { correlation_id, .. } if correlation_id == "corr-1"
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_send_message_requires_destination() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(0);

        let controller = open_controller(config(&[]), mailer).await?;

        let result = controller
            .send_message("test", &welcome_message(), &TemplateParameters::new())
            .await;

        assert!(matches!(result, Err(EmailError::Disabled { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_send_message_renders_in_default_language() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|envelope| {
                envelope
                    == &Envelope {
                        from: Some("noreply@example.com".to_string()),
                        to: "user@example.com".to_string(),
                        cc: Some("team@example.com".to_string()),
                        bcc: None,
                        reply_to: None,
                        subject: Some("Welcome, Jane".to_string()),
                        text: Some("Regards, The Team".to_string()),
                        html: None,
                    }
            })
            .times(1)
            .returning(|_| Ok(()));

        let controller = open_controller(config(&[]), mailer).await?;

        let message = EmailMessage {
            to: Some("user@example.com".to_string()),
            cc: Some("team@example.com".to_string()),
            ..welcome_message()
        };

        let mut parameters = TemplateParameters::new();
        parameters.insert("name", "Jane");

        controller
            .send_message("test", &message, &parameters)
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_send_message_surfaces_template_errors() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(0);

        let controller = open_controller(config(&[]), mailer).await?;

        let message = EmailMessage {
            to: Some("user@example.com".to_string()),
            html: Some(MessageTemplate::from("{{#each items}}")),
            ..Default::default()
        };

        let result = controller
            .send_message("test", &message, &TemplateParameters::new())
            .await;

        assert!(matches!(result, Err(EmailError::Template(_))));

        Ok(())
    }

    #[tokio::test]
    async fn test_send_message_surfaces_transport_errors() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .returning(|_| Err(MailerError::SendError("connection reset".to_string())));

        let controller = open_controller(config(&[]), mailer).await?;

        let message = EmailMessage {
            to: Some("user@example.com".to_string()),
            ..welcome_message()
        };

        let result = controller
            .send_message("test", &message, &TemplateParameters::new())
            .await;

        assert!(matches!(result, Err(EmailError::Mailer(_))));

        Ok(())
    }

    #[tokio::test]
    async fn test_send_to_recipient_uses_recipient_language() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|envelope| {
                envelope.to == "marie@example.com"
                    && envelope.subject.as_deref() == Some("Bienvenue, Marie")
                    && envelope.cc.as_deref() == Some("audit@example.com")
            })
            .times(1)
            .returning(|_| Ok(()));

        let controller = open_controller(config(&[]), mailer).await?;

        controller
            .send_message_to_recipient(
                "test",
                &recipient("marie@example.com", "Marie", Some("fr")),
                &welcome_message(),
                &TemplateParameters::new(),
            )
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_send_to_recipient_falls_back_to_english() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|envelope| envelope.subject.as_deref() == Some("Welcome, Hans"))
            .times(1)
            .returning(|_| Ok(()));

        let controller = open_controller(config(&[]), mailer).await?;

        controller
            .send_message_to_recipient(
                "test",
                &recipient("hans@example.com", "Hans", Some("de")),
                &welcome_message(),
                &TemplateParameters::new(),
            )
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_recipient_fields_override_parameters() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|envelope| {
                envelope.text.as_deref() == Some("Jane / pro / Support / The Team")
            })
            .times(1)
            .returning(|_| Ok(()));

        let controller = open_controller(config(&[]), mailer).await?;

        let message = EmailMessage {
            text: Some(MessageTemplate::from(
                "{{name}} / {{plan}} / {{team}} / {{signature}}",
            )),
            ..Default::default()
        };

        let mut recipient = recipient("jane@example.com", "Jane", None);
        recipient.extra.insert("plan".to_string(), json!("pro"));

        let mut parameters = TemplateParameters::new();
        parameters.insert("name", "caller");
        parameters.insert("plan", "free");
        parameters.insert("team", "Support");

        controller
            .send_message_to_recipient("test", &recipient, &message, &parameters)
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_send_to_recipient_requires_email() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(0);

        let controller = open_controller(config(&[]), mailer).await?;

        let result = controller
            .send_message_to_recipient(
                "test",
                &EmailRecipient {
                    name: Some("Nobody".to_string()),
                    ..Default::default()
                },
                &welcome_message(),
                &TemplateParameters::new(),
            )
            .await;

        assert!(matches!(result, Err(EmailError::Disabled { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_send_to_recipients_requires_recipients() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(0);

        let controller = open_controller(config(&[]), mailer).await?;

        let result = controller
            .send_message_to_recipients("test", &[], &welcome_message(), &TemplateParameters::new())
            .await;

        assert!(matches!(result, Err(EmailError::Disabled { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_send_to_recipients_requires_open_transport() -> TestResult {
        let mut controller = EmailController::new(MockMailerFactory::new());
        controller.configure(&config(&[]))?;

        let result = controller
            .send_message_to_recipients(
                "test",
                &[recipient("jane@example.com", "Jane", None)],
                &welcome_message(),
                &TemplateParameters::new(),
            )
            .await;

        assert!(matches!(result, Err(EmailError::Disabled { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_send_to_recipients_sends_one_message_each() -> TestResult {
        let sent = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&sent);

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(3)
            .returning(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        let controller = open_controller(config(&[]), mailer).await?;

        let recipients = [
            recipient("a@example.com", "A", Some("en")),
            recipient("b@example.com", "B", Some("fr")),
            recipient("c@example.com", "C", None),
        ];

        controller
            .send_message_to_recipients(
                "test",
                &recipients,
                &welcome_message(),
                &TemplateParameters::new(),
            )
            .await?;

        assert_eq!(sent.load(Ordering::SeqCst), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_send_to_recipients_reports_failure() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer.expect_send().returning(|envelope| {
            if envelope.to == "bad@example.com" {
                Err(MailerError::InvalidEmail(envelope.to))
            } else {
                Ok(())
            }
        });

        let controller = open_controller(config(&[]), mailer).await?;

        let recipients = [
            recipient("good@example.com", "Good", None),
            recipient("bad@example.com", "Bad", None),
        ];

        let result = controller
            .send_message_to_recipients(
                "test",
                &recipients,
                &welcome_message(),
                &TemplateParameters::new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(EmailError::Mailer(MailerError::InvalidEmail(_)))
        ));

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_send_to_recipients_leaves_pending_sends_running() -> TestResult {
        let (release, released) = std::sync::mpsc::channel::<()>();
        let (finished, mut slow_finished) = tokio::sync::mpsc::unbounded_channel::<String>();

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|envelope| envelope.to == "bad@example.com")
            .times(1)
            .returning(|envelope| Err(MailerError::InvalidEmail(envelope.to)));
        mailer
            .expect_send()
            .withf(|envelope| envelope.to == "slow@example.com")
            .times(1)
            .returning(move |envelope| {
                released.recv().ok();
                finished.send(envelope.to).ok();
                Ok(())
            });

        let controller = open_controller(config(&[]), mailer).await?;

        let recipients = [
            recipient("slow@example.com", "Slow", None),
            recipient("bad@example.com", "Bad", None),
        ];

        let result = controller
            .send_message_to_recipients(
                "test",
                &recipients,
                &welcome_message(),
                &TemplateParameters::new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(EmailError::Mailer(MailerError::InvalidEmail(_)))
        ));
        assert!(slow_finished.try_recv().is_err());

        release.send(())?;

        let delivered =
            tokio::time::timeout(std::time::Duration::from_secs(5), slow_finished.recv()).await?;

        assert_eq!(delivered.as_deref(), Some("slow@example.com"));

        Ok(())
    }

    #[tokio::test]
    async fn test_send_to_recipients_reports_missing_address() -> TestResult {
        let mut mailer = MockMailer::new();
        mailer.expect_send().returning(|_| Ok(()));

        let controller = open_controller(config(&[]), mailer).await?;

        let recipients = [
            recipient("good@example.com", "Good", None),
            EmailRecipient::default(),
        ];

        let result = controller
            .send_message_to_recipients(
                "test",
                &recipients,
                &welcome_message(),
                &TemplateParameters::new(),
            )
            .await;

        assert!(matches!(result, Err(EmailError::Disabled { .. })));

        Ok(())
    }
}
