//! Email transports and message defaults

use clap::Parser;

use crate::domain::config::ConfigParams;

pub mod smtp;

/// Message defaults and options
#[derive(Clone, Default, Debug, Parser)]
pub struct EmailConfig {
    /// The default sender address
    #[clap(long = "message-from", env = "EMAIL_FROM")]
    pub from: Option<String>,

    /// The default carbon-copy addresses
    #[clap(long = "message-cc", env = "EMAIL_CC")]
    pub cc: Option<String>,

    /// The default blind carbon-copy addresses
    #[clap(long = "message-bcc", env = "EMAIL_BCC")]
    pub bcc: Option<String>,

    /// The default reply-to address
    #[clap(long = "message-reply-to", env = "EMAIL_REPLY_TO")]
    pub reply_to: Option<String>,

    /// Accept messages without sending them
    #[clap(long = "disabled", env = "EMAIL_DISABLED")]
    pub disabled: bool,

    /// Default template variables as `key=value`
    #[clap(
        long = "parameter",
        env = "EMAIL_PARAMETERS",
        value_delimiter = ',',
        value_parser = parse_key_value
    )]
    pub parameters: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got \"{raw}\""))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in \"{raw}\""));
    }

    Ok((key.to_string(), value.trim().to_string()))
}

impl From<&EmailConfig> for ConfigParams {
    fn from(email: &EmailConfig) -> Self {
        let mut config = ConfigParams::new();

        let defaults = [
            ("message.from", &email.from),
            ("message.cc", &email.cc),
            ("message.bcc", &email.bcc),
            ("message.reply_to", &email.reply_to),
        ];

        for (key, value) in defaults {
            if let Some(value) = value {
                config.set(key, value);
            }
        }

        config.set("options.disabled", email.disabled.to_string());

        for (key, value) in &email.parameters {
            config.set(format!("parameters.{key}"), value);
        }

        config
    }
}
