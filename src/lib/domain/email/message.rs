//! Email messages and recipients

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The language used when none is requested
pub const DEFAULT_LANGUAGE: &str = "en";

/// A message field which is either a single template or one template per
/// language code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageTemplate {
    /// The same template for every language
    Plain(String),

    /// Templates keyed by language code, e.g. `en`, `fr`
    Localized(HashMap<String, String>),
}

impl MessageTemplate {
    /// Picks the template for `language`, falling back to
    /// [`DEFAULT_LANGUAGE`]. A plain template is returned as-is.
    pub fn for_language(&self, language: &str) -> Option<&str> {
        match self {
            Self::Plain(template) => Some(template),
            Self::Localized(templates) => templates
                .get(language)
                .or_else(|| templates.get(DEFAULT_LANGUAGE))
                .map(String::as_str),
        }
    }
}

impl From<&str> for MessageTemplate {
    fn from(template: &str) -> Self {
        Self::Plain(template.to_string())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for MessageTemplate {
    fn from(templates: [(&str, &str); N]) -> Self {
        Self::Localized(
            templates
                .into_iter()
                .map(|(lang, template)| (lang.to_string(), template.to_string()))
                .collect(),
        )
    }
}

/// An email message to send
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Sender address; the configured default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Carbon-copy addresses, comma separated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,

    /// Blind carbon-copy addresses, comma separated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcc: Option<String>,

    /// Destination addresses, comma separated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    /// Reply-to address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,

    /// Subject template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<MessageTemplate>,

    /// Plain text body template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<MessageTemplate>,

    /// HTML body template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<MessageTemplate>,
}

/// A single recipient of a message.
///
/// Every field, including unknown ones, is available to the templates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailRecipient {
    /// Recipient identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Destination address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Preferred language code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Additional template variables
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmailRecipient {
    /// Create a recipient for `email`
    pub fn new(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
            ..Default::default()
        }
    }

    /// The language templates are rendered in
    pub fn language(&self) -> &str {
        self.language
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    /// All of the recipient's fields as template variables
    pub fn to_variables(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
