//! Flat, dotted-key configuration

use std::{collections::BTreeMap, fmt, str::FromStr};

use thiserror::Error;

/// Errors raised while reading configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is missing
    #[error("configuration key \"{0}\" is missing")]
    MissingKey(String),

    /// A value could not be parsed into the expected type
    #[error("configuration key \"{key}\" has an invalid value \"{value}\"")]
    InvalidValue {
        /// The offending key
        key: String,

        /// The raw value
        value: String,
    },
}

/// Configuration parameters keyed by dotted paths such as `message.from`.
///
/// Keys are case-sensitive. Sections are addressed by their prefix, so
/// `parameters.client.name` belongs to the `parameters` section under the key
/// `client.name`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigParams(BTreeMap<String, String>);

impl ConfigParams {
    /// Create empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Build configuration from `(key, value)` pairs
    pub fn from_tuples<K, V>(tuples: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            tuples
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Set a value, replacing any previous one
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Copies every entry of `other`, replacing existing keys
    pub fn append(&mut self, other: &ConfigParams) {
        self.0
            .extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Returns the raw value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns the value for `key`, treating empty strings as absent
    pub fn get_as_string(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Returns the boolean value for `key`.
    ///
    /// Accepts `true`/`false`, `yes`/`no`, `1`/`0` and `on`/`off` in any case.
    pub fn get_as_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        let Some(raw) = self.get_as_string(key) else {
            return Ok(None);
        };

        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(Some(true)),
            "false" | "no" | "0" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        }
    }

    /// Returns the value for `key` parsed as a port number
    pub fn get_as_u16(&self, key: &str) -> Result<Option<u16>, ConfigError> {
        self.get_as_parsed(key)
    }

    fn get_as_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get_as_string(key)
            .map(|raw| {
                raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw,
                })
            })
            .transpose()
    }

    /// Returns every entry under `section.` with the prefix stripped
    pub fn section(&self, section: &str) -> ConfigParams {
        let prefix = format!("{section}.");

        Self(
            self.0
                .iter()
                .filter_map(|(k, v)| {
                    k.strip_prefix(&prefix)
                        .filter(|rest| !rest.is_empty())
                        .map(|rest| (rest.to_string(), v.clone()))
                })
                .collect(),
        )
    }

    /// Whether any key belongs to `section`
    pub fn contains_section(&self, section: &str) -> bool {
        !self.section(section).is_empty()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ConfigParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", entries.join(";"))
    }
}
