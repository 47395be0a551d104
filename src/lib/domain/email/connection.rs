//! SMTP connection and credential parameters

use std::fmt;

use crate::domain::config::{ConfigError, ConfigParams};

/// Where to reach the SMTP server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Server host name
    pub host: String,

    /// Server port; the transport picks a default when absent
    pub port: Option<u16>,

    /// Use implicit TLS from the first byte
    pub secure: bool,
}

impl ConnectionParams {
    /// Resolves the connection from the `connection.*` keys.
    ///
    /// Returns `Ok(None)` when no connection is configured.
    pub fn resolve(config: &ConfigParams) -> Result<Option<Self>, ConfigError> {
        let section = config.section("connection");
        if section.is_empty() {
            return Ok(None);
        }

        let host = section
            .get_as_string("host")
            .ok_or_else(|| ConfigError::MissingKey("connection.host".to_string()))?;

        let port = config.get_as_u16("connection.port")?;

        let mut secure = false;
        for key in ["ssl", "secure", "secure_connection"] {
            secure |= config
                .get_as_bool(&format!("connection.{key}"))?
                .unwrap_or(false);
        }

        Ok(Some(Self { host, port, secure }))
    }
}

/// How to authenticate with the SMTP server
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialParams {
    /// SASL mechanism name, e.g. `login` or `plain`
    pub auth_type: Option<String>,

    /// User name
    pub username: String,

    /// Password
    pub password: String,
}

impl CredentialParams {
    /// Looks up credentials from the `credential.*` keys.
    ///
    /// Returns `Ok(None)` when no user name is configured.
    pub fn lookup(config: &ConfigParams) -> Result<Option<Self>, ConfigError> {
        let section = config.section("credential");

        let Some(username) = section.get_as_string("username") else {
            return Ok(None);
        };

        Ok(Some(Self {
            auth_type: section.get_as_string("type"),
            username,
            password: section.get("password").unwrap_or_default().to_string(),
        }))
    }
}

impl fmt::Debug for CredentialParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialParams")
            .field("auth_type", &self.auth_type)
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}
