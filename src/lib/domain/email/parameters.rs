//! Template parameters

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::config::ConfigParams;

/// Variables substituted into message templates
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateParameters(Map<String, Value>);

impl TemplateParameters {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build parameters from a configuration section.
    ///
    /// Dotted keys become nested objects, so `client.name` is reachable as
    /// `{{client.name}}`.
    pub fn from_config(config: &ConfigParams) -> Self {
        let mut params = Self::new();

        for (key, value) in config.iter() {
            params.insert_path(key, Value::String(value.to_string()));
        }

        params
    }

    /// Set a single top-level variable
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    fn insert_path(&mut self, path: &str, value: Value) {
        let mut segments: Vec<&str> = path.split('.').collect();
        let Some(last) = segments.pop() else {
            return;
        };

        let mut current = &mut self.0;
        for segment in segments {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));

            if !entry.is_object() {
                warn!(
                    parameter = path,
                    replaced = %entry,
                    "parameter value replaced by nested parameters"
                );
                *entry = Value::Object(Map::new());
            }

            current = match entry {
                Value::Object(map) => map,
                _ => return,
            };
        }

        current.insert(last.to_string(), value);
    }

    /// Returns a copy of these parameters with every key in `other` taking
    /// precedence.
    pub fn override_with(&self, other: &TemplateParameters) -> Self {
        self.override_with_map(&other.0)
    }

    /// Same as [`Self::override_with`] for a raw JSON object
    pub fn override_with_map(&self, other: &Map<String, Value>) -> Self {
        let mut merged = self.0.clone();
        merged.extend(other.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(merged)
    }

    /// Returns the variable named `key`
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether there are no variables
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
