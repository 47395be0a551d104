//! Mustache-style template rendering

use handlebars::Handlebars;

use super::{errors::EmailError, message::MessageTemplate, parameters::TemplateParameters};

/// Renders message templates against [`TemplateParameters`].
///
/// Placeholders use the `{{key}}` syntax; `{{ }}` escapes HTML, `{{{ }}}`
/// does not, and unknown keys render as empty strings.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
}

impl TemplateRenderer {
    /// Create a new renderer
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);

        Self { registry }
    }

    /// Renders `value` for `language`.
    ///
    /// Returns `None` when there is no value, when no template exists for the
    /// language or the default language, or when the template is empty.
    pub fn render(
        &self,
        value: Option<&MessageTemplate>,
        parameters: &TemplateParameters,
        language: &str,
    ) -> Result<Option<String>, EmailError> {
        let Some(template) = value
            .and_then(|v| v.for_language(language))
            .filter(|t| !t.is_empty())
        else {
            return Ok(None);
        };

        Ok(Some(self.registry.render_template(template, parameters)?))
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}
