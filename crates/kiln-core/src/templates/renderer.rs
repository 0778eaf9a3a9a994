//! Handlebars-based renderer for generated project files.
//!
//! Strict mode is always on: a `{{variable}}` missing from the data context is an error
//! rather than an empty string, so a template/context mismatch surfaces as a
//! [`RenderError::Template`] instead of a project that fails to compile later. HTML
//! escaping is disabled because every output is source code.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::RenderError;

/// Template renderer shared by the project renderer and the feature composer.
pub struct TemplateRenderer {
    hbs: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(handlebars::no_escape);
        Self { hbs }
    }

    /// Render a template string with the given data context.
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String, RenderError> {
        self.hbs
            .render_template(template, data)
            .map_err(|e| RenderError::Template(e.to_string()))
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_substitutes_without_escaping() {
        let renderer = TemplateRenderer::new();
        let out = renderer
            .render("const k = {{value}}", &json!({ "value": "#\"aa\" && <b>" }))
            .unwrap();
        assert_eq!(out, "const k = #\"aa\" && <b>");
    }

    #[test]
    fn test_strict_mode_rejects_missing_variable() {
        let renderer = TemplateRenderer::new();
        let err = renderer.render("{{missing}}", &json!({})).unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));
    }
}
