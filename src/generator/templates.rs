//! Template environment shared by all emitters.
//!
//! Templates are compiled into the binary and parsed once per
//! [`TemplateCache`], on first use. The cache is an ordinary value owned by
//! the build orchestrator; dropping it drops the parsed templates.

use super::ArtifactKind;
use crate::error::GenError;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use once_cell::unsync::OnceCell;
use serde::Serialize;
use serde_json::Value;

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        ArtifactKind::Router.template_name(),
        include_str!("../../templates/router.rs.jinja"),
    ),
    (
        ArtifactKind::Cli.template_name(),
        include_str!("../../templates/cli.rs.jinja"),
    ),
    (
        ArtifactKind::ScriptingClient.template_name(),
        include_str!("../../templates/client.py.jinja"),
    ),
];

/// Rust string literal for `s`.
fn rust_str(s: String) -> String {
    format!("{s:?}")
}

/// Python string literal for `s`. JSON string syntax is valid Python.
fn py_str(s: String) -> String {
    Value::String(s).to_string()
}

/// Lazily-initialised, read-only template environment.
pub struct TemplateCache {
    env: OnceCell<Environment<'static>>,
    overrides: Vec<(&'static str, &'static str)>,
}

impl TemplateCache {
    pub fn new() -> Self {
        TemplateCache {
            env: OnceCell::new(),
            overrides: Vec::new(),
        }
    }

    /// Replace a built-in template's source before first use.
    pub fn with_override(mut self, name: &'static str, source: &'static str) -> Self {
        self.overrides.push((name, source));
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.env.get().is_some()
    }

    fn environment(&self) -> Result<&Environment<'static>, minijinja::Error> {
        self.env.get_or_try_init(|| {
            let mut env = Environment::new();
            env.set_auto_escape_callback(|_| AutoEscape::None);
            env.set_undefined_behavior(UndefinedBehavior::Strict);
            env.set_trim_blocks(true);
            env.set_lstrip_blocks(true);
            env.set_keep_trailing_newline(true);
            env.add_filter("rust_str", rust_str);
            env.add_filter("py_str", py_str);
            for (name, source) in BUILTIN_TEMPLATES {
                let source = self
                    .overrides
                    .iter()
                    .rev()
                    .find(|(n, _)| n == name)
                    .map(|(_, s)| *s)
                    .unwrap_or(*source);
                env.add_template(*name, source)?;
            }
            Ok(env)
        })
    }

    /// Render `kind`'s template with `ctx`.
    pub fn render<S: Serialize>(&self, kind: ArtifactKind, ctx: S) -> Result<String, GenError> {
        let env = self
            .environment()
            .map_err(|e| GenError::render(kind.as_str(), format!("{e:#}")))?;
        env.get_template(kind.template_name())
            .and_then(|t| t.render(ctx))
            .map_err(|e| GenError::render(kind.as_str(), format!("{e:#}")))
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_environment_is_built_lazily() {
        let cache = TemplateCache::new();
        assert!(!cache.is_initialized());
        let _ = cache.render(ArtifactKind::Router, json!({}));
        assert!(cache.is_initialized());
    }

    #[test]
    fn test_override_and_string_filters() {
        let cache = TemplateCache::new().with_override(
            ArtifactKind::Router.template_name(),
            "{{ a | rust_str }} {{ a | py_str }}",
        );
        let out = cache.render(ArtifactKind::Router, json!({"a": "say \"hi\""})).unwrap();
        assert_eq!(out, r#""say \"hi\"" "say \"hi\"""#);
    }

    #[test]
    fn test_missing_variable_is_a_render_error() {
        let cache = TemplateCache::new()
            .with_override(ArtifactKind::Cli.template_name(), "{{ nope.field }}");
        let err = cache.render(ArtifactKind::Cli, json!({})).unwrap_err();
        assert_eq!(err.kind(), "TemplateRenderError");
    }
}
