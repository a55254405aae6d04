//! CLI-client emitter.
//!
//! Emits a clap-derive command line with one subcommand per operation. The
//! subcommand name is the kebab-case `operationId`; its positional arity is
//! the number of path parameters plus one when a request body is required.

use super::naming::{cli_field_ident, to_kebab_case, to_snake_case};
use super::{ArtifactKind, GeneratedNames, TemplateCache};
use crate::error::GenError;
use crate::spec::{RouteEntry, UnifiedSpecification};
use serde::Serialize;

#[derive(Serialize)]
struct CliContext {
    title: String,
    version: String,
    bin_name: String,
    about: String,
    base_url_env: String,
    commands: Vec<CommandView>,
}

#[derive(Serialize)]
struct CommandView {
    name: String,
    variant: String,
    operation_id: String,
    method: &'static str,
    path: String,
    about: String,
    arity: usize,
    fields: Vec<FieldView>,
    path_fields: Vec<PathFieldView>,
    body_field: Option<BodyView>,
}

#[derive(Serialize)]
struct FieldView {
    ident: String,
    /// `path`, `body` or `optional-body`
    kind: &'static str,
}

#[derive(Serialize)]
struct PathFieldView {
    ident: String,
    placeholder: String,
}

#[derive(Serialize)]
struct BodyView {
    ident: String,
    /// Expression yielding `Option<&str>`
    expr: String,
}

/// Collapse a summary into a single doc-comment line.
pub(crate) fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn command_view(route: &RouteEntry) -> CommandView {
    let names = GeneratedNames::for_operation(&route.operation_id);
    let mut fields = Vec::new();
    let mut path_fields = Vec::new();
    for param in &route.path_params {
        let ident = cli_field_ident(param);
        fields.push(FieldView {
            ident: ident.clone(),
            kind: "path",
        });
        path_fields.push(PathFieldView {
            ident,
            placeholder: format!("{{{param}}}"),
        });
    }

    let body_field = route.request_body.as_ref().map(|body| {
        let ident = ["body", "payload", "request_body"]
            .into_iter()
            .find(|candidate| fields.iter().all(|f| f.ident != *candidate))
            .unwrap_or("request_body_")
            .to_string();
        let (kind, expr) = if body.required {
            ("body", format!("Some({ident}.as_str())"))
        } else {
            ("optional-body", format!("{ident}.as_deref()"))
        };
        fields.push(FieldView {
            ident: ident.clone(),
            kind,
        });
        BodyView { ident, expr }
    });

    CommandView {
        name: names.subcommand,
        variant: names.cli_variant,
        operation_id: route.operation_id.clone(),
        method: route.method.as_str(),
        path: route.path.clone(),
        about: route
            .summary
            .as_deref()
            .map(one_line)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("{} {}", route.method, route.path)),
        arity: route.arity(),
        fields,
        path_fields,
        body_field,
    }
}

pub fn render_cli(
    cache: &TemplateCache,
    spec: &UnifiedSpecification,
    routes: &[RouteEntry],
) -> Result<String, GenError> {
    let base = Some(to_kebab_case(&spec.info.title))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "api".to_string());
    let ctx = CliContext {
        title: one_line(&spec.info.title),
        version: one_line(&spec.info.version),
        bin_name: format!("{base}-cli"),
        about: spec
            .info
            .description
            .as_deref()
            .map(one_line)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                format!("Command-line client for {}", one_line(&spec.info.title))
            }),
        base_url_env: format!("{}_BASE_URL", to_snake_case(&base).to_ascii_uppercase()),
        commands: routes.iter().map(command_view).collect(),
    };
    cache.render(ArtifactKind::Cli, ctx)
}
