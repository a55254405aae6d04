//! Deterministic identifier transforms.
//!
//! Every generated name is a pure function of an `operationId`: the CLI
//! subcommand (kebab-case), the scripting-client method (camelCase) and the
//! router stub function (snake_case). Words are split on `_`, `-`, spaces and
//! other punctuation, and on case boundaries (`listSessions`,
//! `HTTPServer` → `HTTP` + `Server`).

use crate::error::GenError;
use crate::spec::RouteEntry;
use std::collections::BTreeMap;

/// Split an identifier into lower-cased words.
pub fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// `listSessions` → `list-sessions`
pub fn to_kebab_case(s: &str) -> String {
    split_words(s).join("-")
}

/// `listSessions` → `list_sessions`
pub fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

/// `list_sessions` → `listSessions`
pub fn to_camel_case(s: &str) -> String {
    let words = split_words(s);
    let mut out = String::new();
    for (i, w) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(w);
        } else {
            out.push_str(&capitalize(w));
        }
    }
    out
}

/// `list_sessions` → `ListSessions`
pub fn to_pascal_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize(w)).collect()
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if",
    "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "static",
    "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async", "await", "dyn",
];

/// Keywords that cannot be raw identifiers.
const RUST_RESERVED: &[&str] = &["crate", "self", "Self", "super", "_"];

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield", "self",
];

fn leading_digit(name: &str) -> bool {
    name.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true)
}

/// Make `name` usable as a Rust identifier.
pub fn rust_identifier(name: &str) -> String {
    if leading_digit(name) {
        format!("_{name}")
    } else if RUST_RESERVED.contains(&name) {
        format!("{name}_")
    } else if RUST_KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Field name a path parameter gets in a generated clap command. `help`
/// is taken by clap's own flag.
pub fn cli_field_ident(param: &str) -> String {
    let ident = rust_identifier(&to_snake_case(param));
    if ident == "help" {
        format!("{ident}_")
    } else {
        ident
    }
}

/// Argument name a path parameter gets in a generated client method.
/// `payload` is taken by the request body.
pub fn client_arg_ident(param: &str) -> String {
    let ident = python_identifier(&to_snake_case(param));
    if ident == "payload" {
        format!("{ident}_")
    } else {
        ident
    }
}

/// Make `name` usable as a Python identifier.
pub fn python_identifier(name: &str) -> String {
    if leading_digit(name) {
        format!("_{name}")
    } else if PYTHON_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}

/// Names every emitter derives from one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedNames {
    pub subcommand: String,
    /// `Command` enum variant in the CLI client
    pub cli_variant: String,
    pub client_method: String,
    pub router_stub: String,
}

impl GeneratedNames {
    pub fn for_operation(operation_id: &str) -> Self {
        GeneratedNames {
            subcommand: to_kebab_case(operation_id),
            cli_variant: rust_identifier(&to_pascal_case(operation_id)),
            client_method: python_identifier(&to_camel_case(operation_id)),
            router_stub: format!("stub_{}", to_snake_case(operation_id)),
        }
    }
}

/// One [`GenError::GeneratedNameCollision`] per generated name produced by
/// more than one source.
pub fn check_generated_names(
    artifact: &str,
    names: impl IntoIterator<Item = (String, impl Into<String>)>,
) -> Vec<GenError> {
    let mut owners: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, source) in names {
        owners.entry(name).or_default().push(source.into());
    }
    owners
        .into_iter()
        .filter(|(_, sources)| sources.len() > 1)
        .map(|(name, mut sources)| {
            sources.sort();
            GenError::GeneratedNameCollision {
                artifact: artifact.to_string(),
                name,
                sources,
            }
        })
        .collect()
}

/// Per-operation check of the identifiers path parameters become in the
/// CLI client (struct fields) and the scripting client (arguments).
pub fn check_parameter_identifiers(routes: &[RouteEntry]) -> Vec<GenError> {
    let mut errors = Vec::new();
    for route in routes {
        let params = || route.path_params.iter().map(|p| format!("path parameter '{p}'"));
        errors.extend(check_generated_names(
            &format!("cli argument of {}", route.operation_id),
            route.path_params.iter().map(|p| cli_field_ident(p)).zip(params()),
        ));
        errors.extend(check_generated_names(
            &format!("client argument of {}", route.operation_id),
            route.path_params.iter().map(|p| client_arg_ident(p)).zip(params()),
        ));
    }
    errors
}

/// Check all three name families over a set of operation IDs.
pub fn check_all_generated_names<'a>(
    operation_ids: impl IntoIterator<Item = &'a str>,
) -> Vec<GenError> {
    let names: Vec<(&str, GeneratedNames)> = operation_ids
        .into_iter()
        .map(|id| (id, GeneratedNames::for_operation(id)))
        .collect();
    let mut errors = check_generated_names(
        "cli subcommand",
        names.iter().map(|(id, n)| (n.subcommand.clone(), *id)),
    );
    errors.extend(check_generated_names(
        "cli command variant",
        names.iter().map(|(id, n)| (n.cli_variant.clone(), *id)),
    ));
    errors.extend(check_generated_names(
        "client method",
        names.iter().map(|(id, n)| (n.client_method.clone(), *id)),
    ));
    errors.extend(check_generated_names(
        "router handler",
        names.iter().map(|(id, n)| (n.router_stub.clone(), *id)),
    ));
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        assert_eq!(split_words("listSessions"), vec!["list", "sessions"]);
        assert_eq!(split_words("get_HTTPServer-status"), vec!["get", "http", "server", "status"]);
        assert_eq!(split_words("v2Items"), vec!["v2", "items"]);
        assert_eq!(split_words("  "), Vec::<String>::new());
    }

    #[test]
    fn test_case_transforms() {
        assert_eq!(to_kebab_case("listSessions"), "list-sessions");
        assert_eq!(to_snake_case("listSessions"), "list_sessions");
        assert_eq!(to_camel_case("list_sessions"), "listSessions");
        assert_eq!(to_camel_case("ListSessions"), "listSessions");
        assert_eq!(to_pascal_case("list-sessions"), "ListSessions");
    }

    #[test]
    fn test_transforms_are_stable() {
        let once = to_kebab_case("listSessions");
        assert_eq!(to_kebab_case(&once), once);
        let camel = to_camel_case("listSessions");
        assert_eq!(to_camel_case(&camel), camel);
    }

    #[test]
    fn test_identifier_sanitizing() {
        assert_eq!(rust_identifier("type"), "r#type");
        assert_eq!(rust_identifier("self"), "self_");
        assert_eq!(rust_identifier("1st"), "_1st");
        assert_eq!(python_identifier("class"), "class_");
        assert_eq!(python_identifier("id"), "id");
        assert_eq!(cli_field_ident("help"), "help_");
        assert_eq!(cli_field_ident("sceneId"), "scene_id");
        assert_eq!(client_arg_ident("self"), "self_");
        assert_eq!(client_arg_ident("payload"), "payload_");
    }

    #[test]
    fn test_leading_digit_operation_names_are_valid_identifiers() {
        let names = GeneratedNames::for_operation("2faVerify");
        assert_eq!(names.cli_variant, "_2faVerify");
        assert_eq!(names.client_method, "_2faVerify");
        assert_eq!(names.subcommand, "2fa-verify");
        assert_eq!(names.router_stub, "stub_2fa_verify");
    }

    #[test]
    fn test_parameter_identifier_collisions() {
        let route = RouteEntry {
            method: crate::spec::HttpMethod::Get,
            path: "/things/{thingId}/{thing_id}".into(),
            operation_id: "getThing".into(),
            summary: None,
            path_params: vec!["thingId".into(), "thing_id".into()],
            request_body: None,
            handler: None,
            stub: false,
        };
        let errors = check_parameter_identifiers(&[route]);
        assert_eq!(errors.len(), 2);
        let text = errors[0].to_string();
        assert!(text.contains("cli argument of getThing"), "{text}");
        assert!(text.contains("'thing_id'"), "{text}");
        assert!(text.contains("path parameter 'thingId'"), "{text}");
        assert_eq!(errors[1].kind(), "GeneratedNameCollisionError");
    }

    #[test]
    fn test_collisions_list_every_operation() {
        let errors = check_all_generated_names(["listSessions", "list_sessions", "getSession"]);
        assert_eq!(errors.len(), 4);
        for e in &errors {
            match e {
                GenError::GeneratedNameCollision { sources, .. } => {
                    assert_eq!(
                        sources,
                        &vec!["listSessions".to_string(), "list_sessions".to_string()]
                    );
                }
                other => panic!("unexpected error {other}"),
            }
        }
    }
}
