//! Router emitter.
//!
//! The generated file holds a static `ROUTES` table with one line per
//! operation:
//!
//! ```text
//! Route { method: "GET", path: "/sessions", operation_id: "listSessions", handler: HandlerRef::Bound { .. } },
//! ```
//!
//! An operation whose bound handler file is missing is routed to a
//! generated `stub_<operation>` function returning `501`, so the router
//! still compiles.

use super::cli_client::one_line;
use super::{ArtifactKind, GeneratedNames, TemplateCache};
use crate::error::GenError;
use crate::spec::{HttpMethod, RouteEntry, UnifiedSpecification};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static ROUTE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^\s*Route \{ method: "([A-Z]+)", path: "((?:[^"\\]|\\.)*)", operation_id: "((?:[^"\\]|\\.)*)""#,
    )
    .expect("route line regex should be valid")
});

#[derive(Serialize)]
struct RouterContext {
    title: String,
    version: String,
    routes: Vec<RouteView>,
    stubs: Vec<StubView>,
}

#[derive(Serialize)]
struct RouteView {
    method: &'static str,
    path: String,
    operation_id: String,
    /// Rust expression for the `handler` field
    handler: String,
}

#[derive(Serialize)]
struct StubView {
    stub_fn: String,
    operation_id: String,
    method: &'static str,
    path: String,
    file: String,
}

fn display_path(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn handler_expression(route: &RouteEntry, names: &GeneratedNames) -> String {
    match &route.handler {
        _ if route.stub => format!("HandlerRef::Stub({})", names.router_stub),
        Some(binding) => format!(
            "HandlerRef::Bound {{ file: {:?}, function: {:?} }}",
            display_path(&binding.file),
            binding.function
        ),
        None => "HandlerRef::Unbound".to_string(),
    }
}

pub fn render_router(
    cache: &TemplateCache,
    spec: &UnifiedSpecification,
    routes: &[RouteEntry],
) -> Result<String, GenError> {
    let mut views = Vec::with_capacity(routes.len());
    let mut stubs = Vec::new();
    for route in routes {
        let names = GeneratedNames::for_operation(&route.operation_id);
        views.push(RouteView {
            method: route.method.as_str(),
            path: route.path.clone(),
            operation_id: route.operation_id.clone(),
            handler: handler_expression(route, &names),
        });
        if route.stub {
            stubs.push(StubView {
                stub_fn: names.router_stub,
                operation_id: route.operation_id.clone(),
                method: route.method.as_str(),
                path: route.path.clone(),
                file: route
                    .handler
                    .as_ref()
                    .map(|b| display_path(&b.file))
                    .unwrap_or_default(),
            });
        }
    }
    cache.render(
        ArtifactKind::Router,
        RouterContext {
            title: one_line(&spec.info.title),
            version: one_line(&spec.info.version),
            routes: views,
            stubs,
        },
    )
}

fn unescape_rust(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = chars
                    .by_ref()
                    .skip_while(|c| *c == '{')
                    .take_while(|c| *c != '}')
                    .collect();
                if let Some(ch) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    out.push(ch);
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Recover `(method, path, operationId)` for every route line in generated
/// router source, in file order.
pub fn parse_route_table(source: &str) -> Vec<(HttpMethod, String, String)> {
    ROUTE_LINE
        .captures_iter(source)
        .filter_map(|caps| {
            Some((
                HttpMethod::parse(&caps[1])?,
                unescape_rust(&caps[2]),
                unescape_rust(&caps[3]),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{
        build_route_table, merge_fragments, CollisionPolicy, FragmentOrigin, OperationKey,
        SchemaFragment,
    };
    use serde_json::json;
    use std::collections::BTreeSet;

    fn sample_spec() -> UnifiedSpecification {
        let fragment = SchemaFragment::new(
            "core",
            "core.yaml",
            FragmentOrigin::HandWritten,
            json!({
                "info": {"title": "Scenes", "version": "1.2.0"},
                "paths": {
                    "/sessions": {
                        "get": {"operationId": "listSessions", "x-handler-file": "api/sessions/list.go"},
                        "post": {"operationId": "createSession", "x-handler-file": "api/sessions/create.go"}
                    },
                    "/sessions/{id}": {
                        "get": {"operationId": "getSession"}
                    }
                }
            }),
        );
        merge_fragments(&[fragment], CollisionPolicy::default()).spec
    }

    #[test]
    fn test_render_router_round_trip() {
        let spec = sample_spec();
        let mut stubs = BTreeSet::new();
        stubs.insert(OperationKey {
            path: "/sessions".into(),
            method: HttpMethod::Post,
        });
        let routes = build_route_table(&spec, &stubs);
        let out = render_router(&TemplateCache::new(), &spec, &routes).unwrap();

        assert!(out.contains("HandlerRef::Bound { file: \"api/sessions/list.go\", function: \"list_sessions\" }"));
        assert!(out.contains("HandlerRef::Stub(stub_create_session)"));
        assert!(out.contains("pub fn stub_create_session() -> StubResponse"));
        assert!(out.contains("HandlerRef::Unbound"));

        let parsed = parse_route_table(&out);
        assert_eq!(
            parsed,
            vec![
                (HttpMethod::Get, "/sessions".to_string(), "listSessions".to_string()),
                (HttpMethod::Post, "/sessions".to_string(), "createSession".to_string()),
                (HttpMethod::Get, "/sessions/{id}".to_string(), "getSession".to_string()),
            ]
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let spec = sample_spec();
        let routes = build_route_table(&spec, &BTreeSet::new());
        let a = render_router(&TemplateCache::new(), &spec, &routes).unwrap();
        let b = render_router(&TemplateCache::new(), &spec, &routes).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unescape_rust() {
        assert_eq!(unescape_rust(r#"a\"b\\c"#), "a\"b\\c");
        assert_eq!(unescape_rust(r"\u{e9}t\u{e9}"), "été");
    }
}
