//! Scripting-client emitter (Python).
//!
//! One `ApiClient` method per operation, named by the camelCase
//! `operationId`. Component capabilities found in the unified specification
//! are embedded as a `COMPONENTS` literal for client-side validation.

use super::cli_client::one_line;
use super::naming::client_arg_ident;
use super::{ArtifactKind, GeneratedNames, TemplateCache};
use crate::error::GenError;
use crate::spec::{RouteEntry, UnifiedSpecification};
use crate::synth::ComponentCapabilitySpec;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Instance attributes a generated method must not shadow.
const CLIENT_ATTRIBUTES: &[&str] = &["timeout"];

#[derive(Serialize)]
struct ClientContext {
    title: String,
    version: String,
    components: String,
    methods: Vec<MethodView>,
}

#[derive(Serialize)]
struct MethodView {
    name: String,
    signature: String,
    doc: String,
    method: &'static str,
    /// Python expression for the request path
    path_expr: String,
    has_body: bool,
}

/// Render a JSON value as a Python literal. Object keys are sorted.
pub fn python_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(_) => value.to_string(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(python_literal).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            let inner: Vec<String> = sorted
                .into_iter()
                .map(|(k, v)| format!("{}: {}", Value::String(k.clone()), python_literal(v)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

fn component_entry(component: &ComponentCapabilitySpec) -> Value {
    let properties: Map<String, Value> = component
        .properties
        .iter()
        .map(|(name, p)| {
            let mut prop = Map::new();
            prop.insert("type".into(), Value::String(p.ty.clone()));
            if let Some(d) = &p.default {
                prop.insert("default".into(), d.clone());
            }
            if let Some(min) = p.min.and_then(serde_json::Number::from_f64) {
                prop.insert("min".into(), Value::Number(min));
            }
            if let Some(max) = p.max.and_then(serde_json::Number::from_f64) {
                prop.insert("max".into(), Value::Number(max));
            }
            if let Some(values) = &p.enum_values {
                prop.insert("enum".into(), Value::Array(values.clone()));
            }
            (name.clone(), Value::Object(prop))
        })
        .collect();
    serde_json::json!({
        "category": component.category,
        "properties": properties,
    })
}

/// `COMPONENTS` literal, one component per line.
fn components_literal(spec: &UnifiedSpecification) -> String {
    let components: BTreeMap<String, Value> = spec
        .components
        .values()
        .filter_map(ComponentCapabilitySpec::from_schema)
        .map(|c| (c.name.clone(), component_entry(&c)))
        .collect();
    if components.is_empty() {
        return "{}".to_string();
    }
    let mut out = String::from("{\n");
    for (name, entry) in &components {
        out.push_str(&format!(
            "    {}: {},\n",
            Value::String(name.clone()),
            python_literal(entry)
        ));
    }
    out.push('}');
    out
}

/// One line of text safe inside a `"""` docstring.
fn docstring_text(s: &str) -> String {
    one_line(s).replace('\\', "\\\\").replace('"', "'")
}

fn method_name(operation_id: &str) -> String {
    let name = GeneratedNames::for_operation(operation_id).client_method;
    if CLIENT_ATTRIBUTES.contains(&name.as_str()) {
        format!("{name}_")
    } else {
        name
    }
}

fn method_view(route: &RouteEntry) -> MethodView {
    let mut signature = String::from("self");
    let mut path_expr = Value::String(route.path.clone()).to_string();
    for param in &route.path_params {
        let ident = client_arg_ident(param);
        signature.push_str(&format!(", {ident}"));
        path_expr.push_str(&format!(
            ".replace({}, _segment({ident}))",
            Value::String(format!("{{{param}}}"))
        ));
    }
    if route.has_body() {
        signature.push_str(", payload=None");
    }
    let doc = route
        .summary
        .as_deref()
        .map(docstring_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| docstring_text(&format!("{} {}", route.method, route.path)));
    MethodView {
        name: method_name(&route.operation_id),
        signature,
        doc,
        method: route.method.as_str(),
        path_expr,
        has_body: route.has_body(),
    }
}

pub fn render_client(
    cache: &TemplateCache,
    spec: &UnifiedSpecification,
    routes: &[RouteEntry],
) -> Result<String, GenError> {
    cache.render(
        ArtifactKind::ScriptingClient,
        ClientContext {
            title: docstring_text(&spec.info.title),
            version: docstring_text(&spec.info.version),
            components: components_literal(spec),
            methods: routes.iter().map(method_view).collect(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{
        build_route_table, merge_fragments, CollisionPolicy, FragmentOrigin, SchemaFragment,
    };
    use crate::synth::{components_fragment, PropertySpec};
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::path::Path;

    #[test]
    fn test_python_literal() {
        assert_eq!(
            python_literal(&json!({"b": [true, null], "a": "x\"y", "c": 1.5})),
            r#"{"a": "x\"y", "b": [True, None], "c": 1.5}"#
        );
    }

    #[test]
    fn test_methods_and_components() {
        let api = SchemaFragment::new(
            "core",
            "core.yaml",
            FragmentOrigin::HandWritten,
            json!({"paths": {
                "/sessions": {"get": {"operationId": "list_sessions", "summary": "List \"all\" sessions"}},
                "/scenes/{sceneId}/entities": {"post": {
                    "operationId": "CreateEntity",
                    "requestBody": {"content": {"application/json": {"schema": {"type": "object"}}}}
                }},
                "/timeouts": {"get": {"operationId": "timeout"}}
            }}),
        );
        let mut properties = BTreeMap::new();
        properties.insert(
            "intensity".to_string(),
            PropertySpec {
                ty: "number".into(),
                default: Some(json!(1.0)),
                min: Some(0.0),
                max: None,
                enum_values: None,
            },
        );
        let light = ComponentCapabilitySpec {
            name: "light-point".into(),
            category: "light".into(),
            properties,
        };
        let components = components_fragment("components", Path::new("lib"), [&light]);
        let spec = merge_fragments(&[components, api], CollisionPolicy::default()).spec;
        let routes = build_route_table(&spec, &BTreeSet::new());
        let out = render_client(&TemplateCache::new(), &spec, &routes).unwrap();

        assert!(out.contains("    def listSessions(self):\n        \"\"\"List 'all' sessions\"\"\"\n"));
        assert!(out.contains(
            "    def createEntity(self, scene_id, payload=None):\n        \"\"\"POST /scenes/{sceneId}/entities\"\"\"\n        return self._request(\"POST\", \"/scenes/{sceneId}/entities\".replace(\"{sceneId}\", _segment(scene_id)), payload)\n"
        ));
        assert!(out.contains("    def timeout_(self):"));
        assert!(out.contains(
            r#"    "light-point": {"category": "light", "properties": {"intensity": {"default": 1.0, "min": 0.0, "type": "number"}}},"#
        ));
    }

    #[test]
    fn test_parameter_arguments_and_multi_line_title() {
        let api = SchemaFragment::new(
            "core",
            "core.yaml",
            FragmentOrigin::HandWritten,
            json!({
                "info": {"title": "Scene\n\"\"\"Server", "version": "1.0"},
                "paths": {"/a/{self}/{payload}": {"put": {
                    "operationId": "2faVerify",
                    "requestBody": {"content": {"application/json": {"schema": {"type": "object"}}}}
                }}}
            }),
        );
        let spec = merge_fragments(&[api], CollisionPolicy::default()).spec;
        let routes = build_route_table(&spec, &BTreeSet::new());
        let out = render_client(&TemplateCache::new(), &spec, &routes).unwrap();

        assert!(out.starts_with("# @generated by specweave-gen from Scene '''Server 1.0. Do not edit.\n"));
        assert!(out.contains("\"\"\"Client for Scene '''Server 1.0.\n"));
        assert!(out.contains("    def _2faVerify(self, self_, payload_, payload=None):\n"), "{out}");
    }
}
