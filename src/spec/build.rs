use super::types::{
    HandlerBinding, HttpMethod, Operation, OperationKey, ParameterLocation, ParameterMeta,
    RequestBody, RouteEntry, SchemaFragment, UnifiedSpecification,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::warn;

/// Extension field naming the handler implementation file.
pub const HANDLER_FILE_EXT: &str = "x-handler-file";
/// Extension field naming the handler function inside that file.
pub const HANDLER_FUNCTION_EXT: &str = "x-handler-function";

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

static PATH_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}/]+)\}").expect("path parameter regex should be valid"));

/// Parameter names appearing in a path template, in order.
pub fn path_template_params(path: &str) -> Vec<String> {
    PATH_PARAM
        .captures_iter(path)
        .map(|c| c[1].to_string())
        .collect()
}

/// Deterministic operationId for operations that do not declare one:
/// `GET /sessions/{id}/members` becomes `get_sessions_id_members`.
pub fn derive_operation_id(method: HttpMethod, path: &str) -> String {
    let mut id = method.key();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let cleaned: String = segment
            .chars()
            .filter(|c| *c != '{' && *c != '}')
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        if !cleaned.is_empty() {
            id.push('_');
            id.push_str(&cleaned);
        }
    }
    id
}

/// Rewrite `#/components/schemas/X` references to the namespaced
/// `#/components/schemas/<source>_X`, including discriminator mappings.
pub fn namespace_schema_refs(value: &mut Value, source: &str) {
    let rewrite = |s: &mut String| {
        if let Some(name) = s.strip_prefix(SCHEMA_REF_PREFIX) {
            *s = format!("{SCHEMA_REF_PREFIX}{source}_{name}");
        }
    };
    match value {
        Value::Object(obj) => {
            for (key, v) in obj.iter_mut() {
                match (key.as_str(), v) {
                    ("$ref", Value::String(s)) => rewrite(s),
                    ("discriminator", Value::Object(disc)) => {
                        if let Some(Value::Object(mapping)) = disc.get_mut("mapping") {
                            for target in mapping.values_mut() {
                                if let Value::String(s) = target {
                                    rewrite(s);
                                }
                            }
                        }
                    }
                    (_, v) => namespace_schema_refs(v, source),
                }
            }
        }
        Value::Array(arr) => {
            for v in arr.iter_mut() {
                namespace_schema_refs(v, source);
            }
        }
        _ => {}
    }
}

fn parse_parameter(raw: &Value) -> Option<ParameterMeta> {
    let obj = raw.as_object()?;
    let name = obj.get("name")?.as_str()?.to_string();
    let location = ParameterLocation::parse(obj.get("in")?.as_str()?)?;
    let required = location == ParameterLocation::Path
        || obj.get("required").and_then(Value::as_bool).unwrap_or(false);
    Some(ParameterMeta {
        name,
        location,
        required,
        schema: obj.get("schema").cloned(),
        description: obj
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn parse_parameters(
    raw: Option<&Value>,
    location: &str,
    warnings: &mut Vec<String>,
) -> Vec<ParameterMeta> {
    let Some(list) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|p| {
            let parsed = parse_parameter(p);
            if parsed.is_none() {
                warnings.push(format!("{location}: ignoring parameter without name/in: {p}"));
            }
            parsed
        })
        .collect()
}

/// Combine path-level and operation-level parameters.
///
/// Operation-level entries override path-level ones with the same
/// `(name, in)`. Undeclared template parameters become required strings.
/// Path parameters come first in template order, others keep declaration order.
fn merge_parameters(
    path: &str,
    path_level: &[ParameterMeta],
    op_level: Vec<ParameterMeta>,
) -> Vec<ParameterMeta> {
    let mut merged: Vec<ParameterMeta> = path_level
        .iter()
        .filter(|p| {
            !op_level
                .iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .cloned()
        .collect();
    merged.extend(op_level);

    let template = path_template_params(path);
    let mut ordered = Vec::with_capacity(merged.len() + template.len());
    for name in &template {
        let declared = merged
            .iter()
            .position(|p| p.location == ParameterLocation::Path && &p.name == name);
        match declared {
            Some(idx) => ordered.push(merged.remove(idx)),
            None => ordered.push(ParameterMeta {
                name: name.clone(),
                location: ParameterLocation::Path,
                required: true,
                schema: Some(serde_json::json!({ "type": "string" })),
                description: None,
            }),
        }
    }
    // Path parameters that never appear in the template are dropped.
    ordered.extend(
        merged
            .into_iter()
            .filter(|p| p.location != ParameterLocation::Path),
    );
    ordered
}

fn parse_request_body(raw: Option<&Value>) -> Option<RequestBody> {
    let obj = raw?.as_object()?;
    let required = obj.get("required").and_then(Value::as_bool).unwrap_or(false);
    let schema = obj
        .get("content")
        .and_then(|c| c.get("application/json"))
        .and_then(|m| m.get("schema"))
        .cloned();
    Some(RequestBody { required, schema })
}

fn parse_handler_binding(
    op: &serde_json::Map<String, Value>,
    operation_id: &str,
    location: &str,
    warnings: &mut Vec<String>,
) -> Option<HandlerBinding> {
    let file = op.get(HANDLER_FILE_EXT).and_then(Value::as_str);
    let function = op.get(HANDLER_FUNCTION_EXT).and_then(Value::as_str);
    match (file, function) {
        (Some(file), function) if !file.trim().is_empty() => Some(HandlerBinding {
            file: PathBuf::from(file),
            function: function
                .map(str::to_string)
                .unwrap_or_else(|| crate::generator::to_snake_case(operation_id)),
        }),
        (_, Some(function)) => {
            warnings.push(format!(
                "{location}: {HANDLER_FUNCTION_EXT} '{function}' has no {HANDLER_FILE_EXT}; binding ignored"
            ));
            None
        }
        _ => None,
    }
}

/// Build the typed operations declared by one fragment.
///
/// The document is expected to have passed the loader's structural checks
/// and to carry namespaced schema references already.
pub fn operations_from_document(
    fragment: &SchemaFragment,
    document: &Value,
    warnings: &mut Vec<String>,
) -> Vec<Operation> {
    let mut ops = Vec::new();
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return ops;
    };
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        let path_level = parse_parameters(item.get("parameters"), path, warnings);
        for (key, raw_op) in item {
            let Some(method) = HttpMethod::parse(key) else {
                continue;
            };
            let Some(op) = raw_op.as_object() else {
                continue;
            };
            let location = format!("{} {} ({})", method, path, fragment.name);
            let operation_id = match op.get("operationId").and_then(Value::as_str) {
                Some(id) if !id.trim().is_empty() => id.to_string(),
                _ => {
                    let derived = derive_operation_id(method, path);
                    warn!(
                        source = %fragment.name,
                        %method,
                        %path,
                        operation_id = %derived,
                        "operation has no operationId; derived one"
                    );
                    warnings.push(format!("{location}: missing operationId, using '{derived}'"));
                    derived
                }
            };
            let op_level = parse_parameters(op.get("parameters"), &location, warnings);
            let responses: BTreeMap<String, Value> = op
                .get("responses")
                .and_then(Value::as_object)
                .map(|r| r.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();
            ops.push(Operation {
                handler: parse_handler_binding(op, &operation_id, &location, warnings),
                operation_id,
                method,
                path: path.clone(),
                summary: op
                    .get("summary")
                    .or_else(|| item.get("summary"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                parameters: merge_parameters(path, &path_level, op_level),
                request_body: parse_request_body(op.get("requestBody")),
                responses,
                source: fragment.name.clone(),
            });
        }
    }
    ops
}

/// Build the deterministic route table: sorted by path, then method.
///
/// `stubs` lists operations whose handler binding failed validation.
pub fn build_route_table(
    spec: &UnifiedSpecification,
    stubs: &BTreeSet<OperationKey>,
) -> Vec<RouteEntry> {
    spec.operations()
        .map(|op| RouteEntry {
            method: op.method,
            path: op.path.clone(),
            operation_id: op.operation_id.clone(),
            summary: op.summary.clone(),
            path_params: op.path_parameters().map(|p| p.name.clone()).collect(),
            request_body: op.request_body.clone(),
            handler: op.handler.clone(),
            stub: stubs.contains(&op.key()),
        })
        .collect()
}
