//! Type-definition scanning.
//!
//! Reads foreign type declarations and synthesizes one fragment whose single
//! operation accepts a discriminated union with one variant per type.
//!
//! Two declaration dialects are understood:
//!
//! - TypeScript declarations (`.d.ts` / `.ts`): `class BoxGeometry` with a
//!   `constructor(width?: number, ...)`; JSDoc `@param` lines supply
//!   descriptions and ``Default `1` `` markers.
//! - Structured declarations (`.yaml` / `.yml` / `.json`):
//!   `{ name, params: [{ name, type, default, description }] }`, a list of
//!   those, or `{ types: [...] }`.

use super::text::{find_matching, parse_js_literal, split_top_level};
use super::{source_files, SynthOutput};
use crate::error::GenError;
use crate::spec::{FragmentOrigin, HandlerBinding, HttpMethod, SchemaFragment};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Discriminator property carried by every synthesized variant.
pub const DISCRIMINATOR: &str = "type";

static CLASS_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+)?(?:declare\s+)?(?:abstract\s+)?class\s+([A-Za-z_$][\w$]*)")
        .expect("class regex should be valid")
});

static CONSTRUCTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bconstructor\s*\(").expect("constructor regex should be valid"));

static PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)^(?:(?:public|private|protected|readonly)\s+)*([A-Za-z_$][\w$]*)(\?)?\s*(?::\s*(.+?))?\s*(?:=\s*(.+))?$",
    )
    .expect("parameter regex should be valid")
});

static PARAM_DOC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@param\s+(?:\{[^}]*\}\s*)?\[?([A-Za-z_$][\w$]*)(?:=([^\]]+))?\]?\s*(?:-\s*)?(.*)$")
        .expect("jsdoc param regex should be valid")
});

static DEFAULT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdefault(?:s)?(?:\s+(?:is|to|value))?\s*[:=]?\s*`([^`]+)`")
        .expect("default marker regex should be valid")
});

static NUMERIC_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(-?[\d.]+|Math\.PI)\s*(?:([*/])\s*([\d.]+|Math\.PI)\s*)?$")
        .expect("numeric expression regex should be valid")
});

/// One parameter of a foreign constructor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeParam {
    pub name: String,
    /// Foreign type expression (`number`, `boolean`, `string[]`, ...)
    #[serde(rename = "type", default)]
    pub ty: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One scanned foreign type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    #[serde(default)]
    pub params: Vec<TypeParam>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeclarationFile {
    Many(Vec<TypeDeclaration>),
    Wrapped { types: Vec<TypeDeclaration> },
    One(TypeDeclaration),
}

/// Where and how the synthesized operation is exposed.
#[derive(Debug, Clone)]
pub struct TypeScanOptions {
    pub fragment_name: String,
    pub path: String,
    pub method: HttpMethod,
    pub operation_id: String,
    /// Lower-case suffixes stripped from type names, longest first
    pub strip_suffixes: Vec<String>,
    pub handler: Option<HandlerBinding>,
}

impl Default for TypeScanOptions {
    fn default() -> Self {
        TypeScanOptions {
            fragment_name: "geometries".to_string(),
            path: "/geometries".to_string(),
            method: HttpMethod::Post,
            operation_id: "createGeometry".to_string(),
            strip_suffixes: vec!["buffergeometry".to_string(), "geometry".to_string()],
            handler: None,
        }
    }
}

/// Discriminator value for a type name: lower-cased, first matching suffix
/// stripped. A name that is nothing but a suffix keeps its full form.
pub fn normalize_type_name(name: &str, strip_suffixes: &[String]) -> String {
    let lower = name.to_ascii_lowercase();
    let mut suffixes: Vec<&String> = strip_suffixes.iter().collect();
    suffixes.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    for suffix in suffixes {
        let suffix = suffix.to_ascii_lowercase();
        if let Some(stripped) = lower.strip_suffix(&suffix) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    lower
}

/// Evaluate a default expression: a literal, or `Math.PI` arithmetic.
fn parse_default(expr: &str) -> Option<Value> {
    let expr = expr.trim();
    if let Some(v) = parse_js_literal(expr) {
        return Some(v);
    }
    let caps = NUMERIC_EXPR.captures(expr)?;
    let operand = |s: &str| -> Option<f64> {
        if s == "Math.PI" {
            Some(std::f64::consts::PI)
        } else {
            s.parse().ok()
        }
    };
    let lhs = operand(&caps[1])?;
    let value = match (caps.get(2), caps.get(3)) {
        (Some(op), Some(rhs)) => {
            let rhs = operand(rhs.as_str())?;
            if op.as_str() == "*" {
                lhs * rhs
            } else {
                lhs / rhs
            }
        }
        _ => lhs,
    };
    serde_json::Number::from_f64(value).map(Value::Number)
}

/// JSON schema for a foreign type expression.
pub fn foreign_type_schema(ty: Option<&str>, default: Option<&Value>) -> Value {
    let Some(ty) = ty.map(str::trim).filter(|t| !t.is_empty()) else {
        return match default {
            Some(Value::Bool(_)) => json!({"type": "boolean"}),
            Some(Value::Number(_)) => json!({"type": "number"}),
            Some(Value::Array(_)) => json!({"type": "array"}),
            Some(Value::Object(_)) => json!({"type": "object"}),
            _ => json!({"type": "string"}),
        };
    };
    let parts: Vec<&str> = ty
        .split('|')
        .map(str::trim)
        .filter(|p| !matches!(*p, "undefined" | "null"))
        .collect();
    if parts.len() > 1 {
        let literals: Option<Vec<Value>> = parts
            .iter()
            .map(|p| match parse_js_literal(p) {
                Some(Value::String(s)) => Some(Value::String(s)),
                _ => None,
            })
            .collect();
        return match literals {
            Some(values) => json!({"type": "string", "enum": values}),
            None => json!({"x-foreign-type": ty}),
        };
    }
    let single = parts.first().copied().unwrap_or(ty);
    if let Some(inner) = single
        .strip_suffix("[]")
        .or_else(|| single.strip_prefix("Array<").and_then(|s| s.strip_suffix('>')))
    {
        return json!({"type": "array", "items": foreign_type_schema(Some(inner), None)});
    }
    match single {
        "number" | "float" | "double" => json!({"type": "number"}),
        "integer" | "int" => json!({"type": "integer"}),
        "boolean" | "bool" => json!({"type": "boolean"}),
        "string" => json!({"type": "string"}),
        other => json!({"type": "object", "x-foreign-type": other}),
    }
}

/// Pull `@param` descriptions (and bracketed defaults) out of a JSDoc block.
fn parse_jsdoc(doc: &str) -> BTreeMap<String, (Option<String>, String)> {
    let mut params: BTreeMap<String, (Option<String>, String)> = BTreeMap::new();
    let mut current: Option<String> = None;
    for line in doc.lines() {
        let line = line
            .trim()
            .trim_start_matches("/**")
            .trim_end_matches("*/")
            .trim_start_matches('*')
            .trim();
        if let Some(caps) = PARAM_DOC.captures(line) {
            let name = caps[1].to_string();
            let bracket_default = caps.get(2).map(|m| m.as_str().trim().to_string());
            params.insert(name.clone(), (bracket_default, caps[3].trim().to_string()));
            current = Some(name);
        } else if line.starts_with('@') {
            current = None;
        } else if let Some(name) = &current {
            if let Some((_, desc)) = params.get_mut(name) {
                if !line.is_empty() {
                    if !desc.is_empty() {
                        desc.push(' ');
                    }
                    desc.push_str(line);
                }
            }
        }
    }
    params
}

/// The JSDoc block directly preceding `pos`, if any.
fn preceding_jsdoc(region: &str, pos: usize) -> Option<&str> {
    let before = &region[..pos];
    let end = before.rfind("*/")?;
    if !before[end + 2..].trim().is_empty() {
        return None;
    }
    let start = before[..end].rfind("/**")?;
    Some(&before[start..end + 2])
}

/// Scan TypeScript declaration text for classes with constructors.
pub fn parse_typescript_declarations(
    text: &str,
    warnings: &mut Vec<String>,
    label: &str,
) -> Vec<TypeDeclaration> {
    let starts: Vec<(usize, String)> = CLASS_DECL
        .captures_iter(text)
        .filter_map(|c| Some((c.get(0)?.start(), c[1].to_string())))
        .collect();
    let mut decls = Vec::new();
    for (idx, (start, name)) in starts.iter().enumerate() {
        let end = starts.get(idx + 1).map(|(s, _)| *s).unwrap_or(text.len());
        let region = &text[*start..end];
        let Some(ctor) = CONSTRUCTOR.find(region) else {
            decls.push(TypeDeclaration {
                name: name.clone(),
                params: Vec::new(),
            });
            continue;
        };
        let open = ctor.end() - 1;
        let Some(close) = find_matching(region, open) else {
            warnings.push(format!(
                "{label}: class '{name}': unbalanced constructor signature; skipped"
            ));
            continue;
        };
        let Some(raw_params) = split_top_level(&region[open + 1..close]) else {
            warnings.push(format!(
                "{label}: class '{name}': unreadable constructor parameters; skipped"
            ));
            continue;
        };
        let docs = preceding_jsdoc(region, ctor.start())
            .map(parse_jsdoc)
            .unwrap_or_default();

        let mut params = Vec::new();
        for raw in raw_params {
            if raw.starts_with("...") {
                continue;
            }
            let Some(caps) = PARAM.captures(raw) else {
                warnings.push(format!("{label}: class '{name}': unrecognised parameter `{raw}`"));
                continue;
            };
            let pname = caps[1].to_string();
            let (doc_default, description) = docs
                .get(&pname)
                .cloned()
                .map(|(d, desc)| (d, Some(desc).filter(|s| !s.is_empty())))
                .unwrap_or((None, None));
            let default = caps
                .get(4)
                .map(|m| m.as_str().to_string())
                .or(doc_default)
                .or_else(|| {
                    description
                        .as_deref()
                        .and_then(|d| DEFAULT_MARKER.captures(d))
                        .map(|c| c[1].to_string())
                })
                .and_then(|expr| {
                    let parsed = parse_default(&expr);
                    if parsed.is_none() {
                        debug!(
                            source = %label,
                            class = %name,
                            param = %pname,
                            %expr,
                            "default expression not evaluated"
                        );
                    }
                    parsed
                });
            params.push(TypeParam {
                name: pname,
                ty: caps.get(3).map(|m| m.as_str().trim().to_string()),
                default,
                description,
            });
        }
        decls.push(TypeDeclaration {
            name: name.clone(),
            params,
        });
    }
    decls
}

fn declarations_in_file(
    path: &Path,
    warnings: &mut Vec<String>,
) -> Result<Vec<TypeDeclaration>, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let label = path.display().to_string();
    match path.extension().and_then(|e| e.to_str()) {
        Some("ts") => Ok(parse_typescript_declarations(&text, warnings, &label)),
        Some("yaml") | Some("yml") => serde_yaml::from_str::<DeclarationFile>(&text)
            .map(flatten_declarations)
            .map_err(|e| e.to_string()),
        Some("json") => serde_json::from_str::<DeclarationFile>(&text)
            .map(flatten_declarations)
            .map_err(|e| e.to_string()),
        _ => Ok(Vec::new()),
    }
}

fn flatten_declarations(file: DeclarationFile) -> Vec<TypeDeclaration> {
    match file {
        DeclarationFile::Many(v) | DeclarationFile::Wrapped { types: v } => v,
        DeclarationFile::One(d) => vec![d],
    }
}

fn variant_schema(
    decl: &TypeDeclaration,
    discriminator: &str,
    warnings: &mut Vec<String>,
) -> Value {
    let mut properties = Map::new();
    properties.insert(
        DISCRIMINATOR.to_string(),
        json!({"type": "string", "enum": [discriminator], "default": discriminator}),
    );
    for p in &decl.params {
        if p.name == DISCRIMINATOR {
            warnings.push(format!(
                "type '{}': parameter '{DISCRIMINATOR}' shadows the discriminator; skipped",
                decl.name
            ));
            continue;
        }
        let mut schema = foreign_type_schema(p.ty.as_deref(), p.default.as_ref());
        if let Value::Object(obj) = &mut schema {
            if let Some(d) = &p.default {
                obj.insert("default".into(), d.clone());
            }
            if let Some(desc) = &p.description {
                obj.insert("description".into(), Value::String(desc.clone()));
            }
        }
        properties.insert(p.name.clone(), schema);
    }
    json!({
        "type": "object",
        "title": decl.name,
        "x-foreign-type": decl.name,
        "required": [DISCRIMINATOR],
        "properties": properties,
    })
}

/// Build the synthesized fragment from scanned declarations.
///
/// Distinct types normalizing to the same discriminator are reported as
/// [`GenError::DiscriminatorConflict`]; only the first (by name) is kept.
pub fn typedefs_fragment(
    declarations: Vec<TypeDeclaration>,
    source: &Path,
    options: &TypeScanOptions,
) -> (SchemaFragment, Vec<String>, Vec<GenError>) {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let mut by_name: BTreeMap<String, TypeDeclaration> = BTreeMap::new();
    for decl in declarations {
        if by_name.contains_key(&decl.name) {
            warnings.push(format!(
                "type '{}' declared more than once; keeping the first",
                decl.name
            ));
            continue;
        }
        by_name.insert(decl.name.clone(), decl);
    }

    let mut by_discriminator: BTreeMap<String, Vec<TypeDeclaration>> = BTreeMap::new();
    for decl in by_name.into_values() {
        let key = normalize_type_name(&decl.name, &options.strip_suffixes);
        by_discriminator.entry(key).or_default().push(decl);
    }

    let mut schemas = Map::new();
    let mut one_of = Vec::new();
    let mut mapping = Map::new();
    for (discriminator, decls) in by_discriminator {
        if decls.len() > 1 {
            errors.push(GenError::DiscriminatorConflict {
                discriminator: discriminator.clone(),
                types: decls.iter().map(|d| d.name.clone()).collect(),
            });
        }
        let Some(decl) = decls.into_iter().next() else { continue };
        let reference = format!("#/components/schemas/{}", decl.name);
        schemas.insert(decl.name.clone(), variant_schema(&decl, &discriminator, &mut warnings));
        one_of.push(json!({"$ref": reference}));
        mapping.insert(discriminator, Value::String(reference));
    }

    if one_of.is_empty() {
        warn!(source = %source.display(), "no type declarations found; creation operation omitted");
        warnings.push(format!(
            "{}: no type declarations found; operation '{}' omitted",
            source.display(),
            options.operation_id
        ));
        let document = json!({"components": {"schemas": schemas}});
        return (
            SchemaFragment::new(
                options.fragment_name.clone(),
                source,
                FragmentOrigin::TypeDefinitions,
                document,
            ),
            warnings,
            errors,
        );
    }

    let mut operation = json!({
        "operationId": options.operation_id,
        "summary": format!("Create one of {} synthesized variants", one_of.len()),
        "requestBody": {
            "required": true,
            "content": {"application/json": {"schema": {
                "oneOf": one_of,
                "discriminator": {"propertyName": DISCRIMINATOR, "mapping": mapping},
            }}},
        },
        "responses": {"201": {"description": "Created"}},
    });
    if let (Some(binding), Value::Object(op)) = (&options.handler, &mut operation) {
        op.insert(
            crate::spec::HANDLER_FILE_EXT.into(),
            Value::String(binding.file.display().to_string()),
        );
        op.insert(
            crate::spec::HANDLER_FUNCTION_EXT.into(),
            Value::String(binding.function.clone()),
        );
    }

    let mut method_map = Map::new();
    method_map.insert(options.method.key(), operation);
    let mut paths = Map::new();
    paths.insert(options.path.clone(), Value::Object(method_map));

    let document = json!({
        "paths": paths,
        "components": {"schemas": schemas},
    });
    (
        SchemaFragment::new(
            options.fragment_name.clone(),
            source,
            FragmentOrigin::TypeDefinitions,
            document,
        ),
        warnings,
        errors,
    )
}

/// Scan every declaration file under `dir` (sorted by path) into one fragment.
pub fn scan_type_definitions(dir: &Path, options: &TypeScanOptions) -> SynthOutput {
    let mut out = SynthOutput::default();
    let Some(files) = source_files(dir, &mut out.errors) else {
        return out;
    };

    let mut declarations = Vec::new();
    for path in files {
        match declarations_in_file(&path, &mut out.warnings) {
            Ok(decls) => {
                debug!(path = %path.display(), types = decls.len(), "scanned type declarations");
                declarations.extend(decls);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable type declaration file");
                out.warnings
                    .push(format!("{}: unreadable type declarations: {e}", path.display()));
            }
        }
    }

    let (fragment, warnings, errors) = typedefs_fragment(declarations, dir, options);
    out.warnings.extend(warnings);
    out.errors.extend(errors);
    out.fragment = Some(fragment);
    out
}
