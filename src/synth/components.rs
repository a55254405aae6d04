//! Component capability extraction.
//!
//! Scans component-library source for registration call sites of the form
//!
//! ```text
//! registerComponent('light-point', {
//!   schema: {
//!     color: {type: 'color', default: '#ffffff'},
//!     intensity: {type: 'number', default: 1.0, min: 0, max: 10},
//!     mode: {default: 'soft', oneOf: ['soft', 'hard']}
//!   },
//!   init: function () { ... }
//! });
//! ```
//!
//! Extraction is best-effort and text-level. Blocks that cannot be read are
//! skipped with a warning; extraction of the remaining components goes on.

use super::category::CategoryClassifier;
use super::text::{find_matching, parse_js_literal, split_entry, split_top_level};
use super::{source_files, SynthOutput};
use crate::spec::{FragmentOrigin, SchemaFragment};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Marks a component schema inside the unified specification.
pub const COMPONENT_MARKER: &str = "x-component";
pub const CATEGORY_EXT: &str = "x-category";
/// Original (library-level) property type, kept next to the JSON-schema type.
pub const PROPERTY_TYPE_EXT: &str = "x-property-type";

static REGISTRATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"registerComponent\s*\(\s*['"`]([A-Za-z0-9_.:\-]+)['"`]\s*,"#)
        .expect("registration regex should be valid")
});

/// Description of one configurable component property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    pub ty: String,
    pub default: Option<Value>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub enum_values: Option<Vec<Value>>,
}

impl PropertySpec {
    /// JSON-schema form stored in the unified specification.
    pub fn to_schema(&self) -> Value {
        let mut schema = match self.ty.as_str() {
            "number" => json!({"type": "number"}),
            "int" | "integer" => json!({"type": "integer"}),
            "boolean" => json!({"type": "boolean"}),
            "array" => json!({"type": "array"}),
            "color" => json!({"type": "string", "format": "color"}),
            "vec2" => vec_schema(&["x", "y"]),
            "vec3" => vec_schema(&["x", "y", "z"]),
            "vec4" => vec_schema(&["x", "y", "z", "w"]),
            "object" => json!({"type": "object"}),
            _ => json!({"type": "string"}),
        };
        if let Value::Object(obj) = &mut schema {
            obj.insert(PROPERTY_TYPE_EXT.into(), Value::String(self.ty.clone()));
            if let Some(d) = &self.default {
                obj.insert("default".into(), d.clone());
            }
            if let Some(min) = self.min.and_then(serde_json::Number::from_f64) {
                obj.insert("minimum".into(), Value::Number(min));
            }
            if let Some(max) = self.max.and_then(serde_json::Number::from_f64) {
                obj.insert("maximum".into(), Value::Number(max));
            }
            if let Some(values) = &self.enum_values {
                obj.insert("enum".into(), Value::Array(values.clone()));
            }
        }
        schema
    }

    /// Recover a property description from its stored schema.
    pub fn from_schema(schema: &Value) -> Option<Self> {
        let obj = schema.as_object()?;
        let ty = obj
            .get(PROPERTY_TYPE_EXT)
            .or_else(|| obj.get("type"))?
            .as_str()?
            .to_string();
        Some(PropertySpec {
            ty,
            default: obj.get("default").cloned(),
            min: obj.get("minimum").and_then(Value::as_f64),
            max: obj.get("maximum").and_then(Value::as_f64),
            enum_values: obj.get("enum").and_then(Value::as_array).cloned(),
        })
    }
}

fn vec_schema(axes: &[&str]) -> Value {
    let props: Map<String, Value> = axes
        .iter()
        .map(|a| (a.to_string(), json!({"type": "number"})))
        .collect();
    json!({"type": "object", "properties": props})
}

/// Capabilities of one registered component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentCapabilitySpec {
    pub name: String,
    /// Approximate; see [`super::category`]
    pub category: String,
    pub properties: BTreeMap<String, PropertySpec>,
}

impl ComponentCapabilitySpec {
    pub fn to_schema(&self) -> Value {
        let props: Map<String, Value> = self
            .properties
            .iter()
            .map(|(k, p)| (k.clone(), p.to_schema()))
            .collect();
        json!({
            "type": "object",
            "title": self.name,
            COMPONENT_MARKER: true,
            CATEGORY_EXT: self.category,
            "properties": props,
        })
    }

    /// Recover a component from a unified-spec schema carrying the marker.
    pub fn from_schema(schema: &Value) -> Option<Self> {
        let obj = schema.as_object()?;
        if obj.get(COMPONENT_MARKER) != Some(&Value::Bool(true)) {
            return None;
        }
        let properties = obj
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .filter_map(|(k, v)| PropertySpec::from_schema(v).map(|p| (k.clone(), p)))
                    .collect()
            })
            .unwrap_or_default();
        Some(ComponentCapabilitySpec {
            name: obj.get("title")?.as_str()?.to_string(),
            category: obj
                .get(CATEGORY_EXT)
                .and_then(Value::as_str)
                .unwrap_or(super::category::FALLBACK_CATEGORY)
                .to_string(),
            properties,
        })
    }
}

fn infer_type(default: &Value) -> Option<String> {
    let ty = match default {
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(s) if s.starts_with('#') => "color",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(o) => match o.len() {
            2 if o.contains_key("x") && o.contains_key("y") => "vec2",
            3 if o.contains_key("z") => "vec3",
            4 if o.contains_key("w") => "vec4",
            _ => "object",
        },
        Value::Null => return None,
    };
    Some(ty.to_string())
}

/// Parse the markers of one property block (`{type: ..., default: ...}`).
fn parse_property_block(block: &str) -> Result<PropertySpec, String> {
    let inner = block
        .strip_prefix('{')
        .and_then(|b| b.strip_suffix('}'))
        .ok_or_else(|| "property is not an object block".to_string())?;
    let entries = split_top_level(inner).ok_or_else(|| "unbalanced property block".to_string())?;
    let markers: BTreeMap<String, &str> = entries.into_iter().filter_map(split_entry).collect();
    parse_markers(&markers)
}

fn parse_markers(markers: &BTreeMap<String, &str>) -> Result<PropertySpec, String> {
    let default = match markers.get("default") {
        Some(raw) => Some(
            parse_js_literal(raw).ok_or_else(|| format!("unrecognised default `{raw}`"))?,
        ),
        None => None,
    };
    let ty = match markers.get("type") {
        Some(raw) => match parse_js_literal(raw) {
            Some(Value::String(s)) => s,
            _ => return Err(format!("type marker `{raw}` is not a string literal")),
        },
        None => default
            .as_ref()
            .and_then(infer_type)
            .ok_or_else(|| "neither type nor default marker".to_string())?,
    };
    let bound = |key: &str| -> Result<Option<f64>, String> {
        match markers.get(key) {
            Some(raw) => parse_js_literal(raw)
                .and_then(|v| v.as_f64())
                .map(Some)
                .ok_or_else(|| format!("{key} marker `{raw}` is not numeric")),
            None => Ok(None),
        }
    };
    let enum_values = match markers.get("oneOf").or_else(|| markers.get("enum")) {
        Some(raw) => match parse_js_literal(raw) {
            Some(Value::Array(values)) => Some(values),
            _ => return Err(format!("enumeration `{raw}` is not an array literal")),
        },
        None => None,
    };
    Ok(PropertySpec {
        ty,
        default,
        min: bound("min")?,
        max: bound("max")?,
        enum_values,
    })
}

/// Components extracted from one source text, plus one warning per
/// skipped block.
#[derive(Debug, Default)]
pub struct Extraction {
    pub components: Vec<ComponentCapabilitySpec>,
    pub warnings: Vec<String>,
}

/// Extract every recognisable component registration from `text`.
pub fn extract_components(
    text: &str,
    source_label: &str,
    classifier: &dyn CategoryClassifier,
) -> Extraction {
    let mut out = Extraction::default();
    for caps in REGISTRATION.captures_iter(text) {
        let name = caps[1].to_string();
        let Some(whole) = caps.get(0) else { continue };

        let after = whole.end();
        let Some(open) = text[after..].find(|c: char| !c.is_whitespace()).map(|p| after + p) else {
            skipped(&mut out.warnings, source_label, &name, "registration has no definition");
            continue;
        };
        if text.as_bytes()[open] != b'{' {
            skipped(&mut out.warnings, source_label, &name, "definition is not an object literal");
            continue;
        }
        let Some(close) = find_matching(text, open) else {
            skipped(&mut out.warnings, source_label, &name, "unbalanced definition block");
            continue;
        };
        let definition = &text[open + 1..close];

        let properties = match find_schema_block(definition) {
            None => Ok(BTreeMap::new()),
            Some(Err(reason)) => Err(reason),
            Some(Ok(block)) => parse_schema_block(block, source_label, &name, &mut out.warnings),
        };
        match properties {
            Ok(properties) => {
                debug!(
                    source = %source_label,
                    component = %name,
                    properties = properties.len(),
                    "extracted component"
                );
                out.components.push(ComponentCapabilitySpec {
                    category: classifier.classify(&name),
                    name,
                    properties,
                });
            }
            Err(reason) => skipped(&mut out.warnings, source_label, &name, &reason),
        }
    }
    out
}

fn skipped(warnings: &mut Vec<String>, source_label: &str, component: &str, reason: &str) {
    warn!(source = %source_label, %component, %reason, "skipping component block");
    warnings.push(format!("{source_label}: skipped component '{component}': {reason}"));
}

/// Locate the top-level `schema: {...}` of a component definition.
fn find_schema_block(definition: &str) -> Option<Result<&str, String>> {
    let entries = match split_top_level(definition) {
        Some(e) => e,
        None => return Some(Err("unbalanced definition block".into())),
    };
    let (_, value) = entries
        .into_iter()
        .filter_map(split_entry)
        .find(|(k, _)| k == "schema")?;
    if !value.starts_with('{') {
        return Some(Err("schema is not an object literal".into()));
    }
    Some(Ok(value))
}

fn parse_schema_block(
    block: &str,
    source_label: &str,
    component: &str,
    warnings: &mut Vec<String>,
) -> Result<BTreeMap<String, PropertySpec>, String> {
    let inner = block
        .strip_prefix('{')
        .and_then(|b| b.strip_suffix('}'))
        .ok_or_else(|| "schema block is not closed".to_string())?;
    let entries = split_top_level(inner).ok_or_else(|| "unbalanced schema block".to_string())?;
    let pairs: Vec<(String, &str)> = entries.into_iter().filter_map(split_entry).collect();

    // Single-property schema: markers sit directly in the schema block.
    let is_single = pairs
        .iter()
        .any(|(k, v)| (k == "type" || k == "default") && !v.starts_with('{'));
    if is_single {
        let markers: BTreeMap<String, &str> = pairs.into_iter().collect();
        let prop = parse_markers(&markers)?;
        return Ok(BTreeMap::from([("value".to_string(), prop)]));
    }

    let mut properties = BTreeMap::new();
    for (key, value) in pairs {
        match parse_property_block(value) {
            Ok(prop) => {
                properties.insert(key, prop);
            }
            Err(reason) => {
                warn!(
                    source = %source_label,
                    %component,
                    property = %key,
                    %reason,
                    "skipping property block"
                );
                warnings.push(format!(
                    "{source_label}: skipped property '{component}.{key}': {reason}"
                ));
            }
        }
    }
    Ok(properties)
}

/// Scan every matching source file under `dir` (sorted by path) and build
/// one synthesized fragment holding a component schema per registration.
///
/// A component registered twice keeps its first registration.
pub fn scan_component_sources(
    dir: &Path,
    fragment_name: &str,
    extensions: &[String],
    classifier: &dyn CategoryClassifier,
) -> SynthOutput {
    let mut out = SynthOutput::default();
    let Some(mut files) = source_files(dir, &mut out.errors) else {
        return out;
    };
    files.retain(|p| {
        p.extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|x| x == e))
            .unwrap_or(false)
    });

    let mut components: BTreeMap<String, ComponentCapabilitySpec> = BTreeMap::new();
    for path in files {
        let text = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) => {
                out.warnings
                    .push(format!("{}: unreadable component source: {e}", path.display()));
                continue;
            }
        };
        let label = path
            .strip_prefix(dir)
            .unwrap_or(&path)
            .display()
            .to_string();
        let extraction = extract_components(&text, &label, classifier);
        out.warnings.extend(extraction.warnings);
        for component in extraction.components {
            if components.contains_key(&component.name) {
                out.warnings.push(format!(
                    "{label}: component '{}' registered again; keeping the first registration",
                    component.name
                ));
                continue;
            }
            components.insert(component.name.clone(), component);
        }
    }

    out.fragment = Some(components_fragment(fragment_name, dir, components.values()));
    out
}

/// Fold extracted components into a fragment of schema branches.
/// Components never become operations.
pub fn components_fragment<'a>(
    fragment_name: &str,
    source: &Path,
    components: impl IntoIterator<Item = &'a ComponentCapabilitySpec>,
) -> SchemaFragment {
    let schemas: Map<String, Value> = components
        .into_iter()
        .map(|c| (c.name.clone(), c.to_schema()))
        .collect();
    SchemaFragment::new(
        fragment_name,
        source,
        FragmentOrigin::ComponentLibrary,
        json!({ "components": { "schemas": schemas } }),
    )
}
