use super::types::{FragmentOrigin, HttpMethod, SchemaFragment};
use crate::error::GenError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fragments that loaded, plus one error per file that did not.
#[derive(Debug, Default)]
pub struct LoadedFragments {
    pub fragments: Vec<SchemaFragment>,
    pub errors: Vec<GenError>,
}

fn is_fragment_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml") | Some("json")
    )
}

/// Drop path-item keys that are neither HTTP methods nor recognised
/// path-level fields, so stray keys never reach the operation builder.
pub(crate) fn strip_unknown_verbs(val: &mut Value) {
    let Some(Value::Object(paths_map)) = val.get_mut("paths") else {
        return;
    };
    for item in paths_map.values_mut() {
        if let Value::Object(obj) = item {
            obj.retain(|k, _| {
                matches!(
                    k.as_str(),
                    "summary" | "description" | "servers" | "parameters" | "$ref"
                ) || HttpMethod::parse(k).is_some()
                    || k.starts_with("x-")
            });
        }
    }
}

/// Structural checks that make a document usable as a fragment.
fn check_structure(doc: &Value) -> Result<(), String> {
    let Some(root) = doc.as_object() else {
        return Err("document root must be a mapping".to_string());
    };
    if let Some(paths) = root.get("paths") {
        let Some(paths) = paths.as_object() else {
            return Err("`paths` must be a mapping of path -> path item".to_string());
        };
        for (path, item) in paths {
            if !path.starts_with('/') {
                return Err(format!("path '{path}' must start with '/'"));
            }
            let Some(item) = item.as_object() else {
                return Err(format!("path item '{path}' must be a mapping"));
            };
            for (key, op) in item {
                if HttpMethod::parse(key).is_some() && !op.is_object() {
                    return Err(format!("operation '{key} {path}' must be a mapping"));
                }
            }
        }
    }
    if let Some(components) = root.get("components") {
        if !components.is_object() {
            return Err("`components` must be a mapping".to_string());
        }
        if let Some(schemas) = components.get("schemas") {
            if !schemas.is_object() {
                return Err("`components.schemas` must be a mapping".to_string());
            }
        }
    }
    Ok(())
}

/// Parse one fragment document from text.
///
/// `.json` files are parsed as JSON, everything else as YAML.
pub fn parse_fragment(name: &str, path: &Path, content: &str) -> Result<SchemaFragment, GenError> {
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    let mut value: Value = if is_json {
        serde_json::from_str(content).map_err(|e| GenError::schema_parse(path, e.to_string()))?
    } else {
        serde_yaml::from_str(content).map_err(|e| GenError::schema_parse(path, e.to_string()))?
    };
    check_structure(&value).map_err(|msg| GenError::schema_parse(path, msg))?;
    strip_unknown_verbs(&mut value);
    Ok(SchemaFragment::new(
        name,
        path,
        FragmentOrigin::HandWritten,
        value,
    ))
}

/// Fragment files among `entries`, sorted by file name. Entries that cannot
/// be read are reported against `dir`.
fn fragment_files(
    dir: &Path,
    entries: impl IntoIterator<Item = std::io::Result<PathBuf>>,
    errors: &mut Vec<GenError>,
) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() && is_fragment_file(&path) => files.push(path),
            Ok(_) => {}
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "unreadable schema directory entry");
                errors.push(GenError::schema_parse(
                    dir,
                    format!("unreadable directory entry: {e}"),
                ));
            }
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    files
}

/// Load every schema fragment in `dir`, sorted by file name.
///
/// A malformed file or unreadable entry yields a [`GenError::SchemaParse`]
/// and is left out; the rest still load. The only hard failure is an
/// unreadable directory.
pub fn load_fragments(dir: &Path) -> anyhow::Result<LoadedFragments> {
    use anyhow::Context;

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read schema directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()));

    let mut loaded = LoadedFragments::default();
    let files = fragment_files(dir, entries, &mut loaded.errors);
    for path in files {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable schema fragment");
                loaded.errors.push(GenError::schema_parse(&path, e.to_string()));
                continue;
            }
        };
        match parse_fragment(&name, &path, &content) {
            Ok(fragment) => {
                debug!(source = %name, path = %path.display(), "loaded schema fragment");
                loaded.fragments.push(fragment);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping malformed schema fragment");
                loaded.errors.push(e);
            }
        }
    }
    Ok(loaded)
}

/// Position of a fragment in the stable load order.
///
/// Synthesized fragments come first (type definitions, then component
/// libraries, each by name) so a hand-written fragment can override a
/// synthesized operation. Hand-written fragments follow in the loader's
/// order: by file name, then by full path.
fn load_order_key(fragment: &SchemaFragment) -> (bool, FragmentOrigin, String, PathBuf) {
    let hand_written = fragment.origin == FragmentOrigin::HandWritten;
    let label = if hand_written {
        fragment
            .source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        fragment.name.clone()
    };
    (hand_written, fragment.origin, label, fragment.source_path.clone())
}

/// Re-assemble hand-written and synthesized fragments into the stable
/// load order (see [`load_order_key`]).
///
/// Fragment names namespace shared sub-schemas, so a name may only be used
/// once; later duplicates are rejected.
pub fn order_fragments(
    fragments: impl IntoIterator<Item = SchemaFragment>,
) -> (Vec<SchemaFragment>, Vec<GenError>) {
    let mut all: Vec<SchemaFragment> = fragments.into_iter().collect();
    all.sort_by_cached_key(load_order_key);

    let mut first_use: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut ordered = Vec::with_capacity(all.len());
    let mut errors = Vec::new();
    for fragment in all {
        if let Some(first) = first_use.get(&fragment.name) {
            errors.push(GenError::schema_parse(
                &fragment.source_path,
                format!(
                    "fragment name '{}' is already used by {}",
                    fragment.name,
                    first.display()
                ),
            ));
            continue;
        }
        first_use.insert(fragment.name.clone(), fragment.source_path.clone());
        ordered.push(fragment);
    }
    (ordered, errors)
}
