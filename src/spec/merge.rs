//! Fragment merging.
//!
//! Fragments are consumed in the stable load order. Two rules decide how
//! they combine:
//!
//! - **Paths**: per-method operation maps of the same path are unioned. A
//!   same-path-same-method collision is resolved by [`CollisionPolicy`]:
//!   last-writer-wins (logged at `info` with both sources) or a fatal
//!   [`GenError::PathConflict`].
//! - **Components**: every shared sub-schema lands under
//!   `<source>_<original>` and references to it are rewritten, so fragments
//!   can never shadow each other's schemas.
//!
//! After the union, operationIds are checked for global uniqueness.

use super::build::{namespace_schema_refs, operations_from_document};
use super::types::{HttpMethod, SchemaFragment, SpecInfo, UnifiedSpecification};
use crate::error::GenError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// How a same-path-same-method collision between fragments is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// The fragment later in load order replaces the earlier operation
    #[default]
    LastWriterWins,
    /// Every collision is a fatal error
    Error,
}

/// A same-path-same-method collision observed while merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCollision {
    pub method: HttpMethod,
    pub path: String,
    /// Source whose operation was replaced
    pub earlier: String,
    /// Source whose operation was kept
    pub later: String,
}

/// Result of merging: the unified specification plus everything observed
/// on the way. `errors` being non-empty means the spec must not be emitted.
#[derive(Debug, Default)]
pub struct MergeOutput {
    pub spec: UnifiedSpecification,
    pub collisions: Vec<PathCollision>,
    pub warnings: Vec<String>,
    pub errors: Vec<GenError>,
}

fn parse_info(doc: &Value) -> Option<SpecInfo> {
    let info = doc.get("info")?.as_object()?;
    let title = info.get("title")?.as_str()?.to_string();
    Some(SpecInfo {
        title,
        version: info
            .get("version")
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "0.0.0".to_string()),
        description: info
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// Merge fragments (already in stable load order) into one specification.
pub fn merge_fragments(fragments: &[SchemaFragment], policy: CollisionPolicy) -> MergeOutput {
    let mut out = MergeOutput::default();
    let mut info: Option<SpecInfo> = None;

    for fragment in fragments {
        let mut doc = fragment.document.clone();
        namespace_schema_refs(&mut doc, &fragment.name);

        if info.is_none() {
            info = parse_info(&doc);
        }

        if let Some(schemas) = doc
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(Value::as_object)
        {
            for (name, schema) in schemas {
                let key = format!("{}_{}", fragment.name, name);
                debug!(source = %fragment.name, component = %key, "merged component schema");
                out.spec.components.insert(key, schema.clone());
            }
        }

        for op in operations_from_document(fragment, &doc, &mut out.warnings) {
            let item = out.spec.paths.entry(op.path.clone()).or_default();
            if let Some(previous) = item.operations.get(&op.method) {
                let collision = PathCollision {
                    method: op.method,
                    path: op.path.clone(),
                    earlier: previous.source.clone(),
                    later: op.source.clone(),
                };
                match policy {
                    CollisionPolicy::LastWriterWins => {
                        info!(
                            method = %collision.method,
                            path = %collision.path,
                            earlier = %collision.earlier,
                            later = %collision.later,
                            "path/method collision: later fragment overrides earlier"
                        );
                    }
                    CollisionPolicy::Error => {
                        out.errors.push(GenError::PathConflict {
                            method: collision.method,
                            path: collision.path.clone(),
                            earlier: collision.earlier.clone(),
                            later: collision.later.clone(),
                        });
                    }
                }
                out.collisions.push(collision);
            }
            item.operations.insert(op.method, op);
        }
    }

    out.spec.info = info.unwrap_or_default();
    out.errors.extend(check_operation_ids(&out.spec));
    out
}

/// One error per operationId that is declared by more than one operation,
/// naming every declaring operation.
pub fn check_operation_ids(spec: &UnifiedSpecification) -> Vec<GenError> {
    let mut seen: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for op in spec.operations() {
        seen.entry(op.operation_id.as_str())
            .or_default()
            .push(op.label());
    }
    seen.into_iter()
        .filter(|(_, occurrences)| occurrences.len() > 1)
        .map(|(id, occurrences)| GenError::DuplicateOperationId {
            operation_id: id.to_string(),
            occurrences,
        })
        .collect()
}
