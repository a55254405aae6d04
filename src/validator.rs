//! # Specification Validator
//!
//! Walks the unified specification and checks that every declared handler
//! binding points at an implementation file that exists under the handler
//! root. All violations are collected before deciding the outcome.
//!
//! | Flags | Missing handler |
//! |-------|-----------------|
//! | none | warning, operation emitted as a stub |
//! | `strict-validation` | fatal; bound files must also mention the function |
//! | `fail-on-missing-handlers` | fatal |

use crate::error::GenError;
use crate::spec::{HttpMethod, OperationKey, UnifiedSpecification};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub strict: bool,
    pub fail_on_missing_handlers: bool,
    /// Directory handler files are resolved against
    pub handler_root: PathBuf,
}

impl ValidationOptions {
    fn fatal(&self) -> bool {
        self.strict || self.fail_on_missing_handlers
    }
}

/// One operation whose handler binding does not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingHandler {
    pub method: HttpMethod,
    pub path: String,
    pub operation_id: String,
    /// File as declared in the schema
    pub file: PathBuf,
    /// Set when the file exists but never mentions the function (strict mode)
    pub function: Option<String>,
}

impl MissingHandler {
    pub fn key(&self) -> OperationKey {
        OperationKey {
            path: self.path.clone(),
            method: self.method,
        }
    }
}

impl fmt::Display for MissingHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.method, self.path, self.file.display())?;
        if let Some(function) = &self.function {
            write!(f, "#{function}")?;
        }
        Ok(())
    }
}

/// Non-fatal validation result: what was missing and which operations the
/// emitters must render as stubs.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub missing: Vec<MissingHandler>,
    pub stubs: BTreeSet<OperationKey>,
}

fn mentions_function(file: &Path, function: &str) -> bool {
    std::fs::read_to_string(file)
        .map(|text| text.contains(function))
        .unwrap_or(false)
}

/// Check every handler binding in `spec`.
///
/// Returns [`GenError::MissingHandlers`] listing every violation when the
/// options make missing handlers fatal; otherwise each violation is logged
/// and its operation marked for stub emission.
pub fn validate_handlers(
    spec: &UnifiedSpecification,
    options: &ValidationOptions,
) -> Result<ValidationOutcome, GenError> {
    let mut missing = Vec::new();
    for op in spec.operations() {
        let Some(binding) = &op.handler else {
            continue;
        };
        let resolved = options.handler_root.join(&binding.file);
        if !resolved.is_file() {
            missing.push(MissingHandler {
                method: op.method,
                path: op.path.clone(),
                operation_id: op.operation_id.clone(),
                file: binding.file.clone(),
                function: None,
            });
            continue;
        }
        if options.strict && !mentions_function(&resolved, &binding.function) {
            missing.push(MissingHandler {
                method: op.method,
                path: op.path.clone(),
                operation_id: op.operation_id.clone(),
                file: binding.file.clone(),
                function: Some(binding.function.clone()),
            });
            continue;
        }
        debug!(
            operation_id = %op.operation_id,
            file = %resolved.display(),
            "handler binding resolved"
        );
    }

    if options.fatal() && !missing.is_empty() {
        return Err(GenError::MissingHandlers(missing));
    }

    let mut outcome = ValidationOutcome::default();
    for m in missing {
        warn!(
            method = %m.method,
            path = %m.path,
            operation_id = %m.operation_id,
            file = %m.file.display(),
            "handler implementation missing; emitting stub"
        );
        outcome.stubs.insert(m.key());
        outcome.missing.push(m);
    }
    Ok(outcome)
}
