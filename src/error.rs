//! Error taxonomy and the aggregated end-of-run report.
//!
//! Every stage collects its failures instead of returning on the first one,
//! so a single run can report all malformed fragments, all duplicate
//! operation IDs and all missing handlers at once.

use crate::spec::HttpMethod;
use crate::validator::MissingHandler;
use std::fmt;
use std::path::PathBuf;

pub type GenResult<T> = Result<T, GenError>;

#[derive(thiserror::Error, Debug)]
pub enum GenError {
    /// One malformed fragment; the others are still processed
    #[error("schema parse error in {file}: {message}")]
    SchemaParse { file: PathBuf, message: String },

    #[error("duplicate operationId '{operation_id}' declared by {}", .occurrences.join(" and "))]
    DuplicateOperationId {
        operation_id: String,
        occurrences: Vec<String>,
    },

    /// Same path and method declared by two fragments
    #[error("path conflict on {method} {path}: '{earlier}' is overridden by '{later}'")]
    PathConflict {
        method: HttpMethod,
        path: String,
        earlier: String,
        later: String,
    },

    #[error("missing handler implementation for {} operation(s):{}", .0.len(), format_missing(.0))]
    MissingHandlers(Vec<MissingHandler>),

    #[error("failed to render {artifact}: {message}")]
    TemplateRender { artifact: String, message: String },

    /// Two foreign types normalize to the same discriminator
    #[error("discriminator '{discriminator}' is produced by more than one type: {}", .types.join(", "))]
    DiscriminatorConflict {
        discriminator: String,
        types: Vec<String>,
    },

    /// Two sources map to one generated identifier
    #[error("generated {artifact} name '{name}' is produced by {}", .sources.join(", "))]
    GeneratedNameCollision {
        artifact: String,
        name: String,
        sources: Vec<String>,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GenError {
    pub fn schema_parse(file: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        GenError::SchemaParse {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn render(artifact: impl Into<String>, message: impl fmt::Display) -> Self {
        GenError::TemplateRender {
            artifact: artifact.into(),
            message: message.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short taxonomy name shown in the report.
    pub fn kind(&self) -> &'static str {
        match self {
            GenError::SchemaParse { .. } => "SchemaParseError",
            GenError::DuplicateOperationId { .. } => "DuplicateOperationIDError",
            GenError::PathConflict { .. } => "PathConflictError",
            GenError::MissingHandlers(_) => "MissingHandlerError",
            GenError::TemplateRender { .. } => "TemplateRenderError",
            GenError::DiscriminatorConflict { .. } => "DuplicateOperationIDError",
            GenError::GeneratedNameCollision { .. } => "GeneratedNameCollisionError",
            GenError::Config(_) => "ConfigError",
            GenError::Io { .. } => "IoError",
            GenError::Other(_) => "Error",
        }
    }
}

fn format_missing(missing: &[MissingHandler]) -> String {
    missing.iter().map(|m| format!("\n  {m}")).collect()
}

/// Errors and warnings collected across every stage of one run.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub errors: Vec<GenError>,
    pub warnings: Vec<String>,
}

impl BuildReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, err: GenError) {
        self.errors.push(err);
    }

    pub fn extend_errors(&mut self, errs: impl IntoIterator<Item = GenError>) {
        self.errors.extend(errs);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn extend_warnings(&mut self, messages: impl IntoIterator<Item = String>) {
        self.warnings.extend(messages);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// 0 on success (warnings allowed), 1 on any collected error.
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() {
            1
        } else {
            0
        }
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.warnings.is_empty() {
            writeln!(f, "{} warning(s):", self.warnings.len())?;
            for w in &self.warnings {
                writeln!(f, "  - {w}")?;
            }
        }
        if self.errors.is_empty() {
            return writeln!(f, "generation succeeded");
        }
        writeln!(f, "generation failed with {} error(s):", self.errors.len())?;
        for e in &self.errors {
            writeln!(f, "[{}] {}", e.kind(), e)?;
        }
        Ok(())
    }
}
