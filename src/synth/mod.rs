//! # Schema Synthesis
//!
//! Turns sources that are not schema documents into [`SchemaFragment`]s the
//! merger treats like any hand-written fragment:
//!
//! - [`typedefs`] scans foreign type declarations into a single operation
//!   accepting a discriminated union of those types
//! - [`components`] extracts component capability specs from a component
//!   library's source code
//!
//! Both are independent of each other and of fragment loading, so the
//! orchestrator runs them concurrently.

pub mod category;
pub mod components;
mod text;
pub mod typedefs;

pub use category::{CategoryClassifier, KeywordClassifier, KeywordRule};
pub use components::{
    components_fragment, extract_components, scan_component_sources, ComponentCapabilitySpec,
    PropertySpec,
};
pub use typedefs::{normalize_type_name, scan_type_definitions, TypeDeclaration, TypeScanOptions};

use crate::error::GenError;
use crate::spec::SchemaFragment;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Result of one synthesis pass.
#[derive(Debug, Default)]
pub struct SynthOutput {
    pub fragment: Option<SchemaFragment>,
    pub warnings: Vec<String>,
    pub errors: Vec<GenError>,
}

/// Every file under the configured source directory `dir`, sorted by path.
///
/// `None` when `dir` is not a directory. Entries the walk cannot read are
/// reported as [`GenError::Config`] and skipped.
pub(crate) fn source_files(dir: &Path, errors: &mut Vec<GenError>) -> Option<Vec<PathBuf>> {
    if !dir.is_dir() {
        errors.push(GenError::Config(format!(
            "synthesis source {} is not a directory",
            dir.display()
        )));
        return None;
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "unreadable synthesis source entry");
                errors.push(GenError::Config(format!("{}: {e}", dir.display())));
            }
        }
    }
    files.sort();
    Some(files)
}
