//! # Generator Module
//!
//! Renders the three artifacts derived from a [`UnifiedSpecification`] and
//! its route table:
//!
//! | Artifact | Emitter | One unit per operation |
//! |----------|---------|------------------------|
//! | router (Rust) | [`router`] | route-table entry bound to a handler or stub |
//! | CLI client (Rust, clap) | [`cli_client`] | kebab-case subcommand |
//! | scripting client (Python) | [`scripting`] | camelCase method |
//!
//! ## Determinism
//!
//! Each emitter is a pure function of its inputs. The route table is sorted
//! by path then method, every map rendered is ordered, and nothing
//! time- or environment-dependent is embedded, so regenerating from an
//! unchanged specification produces byte-identical files. [`write_atomic`]
//! then leaves such files untouched.
//!
//! ## Templates
//!
//! Artifacts are rendered from minijinja templates under `templates/`,
//! compiled into the binary and parsed once per [`TemplateCache`].
//!
//! [`UnifiedSpecification`]: crate::spec::UnifiedSpecification

pub mod cli_client;
pub mod naming;
pub mod router;
pub mod scripting;
mod templates;
mod write;

pub use naming::{
    check_all_generated_names, check_generated_names, check_parameter_identifiers, cli_field_ident,
    client_arg_ident, python_identifier, rust_identifier, split_words, to_camel_case,
    to_kebab_case, to_pascal_case, to_snake_case, GeneratedNames,
};
pub use router::parse_route_table;
pub use templates::TemplateCache;
pub use write::{write_atomic, WriteStatus};

use crate::error::GenError;
use crate::spec::{RouteEntry, UnifiedSpecification};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Router,
    Cli,
    ScriptingClient,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] =
        [ArtifactKind::Router, ArtifactKind::Cli, ArtifactKind::ScriptingClient];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Router => "router",
            ArtifactKind::Cli => "cli",
            ArtifactKind::ScriptingClient => "scripting-client",
        }
    }

    pub const fn template_name(&self) -> &'static str {
        match self {
            ArtifactKind::Router => "router.rs.jinja",
            ArtifactKind::Cli => "cli.rs.jinja",
            ArtifactKind::ScriptingClient => "client.py.jinja",
        }
    }

    /// Render this artifact's source text.
    pub fn render(
        &self,
        cache: &TemplateCache,
        spec: &UnifiedSpecification,
        routes: &[RouteEntry],
    ) -> Result<String, GenError> {
        match self {
            ArtifactKind::Router => router::render_router(cache, spec, routes),
            ArtifactKind::Cli => cli_client::render_cli(cache, spec, routes),
            ArtifactKind::ScriptingClient => scripting::render_client(cache, spec, routes),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One artifact written (or found unchanged) during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationArtifact {
    pub kind: ArtifactKind,
    pub output_path: PathBuf,
    pub status: WriteStatus,
}
