//! # specweave
//!
//! **specweave** is a specification-driven, multi-target code generator. It
//! reads declarative API-schema fragments, synthesizes more fragments from
//! foreign sources, merges everything into one unified specification,
//! checks that every declared handler exists on disk, and emits three
//! artifacts from a shared template system:
//!
//! - a request router (Rust route table)
//! - a command-line client (Rust, clap)
//! - a scripting client (Python)
//!
//! ## Architecture
//!
//! - **[`spec`]** - fragment loading, merging and the unified data model
//! - **[`synth`]** - schema synthesis from type declarations and component libraries
//! - **[`validator`]** - handler binding checks
//! - **[`generator`]** - naming, templates, emitters and the atomic writer
//! - **[`orchestrator`]** - the pipeline and its aggregated [`BuildReport`]
//! - **[`config`]** - TOML build configuration
//! - **[`cli`]** - the `specweave-gen` front end
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant User
//!     participant CLI as CLI<br/>(specweave-gen)
//!     participant Orch as BuildOrchestrator
//!     participant Load as spec::load_fragments
//!     participant Synth as synth::*
//!     participant Merge as spec::merge_fragments
//!     participant Val as validator
//!     participant Gen as generator
//!     participant FS as File System
//!
//!     User->>CLI: specweave-gen generate --config specweave.toml
//!     CLI->>Orch: run(Generate)
//!     par
//!         Orch->>Load: schema directory
//!     and
//!         Orch->>Synth: type declarations
//!     and
//!         Orch->>Synth: component sources
//!     end
//!     Orch->>Orch: order_fragments (stable load order)
//!     Orch->>Merge: fragments
//!     Merge-->>Orch: UnifiedSpecification + collisions
//!     Orch->>Val: handler bindings
//!     Val-->>Orch: stubs / MissingHandlers
//!     Orch->>Gen: render router, cli, client
//!     Gen->>FS: temp file + rename
//!     Orch-->>CLI: BuildOutcome
//!     CLI-->>User: report + exit code
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use specweave::{BuildConfig, BuildOrchestrator, RunMode};
//!
//! let config = BuildConfig::load("specweave.toml".as_ref())?;
//! let outcome = BuildOrchestrator::new(config).run(RunMode::Generate);
//! eprintln!("{}", outcome.report);
//! std::process::exit(outcome.exit_code());
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod orchestrator;
pub mod spec;
pub mod synth;
pub mod validator;

pub use config::BuildConfig;
pub use error::{BuildReport, GenError, GenResult};
pub use orchestrator::{BuildOrchestrator, BuildOutcome, RunMode};
