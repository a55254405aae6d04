//! # CLI Module
//!
//! Command-line front end of `specweave-gen`.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Run the whole pipeline and write the enabled artifacts:
//!
//! ```bash
//! specweave-gen generate --config specweave.toml
//! specweave-gen generate --schemas schemas --out-dir generated --strict
//! ```
//!
//! ### `validate`
//!
//! Load, merge and validate; write nothing. Exit code 1 on any fatal
//! finding.
//!
//! ### `inspect`
//!
//! Print the route table with the subcommand, client method and handler
//! derived for each operation (`--json` for machine-readable output).
//!
//! ### `synth`
//!
//! Print the fragments synthesized from `--type-definitions` and
//! `--component-sources` as YAML.
//!
//! Every command accepts `--config <FILE>` plus flags that override it;
//! see [`BuildArgs`].

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, BuildArgs, Cli, Commands, PolicyArg, RouteSummary};
