use crate::config::BuildConfig;
use crate::error::GenError;
use crate::generator::GeneratedNames;
use crate::orchestrator::{BuildOrchestrator, BuildOutcome, RunMode};
use crate::spec::{CollisionPolicy, RouteEntry};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

/// Command-line interface for the specweave generator
#[derive(Parser, Debug)]
#[command(name = "specweave-gen", version)]
#[command(about = "Merge schema fragments and generate a router, a CLI client and a scripting client")]
pub struct Cli {
    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline and write all enabled artifacts
    Generate {
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Load, merge and validate without writing anything
    Validate {
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Print the route table with every generated name
    Inspect {
        #[command(flatten)]
        build: BuildArgs,

        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the synthesized fragments as YAML
    Synth {
        #[command(flatten)]
        build: BuildArgs,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    LastWriterWins,
    Error,
}

impl From<PolicyArg> for CollisionPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::LastWriterWins => CollisionPolicy::LastWriterWins,
            PolicyArg::Error => CollisionPolicy::Error,
        }
    }
}

/// Options shared by every subcommand. Flags override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Build configuration file (TOML)
    #[arg(short, long, env = "SPECWEAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory of hand-written schema fragments
    #[arg(short, long)]
    pub schemas: Option<PathBuf>,

    /// Directory handler files are resolved against
    #[arg(long)]
    pub handler_root: Option<PathBuf>,

    /// Output directory for generated artifacts
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Directory of foreign type declarations to synthesize from
    #[arg(long)]
    pub type_definitions: Option<PathBuf>,

    /// Directory of component-library sources to synthesize from
    #[arg(long)]
    pub component_sources: Option<PathBuf>,

    /// Missing handlers fail the build; bound files must mention the function
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Missing handler files fail the build
    #[arg(long, default_value_t = false)]
    pub fail_on_missing_handlers: bool,

    /// Do not emit the router
    #[arg(long, default_value_t = false)]
    pub no_router: bool,

    /// Skip handler validation entirely
    #[arg(long, default_value_t = false)]
    pub skip_handler_validation: bool,

    /// How same-path-same-method collisions are resolved
    #[arg(long, value_enum)]
    pub collision_policy: Option<PolicyArg>,
}

impl BuildArgs {
    /// Config file (if any) with command-line overrides applied.
    pub fn to_config(&self) -> Result<BuildConfig, GenError> {
        let mut config = match &self.config {
            Some(path) => BuildConfig::load(path)?,
            None => BuildConfig::default(),
        };
        let paths = &mut config.paths;
        if let Some(p) = &self.schemas {
            paths.schemas = Some(p.clone());
        }
        if let Some(p) = &self.handler_root {
            paths.handler_root = p.clone();
        }
        if let Some(p) = &self.out_dir {
            paths.out_dir = p.clone();
        }
        if let Some(p) = &self.type_definitions {
            paths.type_definitions = Some(p.clone());
        }
        if let Some(p) = &self.component_sources {
            paths.component_sources = Some(p.clone());
        }
        config.strict_validation |= self.strict;
        config.fail_on_missing_handlers |= self.fail_on_missing_handlers;
        if self.no_router {
            config.auto_routing = false;
        }
        if self.skip_handler_validation {
            config.handler_validation = false;
        }
        if let Some(policy) = self.collision_policy {
            config.collision_policy = policy.into();
        }
        Ok(config)
    }
}

/// One row of `inspect` output.
#[derive(Debug, Serialize)]
pub struct RouteSummary {
    pub method: String,
    pub path: String,
    pub operation_id: String,
    pub subcommand: String,
    pub client_method: String,
    pub handler: String,
    pub stub: bool,
}

impl From<&RouteEntry> for RouteSummary {
    fn from(route: &RouteEntry) -> Self {
        let names = GeneratedNames::for_operation(&route.operation_id);
        RouteSummary {
            method: route.method.to_string(),
            path: route.path.clone(),
            operation_id: route.operation_id.clone(),
            subcommand: names.subcommand,
            client_method: names.client_method,
            handler: route
                .handler
                .as_ref()
                .map(|b| format!("{}#{}", b.file.display(), b.function))
                .unwrap_or_else(|| "-".to_string()),
            stub: route.stub,
        }
    }
}

fn print_report(outcome: &BuildOutcome) {
    eprintln!("{}", outcome.report);
}

/// Run a parsed command line and return the process exit code.
///
/// # Errors
///
/// Returns an error only for failures outside the generator pipeline
/// (serializing `inspect`/`synth` output). Pipeline failures are reported
/// and turned into a non-zero exit code.
pub fn run_cli(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Generate { build } => {
            let orchestrator = match build.to_config() {
                Ok(config) => BuildOrchestrator::new(config),
                Err(e) => return Ok(config_failure(e)),
            };
            let outcome = orchestrator.run(RunMode::Generate);
            for artifact in &outcome.artifacts {
                println!(
                    "{:<17} {} ({:?})",
                    artifact.kind.as_str(),
                    artifact.output_path.display(),
                    artifact.status
                );
            }
            print_report(&outcome);
            Ok(outcome.exit_code())
        }
        Commands::Validate { build } => {
            let orchestrator = match build.to_config() {
                Ok(config) => BuildOrchestrator::new(config),
                Err(e) => return Ok(config_failure(e)),
            };
            let outcome = orchestrator.run(RunMode::Validate);
            if let Some(spec) = &outcome.spec {
                println!(
                    "{} operation(s) across {} path(s)",
                    spec.operation_count(),
                    spec.paths.len()
                );
            }
            print_report(&outcome);
            Ok(outcome.exit_code())
        }
        Commands::Inspect { build, json } => {
            let orchestrator = match build.to_config() {
                Ok(config) => BuildOrchestrator::new(config),
                Err(e) => return Ok(config_failure(e)),
            };
            let outcome = orchestrator.run(RunMode::Validate);
            let rows: Vec<RouteSummary> = outcome.routes.iter().map(RouteSummary::from).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for r in &rows {
                    println!(
                        "{:<7} {:<40} {:<28} {:<28} {:<28} {}{}",
                        r.method,
                        r.path,
                        r.operation_id,
                        r.subcommand,
                        r.client_method,
                        r.handler,
                        if r.stub { " [stub]" } else { "" }
                    );
                }
            }
            print_report(&outcome);
            Ok(outcome.exit_code())
        }
        Commands::Synth { build } => {
            let orchestrator = match build.to_config() {
                Ok(config) => BuildOrchestrator::new(config),
                Err(e) => return Ok(config_failure(e)),
            };
            let outputs = match orchestrator.synthesize() {
                Ok(outputs) => outputs,
                Err(e) => return Ok(config_failure(e)),
            };
            let mut failed = false;
            for out in outputs {
                for w in &out.warnings {
                    eprintln!("warning: {w}");
                }
                for e in &out.errors {
                    eprintln!("[{}] {e}", e.kind());
                    failed = true;
                }
                if let Some(fragment) = out.fragment {
                    println!("# fragment: {} ({})", fragment.name, fragment.source_path.display());
                    println!("{}", serde_yaml::to_string(&fragment.document)?);
                }
            }
            Ok(i32::from(failed))
        }
    }
}

fn config_failure(e: GenError) -> i32 {
    eprintln!("[{}] {e}", e.kind());
    1
}
