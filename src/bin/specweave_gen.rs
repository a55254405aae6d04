use clap::Parser;
use specweave::cli::{run_cli, Cli};
use specweave::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_config = LogConfig::from_env().with_level(cli.log_level.as_deref());
    init_logging(&log_config)?;
    let code = run_cli(cli)?;
    std::process::exit(code);
}
