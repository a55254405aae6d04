//! Unit tests for CLI commands

use crate::cli::{run_cli, Cli, Commands, PolicyArg};
use crate::spec::CollisionPolicy;
use clap::Parser;
use std::path::PathBuf;

#[test]
fn test_generate_command_with_flags() {
    let cli = Cli::try_parse_from([
        "specweave-gen",
        "generate",
        "--schemas",
        "schemas",
        "-o",
        "out",
        "--strict",
        "--collision-policy",
        "error",
    ])
    .unwrap();

    match cli.command {
        Commands::Generate { build } => {
            assert_eq!(build.schemas, Some(PathBuf::from("schemas")));
            assert_eq!(build.out_dir, Some(PathBuf::from("out")));
            assert!(build.strict);
            assert_eq!(build.collision_policy, Some(PolicyArg::Error));
        }
        _ => panic!("Expected Generate command"),
    }
}

#[test]
fn test_inspect_json_and_global_log_level() {
    let cli =
        Cli::try_parse_from(["specweave-gen", "inspect", "--json", "--log-level", "debug"]).unwrap();
    assert_eq!(cli.log_level.as_deref(), Some("debug"));
    assert!(matches!(cli.command, Commands::Inspect { json: true, .. }));
}

#[test]
fn test_unknown_collision_policy_is_rejected() {
    let res =
        Cli::try_parse_from(["specweave-gen", "validate", "--collision-policy", "first-wins"]);
    assert!(res.is_err());
}

#[test]
fn test_flags_override_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("specweave.toml");
    std::fs::write(
        &config_path,
        "auto-routing = true\n[paths]\nschemas = \"from-config\"\nout-dir = \"gen\"\n",
    )
    .unwrap();
    let cli = Cli::try_parse_from([
        "specweave-gen",
        "generate",
        "--config",
        config_path.to_str().unwrap(),
        "--schemas",
        "override",
        "--no-router",
        "--collision-policy",
        "error",
    ])
    .unwrap();
    let Commands::Generate { build } = cli.command else {
        panic!("Expected Generate command");
    };
    let config = build.to_config().unwrap();
    assert_eq!(config.paths.schemas, Some(PathBuf::from("override")));
    assert_eq!(config.paths.out_dir, dir.path().join("gen"));
    assert!(!config.auto_routing);
    assert_eq!(config.collision_policy, CollisionPolicy::Error);
}

#[test]
fn test_missing_schema_directory_exits_non_zero() {
    let cli = Cli::try_parse_from(["specweave-gen", "validate"]).unwrap();
    assert_eq!(run_cli(cli).unwrap(), 1);
}
