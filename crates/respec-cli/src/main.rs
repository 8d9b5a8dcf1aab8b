//! respec command line

mod replay;
mod script;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use respec_core::{ArtifactManager, EngineConfig};
use respec_knowledge::Catalog;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("respec")
        .version(respec_core::VERSION)
        .about("Specification artifact engine")
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("validate")
                .about("Load and validate a knowledge catalog")
                .arg(
                    Arg::new("catalog")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Catalog file (.json, .yaml or .yml)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("replay")
                .about("Replay a scripted session against a catalog")
                .arg(
                    Arg::new("catalog")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Catalog file (.json, .yaml or .yml)"),
                )
                .arg(
                    Arg::new("script")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Script file (.json, .yaml or .yml)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Engine configuration (TOML)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    let result = match matches.subcommand() {
        Some(("validate", args)) => validate(args),
        Some(("replay", args)) => replay(args),
        _ => Ok(true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing argument <{name}>"))
}

fn validate(args: &ArgMatches) -> anyhow::Result<bool> {
    let path = path_arg(args, "catalog")?;
    let catalog = match Catalog::from_path(path) {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "invalid catalog");
            if args.get_flag("json") {
                println!(
                    "{}",
                    serde_json::json!({ "valid": false, "error": err.to_string() })
                );
            } else {
                println!("Catalog {} is invalid: {err}", path.display());
            }
            return Ok(false);
        }
    };

    if args.get_flag("json") {
        let report = serde_json::json!({
            "valid": true,
            "scenarios": catalog.scenario_count(),
            "requirements": catalog.requirement_count(),
            "specifications": catalog.specification_count(),
            "exclusions": catalog.exclusion_count(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Catalog {} is valid", path.display());
        println!("  Scenarios: {}", catalog.scenario_count());
        println!("  Requirements: {}", catalog.requirement_count());
        println!("  Specifications: {}", catalog.specification_count());
        println!("  Exclusion groups: {}", catalog.exclusion_count());
    }
    Ok(true)
}

fn replay(args: &ArgMatches) -> anyhow::Result<bool> {
    let catalog_path = path_arg(args, "catalog")?;
    let catalog = Catalog::from_path(catalog_path)
        .with_context(|| format!("failed to load catalog {}", catalog_path.display()))?;
    let script = script::Script::from_path(path_arg(args, "script")?)?;
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let mut manager = ArtifactManager::with_config(Arc::new(catalog), config);
    let reports = replay::replay(&mut manager, &script)?;
    let status = manager.status();

    if args.get_flag("json") {
        let output = serde_json::json!({
            "steps": reports,
            "status": status,
            "canonical": manager.canonical().specifications().collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for report in &reports {
            println!("[{}] {}: {}", report.index, report.step, report.detail);
            if let Some(prompt) = &report.prompt {
                println!("    ? {}", prompt.description);
                for option in &prompt.options {
                    println!("      {}: {} ({})", option.id, option.label, option.outcome);
                }
            }
        }
        println!();
        println!("Final status: {status}");
        for spec in manager.canonical().specifications() {
            println!("  {} = {}", spec.name, spec.display_value());
        }
    }

    if status.blocked {
        tracing::warn!(active = status.active_count, "session ended blocked");
    }
    Ok(!status.blocked)
}
