//! realeffectc - evaluate a mission file against a synthetic evidence scenario.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use realeffect_core::{
    evaluate_scenario, EvaluationResult, MissionSpec, RuleSet, DEFAULT_SCENARIO, VERSION,
};
use tracing_subscriber::EnvFilter;

/// Exit code for an evaluation that completed but rejected the mission.
const EXIT_MISSION_INVALID: u8 = 2;

/// realeffectc - RealEffect mission evaluation
#[derive(Parser, Debug)]
#[command(name = "realeffectc")]
#[command(version = VERSION, about, long_about = None, disable_version_flag = true)]
#[command(after_help = "Scenarios: all-accepted (default), missing-proof, low-acceptance")]
struct Cli {
    /// Mission file (.reff/.yaml/.yml or .json)
    mission_file: PathBuf,

    /// Evidence scenario to evaluate
    #[arg(default_value = DEFAULT_SCENARIO)]
    scenario: String,

    /// Rule set file overriding the default thresholds
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Print the evaluation result as JSON
    #[arg(long)]
    json: bool,

    /// Exit with status 2 when the mission is not valid
    #[arg(long)]
    strict: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let outcome = run(&cli);
    if let Err(e) = &outcome {
        eprintln!("error: {:#}", e);
    }
    ExitCode::from(exit_status(&cli, &outcome))
}

fn exit_status(cli: &Cli, outcome: &Result<EvaluationResult>) -> u8 {
    match outcome {
        Ok(result) if cli.strict && !result.valid => EXIT_MISSION_INVALID,
        Ok(_) => 0,
        Err(_) => 1,
    }
}

fn run(cli: &Cli) -> Result<EvaluationResult> {
    let mission_path = absolute(&cli.mission_file)?;

    let rules = match &cli.rules {
        Some(path) => RuleSet::from_file(path)
            .with_context(|| format!("loading rule set {}", path.display()))?,
        None => RuleSet::default(),
    };

    let spec = MissionSpec::from_file(&mission_path)
        .with_context(|| format!("loading mission file {}", mission_path.display()))?;

    let result = evaluate_scenario(&spec, &cli.scenario, &rules)
        .context("spec is INVALID (RealEffect core)")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&mission_path, &cli.scenario, &spec, &result);
    }

    Ok(result)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("resolving path {}", path.display()))
}

fn print_report(path: &Path, scenario: &str, spec: &MissionSpec, result: &EvaluationResult) {
    println!("RealEffect CLI - core engine v{}", VERSION);
    println!("Mission file: {}", path.display());
    println!("Mission     : {} ({})", spec.mission_id, spec.context.title);
    if !spec.participants.is_empty() {
        let roles: Vec<String> = spec.participants.iter().map(|r| r.to_string()).collect();
        println!("Roles       : {}", roles.join(", "));
    }
    println!("Scenario    : {}", scenario);
    println!("Spec is structurally VALID (RealEffect core).");
    println!(
        "Evaluation result: valid={} ratio={:.2} accepted={:.2} rejected={:.2}",
        result.valid, result.ratio, result.accepted_weight, result.rejected_weight
    );
    println!("Reason: {}", result.reason);
}
