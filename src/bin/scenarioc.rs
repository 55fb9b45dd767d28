//! Scenario compiler CLI
//!
//! # Usage
//!
//! ```bash
//! # Compile a notation or JSON scenario to a robot script
//! scenarioc compile traffic_light.scn
//! scenarioc compile traffic_light.json --config compiler.yaml
//!
//! # Convert between the two source forms
//! scenarioc notation traffic_light.json
//! scenarioc json traffic_light.scn
//! ```
//!
//! Set `RUST_LOG=robot_scenario=debug` to trace each generated fragment.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use robot_scenario::{generate_with, ConfigLoader, ScenarioFile};

#[derive(Parser)]
#[command(name = "scenarioc")]
#[command(version)]
#[command(about = "Compile robot scenarios into robot scripts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Compiler config (YAML); falls back to $SCENARIO_CONFIG, then defaults
    #[arg(long, short, global = true, env = "SCENARIO_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a scenario (.json or notation) to a robot script
    Compile {
        file: PathBuf,
    },

    /// Print a JSON scenario in notation form
    Notation {
        file: PathBuf,
    },

    /// Print a notation scenario as pretty JSON
    Json {
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Compile { file } => cmd_compile(file, cli.config.as_deref()),
        Commands::Notation { file } => load(file).map(|s| s.to_notation()),
        Commands::Json { file } => cmd_json(file),
    };

    match result {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn cmd_compile(file: &Path, config: Option<&Path>) -> Result<String> {
    let config = ConfigLoader::load(config)?;
    let scenario = load(file)?;
    generate_with(&scenario, &config)
        .with_context(|| format!("Failed to compile {}", file.display()))
}

fn cmd_json(file: &Path) -> Result<String> {
    let mut json = load(file)?.to_json_pretty()?;
    json.push('\n');
    Ok(json)
}

/// Read a scenario, choosing the decoder by extension.
fn load(path: &Path) -> Result<ScenarioFile> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let scenario = if is_json {
        ScenarioFile::from_json(&source)
    } else {
        ScenarioFile::from_notation(&source)
    };
    scenario.with_context(|| format!("Failed to load '{}'", path.display()))
}
