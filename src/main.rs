use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use massing3d::io::json::{read_request, to_json_string, write_evaluation};
use massing3d::io::stl::{StlFormat, write_stl};
use massing3d::rules::evaluate;
use massing3d::solar::compute_solar_profile;
use massing3d::{EngineConfig, Evaluation, Expression, State, run_evaluation};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Zoning-constrained massing options, ranked, with a solar profile.
#[derive(Parser)]
#[command(name = "massing3d", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a project request and print or save the ranked options.
    Evaluate {
        /// Evaluation request (JSON).
        request: PathBuf,
        /// Engine configuration (JSON); built-in defaults when absent.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Where to write the evaluation; stdout when absent.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Directory for one binary STL per option.
        #[arg(long)]
        stl_dir: Option<PathBuf>,
    },
    /// Print the solar profile of a location on a date.
    Solar {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Date as YYYY-MM-DD.
        #[arg(long)]
        date: NaiveDate,
        /// Comma-separated hours (0-23).
        #[arg(long, value_delimiter = ',')]
        hours: Vec<u32>,
    },
    /// Evaluate one rule expression against a state.
    CheckRule {
        /// Expression as JSON, e.g. '{"op":"lte","field":"far","value":400}'.
        #[arg(long)]
        expression: String,
        /// State as a JSON object of metric values, e.g. '{"far":380}'.
        #[arg(long)]
        state: String,
    },
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json_file(path),
        None => Ok(EngineConfig::new()),
    }
}

fn export_stl(dir: &Path, evaluation: &Evaluation) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    for option in &evaluation.options {
        let name = format!("rank{}_{}", option.rank, option.option_type);
        let path = dir.join(format!("{name}.stl"));
        write_stl(&path, &option.mesh_payload, &name, StlFormat::Binary)?;
        info!(path = %path.display(), "wrote STL");
    }
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("massing3d=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Evaluate {
            request,
            config,
            output,
            stl_dir,
        } => {
            let config = load_config(config.as_deref())?;
            let request = read_request(&request)?;
            let evaluation = run_evaluation(&request, &config)
                .with_context(|| format!("Evaluation of project {} failed", request.project.id))?;

            match output {
                Some(path) => {
                    write_evaluation(&path, &evaluation)?;
                    info!(path = %path.display(), "wrote evaluation");
                }
                None => println!("{}", to_json_string(&evaluation)?),
            }
            if let Some(dir) = stl_dir {
                export_stl(&dir, &evaluation)?;
            }
        }
        Command::Solar {
            lat,
            lng,
            date,
            hours,
        } => {
            let config = EngineConfig::new();
            let hours = if hours.is_empty() {
                config.default_hours.clone()
            } else {
                hours
            };
            let samples = compute_solar_profile(lat, lng, date, &hours, &config)?;
            println!("{}", serde_json::to_string_pretty(&samples)?);
        }
        Command::CheckRule { expression, state } => {
            let expression: Expression =
                serde_json::from_str(&expression).context("Failed to parse rule expression")?;
            let values: BTreeMap<String, f64> =
                serde_json::from_str(&state).context("Failed to parse state")?;
            let (passed, detail) = evaluate(&expression, &State::from_named(values));
            println!(
                "{}",
                serde_json::json!({ "passed": passed, "detail": detail })
            );
        }
    }
    Ok(())
}
