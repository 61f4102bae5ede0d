//! Command-line interface for batch gaze calibration-error analysis.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gazecal_core::AnalysisConfig;
use gazecal_pipeline::{read_json, run_batch, write_json_atomic, FailureRecord, SubjectInput};

#[derive(Parser)]
#[command(name = "gazecal")]
#[command(about = "Analyze eye-tracking calibration error and fit drift corrections")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more subject bundles.
    Analyze(AnalyzeArgs),

    /// Print the default configuration as JSON.
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct AnalyzeArgs {
    /// Path to a subject bundle JSON (repeat for more subjects).
    #[arg(long = "subject", required = true)]
    subjects: Vec<PathBuf>,

    /// Directory to write analysis artifacts into.
    #[arg(long)]
    out: PathBuf,

    /// Optional configuration JSON. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    let config = match path {
        Some(path) => read_json(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn run_analyze(args: &AnalyzeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let mut inputs = Vec::with_capacity(args.subjects.len());
    for path in &args.subjects {
        let input: SubjectInput = read_json(path)
            .with_context(|| format!("reading subject bundle {}", path.display()))?;
        inputs.push(input);
    }

    let batch = run_batch(&inputs, &config);

    let mut failures: Vec<FailureRecord> = Vec::new();
    for subject in &batch.subjects {
        let dir = args.out.join(&subject.subject);
        write_json_atomic(
            &dir.join("processed_gaze_points.json"),
            &subject.error_artifact(&config.markers),
        )?;
        write_json_atomic(
            &dir.join("session_averages.json"),
            &subject.averages_artifact(&config.markers),
        )?;
        write_json_atomic(&dir.join("statistics.json"), &subject.statistics)?;

        tracing::info!(
            subject = %subject.subject,
            sessions = subject.sessions.len(),
            failures = subject.failures.len(),
            "subject complete"
        );
        failures.extend(subject.failures.iter().cloned());
    }

    write_json_atomic(&args.out.join("failures.json"), &failures)?;
    if !failures.is_empty() {
        tracing::warn!(
            count = failures.len(),
            "some subjects or sessions were skipped, see failures.json"
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::DefaultConfig => {
            println!(
                "{}",
                serde_json::to_string_pretty(&AnalysisConfig::default())?
            );
            Ok(())
        }
    }
}
