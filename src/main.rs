use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use patient_risk::{input, report, PatientRecords, PatientSummary, RiskEngine, RuleConfig};

#[derive(Parser)]
#[command(name = "patient-risk")]
#[command(about = "Rule-based risk summaries from adherence, vitals and exam records", long_about = None)]
struct Cli {
    /// JSON file overriding any part of the default rule table
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the patient summary as JSON
    Summarize {
        #[command(flatten)]
        source: Source,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        source: Source,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Print the effective rule table as JSON
    Defaults,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("records")
        .args(["input", "patient_id"])
        .required(true)
        .multiple(false)
))]
struct Source {
    /// JSON bundle with patient_id, reminders, vitals and exams
    #[arg(long)]
    input: Option<PathBuf>,
    /// Patient the CSV files belong to
    #[arg(long)]
    patient_id: Option<Uuid>,
    #[arg(long, requires = "patient_id")]
    reminders: Option<PathBuf>,
    #[arg(long, requires = "patient_id")]
    vitals: Option<PathBuf>,
    #[arg(long, requires = "patient_id")]
    exams: Option<PathBuf>,
    /// Evaluate as of this RFC 3339 instant instead of the current time
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

impl Source {
    fn load(&self) -> anyhow::Result<PatientRecords> {
        match (&self.input, self.patient_id) {
            (Some(path), _) => input::load_bundle(path),
            (None, Some(patient_id)) => input::load_csv_records(
                patient_id,
                self.reminders.as_deref(),
                self.vitals.as_deref(),
                self.exams.as_deref(),
            ),
            (None, None) => anyhow::bail!("either --input or --patient-id is required"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RuleConfig::default(),
    };

    match cli.command {
        Commands::Summarize {
            source,
            out,
            pretty,
        } => {
            let summary = summarize(config, &source)?;

            let json = if pretty {
                serde_json::to_string_pretty(&summary)?
            } else {
                serde_json::to_string(&summary)?
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Summary written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Report { source, out } => {
            let summary = summarize(config, &source)?;
            let report = report::build_report(&summary);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Defaults => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn summarize(config: RuleConfig, source: &Source) -> anyhow::Result<PatientSummary> {
    let engine = RiskEngine::new(config).context("invalid rule configuration")?;
    let records = source.load()?;
    let now = source.now.unwrap_or_else(Utc::now);
    engine
        .summarize(&records, now)
        .context("failed to summarize patient records")
}

fn load_config(path: &Path) -> anyhow::Result<RuleConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    RuleConfig::from_json_str(&contents)
        .with_context(|| format!("invalid rule configuration in {}", path.display()))
}
