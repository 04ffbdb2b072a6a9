use anyhow::{Context, Result};
use clap::Parser;
use metricsheet_core::{Generator, MetricsheetConfig};
use std::fs;
use std::path::PathBuf;

mod formatter;

#[derive(Parser)]
#[command(name = "metricsheet")]
#[command(about = "Regenerate the dashboard data file from back-office exports", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the source workbooks and CSV feeds
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Artifact to write (also read as the previous run's output)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Ignore the existing artifact instead of merging with it
    #[arg(long)]
    no_reconcile: bool,

    /// Print the summary without writing the artifact
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        MetricsheetConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
    } else {
        // Try to load default config from current directory if it exists
        let default_config_path = PathBuf::from("metricsheet.toml");
        if default_config_path.exists() {
            MetricsheetConfig::from_file(&default_config_path).with_context(|| {
                format!(
                    "Failed to load config from {}",
                    default_config_path.display()
                )
            })?
        } else {
            MetricsheetConfig::default()
        }
    };

    config.validate().context("Invalid configuration")?;

    let data_dir = cli.data_dir.unwrap_or_else(|| config.paths.data_dir.clone());
    let output = cli.output.unwrap_or_else(|| config.paths.output.clone());

    let previous = if cli.no_reconcile || !output.exists() {
        None
    } else {
        match fs::read_to_string(&output) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("cannot read previous artifact {}: {}", output.display(), e);
                None
            }
        }
    };

    let generator = Generator::with_config(config);
    let generated_at = chrono::Local::now().naive_local();
    let outcome = generator
        .run(&data_dir, previous.as_deref(), generated_at)
        .context("Failed to render the artifact")?;

    if !cli.dry_run {
        fs::write(&output, &outcome.artifact)
            .with_context(|| format!("Failed to write artifact: {}", output.display()))?;
    }

    formatter::print_human(&data_dir, &output, &outcome, cli.dry_run);

    Ok(())
}
