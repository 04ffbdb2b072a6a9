//! Console summary of a run

use colored::*;
use metricsheet_core::{DatasetKind, FileStatus, PreviousStatus, ReconcileReport, RunOutcome};
use std::path::Path;

/// Print the run summary in human-readable format with colors
pub fn print_human(data_dir: &Path, output: &Path, outcome: &RunOutcome, dry_run: bool) {
    println!("{}", format!("Sources: {}", data_dir.display()).bold());
    println!();

    if outcome.files.is_empty() {
        println!("{}", "No source files found".yellow().bold());
    } else {
        println!("{}", "Files:".bold().underline());
        for file in &outcome.files {
            let name = file
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.path.display().to_string());
            match &file.status {
                FileStatus::Extracted(stats) => {
                    let skipped = if stats.skipped > 0 {
                        format!(" ({} skipped)", stats.skipped).bright_black().to_string()
                    } else {
                        String::new()
                    };
                    println!(
                        "  {} [{}] {}: {} records{}",
                        "OK".green().bold(),
                        file.source.bright_black(),
                        name,
                        stats.records,
                        skipped
                    );
                }
                FileStatus::Failed(reason) => {
                    println!(
                        "  {} [{}] {}: {}",
                        "FAIL".red().bold(),
                        file.source.bright_black(),
                        name,
                        reason
                    );
                }
            }
        }
    }
    println!();

    print_previous(&outcome.previous, &outcome.reconcile);

    println!("{}", "Datasets:".bold().underline());
    for (kind, dataset) in outcome.datasets.iter() {
        print_dataset(kind, dataset.len(), outcome.reconcile.filled_count(kind));
    }
    if !outcome.reconcile.carried_groups.is_empty() {
        println!(
            "  {} {} breakdown groups carried forward",
            "+".cyan(),
            outcome.reconcile.carried_groups.len()
        );
    }
    println!();

    let size = outcome.artifact.len();
    if dry_run {
        println!(
            "{} {} ({} bytes)",
            "Dry run, not written:".yellow().bold(),
            output.display(),
            size
        );
    } else {
        println!(
            "{} {} ({} bytes)",
            "✓ Wrote".green().bold(),
            output.display(),
            size
        );
    }
}

fn print_previous(previous: &PreviousStatus, report: &ReconcileReport) {
    match previous {
        PreviousStatus::Missing => {
            println!("{} none", "Previous artifact:".bold());
        }
        PreviousStatus::Loaded { datasets, problems } => {
            let problems = if *problems > 0 {
                format!(", {} unusable", problems).yellow().to_string()
            } else {
                String::new()
            };
            println!("{} {} datasets{}", "Previous artifact:".bold(), datasets, problems);
            if let Some(names) = not_reconciled(report) {
                println!("  {} {}", "Not reconciled:".yellow(), names);
            }
        }
    }
    println!();
}

/// Datasets the previous artifact could not supply, if any
fn not_reconciled(report: &ReconcileReport) -> Option<String> {
    if report.unavailable.is_empty() {
        return None;
    }
    let names: Vec<&str> = report.unavailable.iter().map(|k| k.const_name()).collect();
    Some(names.join(", "))
}

fn print_dataset(kind: DatasetKind, periods: usize, filled: usize) {
    let filled = if filled > 0 {
        format!(" ({} from previous)", filled).cyan().to_string()
    } else {
        String::new()
    };
    println!(
        "  {} {:<8} {} periods{}",
        format!("{:<16}", kind.const_name()).bold(),
        kind.label(),
        periods,
        filled
    );
}
