// src/pipeline.rs

use crate::activity::count_activity;
use crate::ancestry::GitOracle;
use crate::checkout::CheckoutCache;
use crate::model::PullRequest;
use crate::provider::CommitSetProvider;
use crate::report::{CsvReport, ReportRow};
use crate::resolver::{file_versions, resolve, Heuristic, Strict};
use crate::snapshots::write_snapshots;
use crate::stats::ChangeStats;
use anyhow::{Context, Result};
use chrono::Duration;
use indicatif::ProgressBar;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct MiningOptions {
    /// Length of the trailing activity window before merge or close
    pub window_days: i64,
    /// Where to write file versions; `None` disables diff extraction
    pub diff_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Failure {
    pub pull_request: u64,
    pub github_id: u64,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Summary {
    pub processed: usize,
    pub failures: Vec<Failure>,
}

/// Processes every pull request of the provider, writing one report row each.
/// A failing pull request is reported on stderr and skipped; the batch goes on.
pub fn run<W: Write>(
    provider: &dyn CommitSetProvider,
    checkouts: &CheckoutCache,
    options: &MiningOptions,
    report: &mut CsvReport<W>,
) -> Result<Summary> {
    let pull_requests = provider.pull_requests()?;
    info!("Processing {} pull requests of {}", pull_requests.len(), provider.project());

    let bar = ProgressBar::new(pull_requests.len() as u64);
    bar.set_message("Mining pull requests");

    let mut summary = Summary::default();
    for pr in &pull_requests {
        match process(pr, checkouts, options) {
            Ok(row) => {
                report.write_row(&row).context("Failed to write report row")?;
                summary.processed += 1;
            }
            Err(e) => {
                warn!(pull_request = pr.id, github_id = pr.github_id, "{:#}", e);
                bar.suspend(|| eprintln!("Error processing pull_request {}: {:#}", pr.github_id, e));
                summary.failures.push(Failure { pull_request: pr.id, github_id: pr.github_id, message: format!("{:#}", e) });
            }
        }
        bar.inc(1);
    }
    bar.finish_with_message("Mining complete");

    info!(
        "{} pull requests processed, {} failed, {} checkout refreshes",
        summary.processed,
        summary.failures.len(),
        checkouts.refreshes()
    );
    for failure in &summary.failures {
        debug!(pull_request = failure.pull_request, github_id = failure.github_id, "skipped: {}", failure.message);
    }
    Ok(summary)
}

/// Report row for one pull request; also extracts file versions when asked to.
pub fn process(pr: &PullRequest, checkouts: &CheckoutCache, options: &MiningOptions) -> Result<ReportRow> {
    let stats = ChangeStats::of(&pr.commits);
    let references = resolve(pr.id, &pr.commits, &Heuristic)?;

    let checkout = checkouts.checkout(&pr.project)?;
    debug!("Using checkout at {}", checkout.path().display());
    let oracle = GitOracle::new(checkout);

    let lower_bound = pr.resolved_at() - Duration::days(options.window_days).num_seconds();
    let activity = count_activity(&oracle, &references, lower_bound)?;
    debug!("Pull request {}: {} files, activity {}", pr.github_id, references.len(), activity);

    if let Some(diff_dir) = &options.diff_dir {
        extract_diffs(pr, &oracle, diff_dir)?;
    }

    Ok(ReportRow::new(pr, stats, activity))
}

fn extract_diffs(pr: &PullRequest, oracle: &GitOracle, diff_dir: &Path) -> Result<()> {
    let strict = Strict::new(oracle);
    let references = resolve(pr.id, &pr.commits, &strict).context("Strict resolution failed")?;
    let versions = file_versions(&pr.commits, &references);

    let out_dir = diff_dir
        .join(&pr.project.owner)
        .join(&pr.project.repo)
        .join(pr.github_id.to_string());
    let written = write_snapshots(oracle.checkout(), &strict, &versions, &out_dir)?;
    debug!("Wrote {} file versions for pull request {}", written.len(), pr.github_id);
    Ok(())
}
