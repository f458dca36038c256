// src/main.rs

mod activity;
mod ancestry;
mod checkout;
mod cli;
mod error;
mod model;
mod pipeline;
mod provider;
mod report;
mod resolver;
mod snapshots;
mod stats;

use anyhow::{Context, Result};
use checkout::{CheckoutCache, CheckoutSettings};
use clap::Parser;
use cli::Args;
use pipeline::MiningOptions;
use provider::JsonCommitStore;
use report::CsvReport;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // stdout carries the report, logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let start_time = Instant::now();

    if args.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let store = JsonCommitStore::open(&args.commits)?;
    let checkouts = CheckoutCache::new(CheckoutSettings {
        cache_dir: args.cache_dir.clone(),
        url_template: args.remote_url.clone(),
        network_timeout: Duration::from_secs(args.network_timeout_secs),
        offline: args.offline,
    });
    let options = MiningOptions {
        window_days: i64::from(args.window_days),
        diff_dir: args.extract_diffs.then(|| args.diff_dir.clone()),
    };

    let mut report = CsvReport::new(std::io::stdout().lock()).context("Failed to write report header")?;
    let summary = pipeline::run(&store, &checkouts, &options, &mut report)?;

    eprintln!(
        "Mining finished in {:.2?}. {} pull requests reported, {} failed.",
        start_time.elapsed(),
        summary.processed,
        summary.failures.len()
    );
    Ok(())
}
