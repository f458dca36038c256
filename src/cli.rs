// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON export of the commit store (pull requests with their commits)
    #[arg(short, long)]
    pub commits: PathBuf,

    /// Directory holding the cached repository checkouts
    #[arg(long, env = "PRCHURN_CACHE_DIR", default_value = "cache")]
    pub cache_dir: PathBuf,

    /// Remote to clone from, with {owner} and {repo} placeholders
    #[arg(long, default_value = "https://github.com/{owner}/{repo}.git")]
    pub remote_url: String,

    /// The size of the trailing window for file activity, in days
    #[arg(long, default_value_t = 30)]
    pub window_days: u32,

    /// Give up on clone or fetch after this many seconds
    #[arg(long, default_value_t = 300)]
    pub network_timeout_secs: u64,

    /// Use cached checkouts as they are, without fetching
    #[arg(long)]
    pub offline: bool,

    /// Extract the versions of every modified file
    #[arg(long)]
    pub extract_diffs: bool,

    /// Base directory for extracted file versions
    #[arg(long, default_value = "diffs")]
    pub diff_dir: PathBuf,

    /// Worker threads for history queries (0 picks one per core)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,
}
