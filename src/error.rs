// src/error.rs

use thiserror::Error;

/// Failures of reference resolution and history lookup
#[derive(Debug, Error)]
pub enum MiningError {
    /// No single commit could be chosen as the reference for a file
    #[error("cannot resolve reference commit for {path} in pull request {pull_request}: {candidates} qualifying candidates")]
    Resolution { pull_request: u64, path: String, candidates: usize },

    #[error("repository {project} unavailable: {reason}")]
    RepositoryUnavailable { project: String, reason: String },

    #[error("no history for {path} reachable from {commit}")]
    PathNotFound { path: String, commit: String },

    /// The commit is not present in the local checkout
    #[error("commit {commit} not found in {project}")]
    UnknownCommit { project: String, commit: String },

    #[error("invalid commit store data: {0}")]
    InvalidInput(String),
}

impl MiningError {
    pub fn unavailable(project: impl ToString, reason: impl ToString) -> Self {
        Self::RepositoryUnavailable { project: project.to_string(), reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, MiningError>;
