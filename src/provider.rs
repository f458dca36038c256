// src/provider.rs

use crate::error::{MiningError, Result};
use crate::model::{Commit, ProjectId, PullRequest, PullRequestCommitSet, Timestamp};
use serde::Deserialize;
use std::path::Path;

/// Source of merged/closed pull requests and the commits they contain.
pub trait CommitSetProvider {
    fn project(&self) -> &ProjectId;

    /// Pull requests ordered by descending merge-or-close time
    fn pull_requests(&self) -> Result<Vec<PullRequest>>;
}

#[derive(Debug, Deserialize)]
struct StoreDocument {
    project: String,
    #[serde(default)]
    pull_requests: Vec<PullRequestRecord>,
}

#[derive(Debug, Deserialize)]
struct PullRequestRecord {
    id: u64,
    github_id: u64,
    created_at: Timestamp,
    #[serde(default)]
    merged_at: Option<Timestamp>,
    closed_at: Timestamp,
    #[serde(default)]
    commits: Vec<Commit>,
}

/// Commit store exported to a single JSON document
pub struct JsonCommitStore {
    project: ProjectId,
    records: Vec<PullRequestRecord>,
}

impl JsonCommitStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read commit store {}", path.display()))?;
        Ok(Self::from_json(&raw)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let document: StoreDocument = serde_json::from_str(raw).map_err(|e| MiningError::InvalidInput(e.to_string()))?;
        let project = ProjectId::parse(&document.project)
            .ok_or_else(|| MiningError::InvalidInput(format!("project must be owner/repo, got {:?}", document.project)))?;
        Ok(Self { project, records: document.pull_requests })
    }
}

impl CommitSetProvider for JsonCommitStore {
    fn project(&self) -> &ProjectId {
        &self.project
    }

    fn pull_requests(&self) -> Result<Vec<PullRequest>> {
        let mut pull_requests: Vec<PullRequest> = self
            .records
            .iter()
            .filter(|r| r.created_at < r.closed_at)
            .map(|r| PullRequest {
                id: r.id,
                github_id: r.github_id,
                project: self.project.clone(),
                created_at: r.created_at,
                merged_at: r.merged_at,
                closed_at: r.closed_at,
                commits: PullRequestCommitSet::new(r.commits.clone()),
            })
            .collect();
        pull_requests.sort_by(|a, b| b.resolved_at().cmp(&a.resolved_at()));
        Ok(pull_requests)
    }
}
