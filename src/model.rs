// src/model.rs

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Opaque content hash of a commit
pub type CommitId = String;

/// Seconds since the Unix epoch
pub type Timestamp = i64;

/// How a commit changed a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Removed,
    /// Any status the commit store reports that we do not track (renamed, copied...)
    #[serde(other)]
    Other,
}

/// A single file entry of a commit
#[derive(Debug, Clone, Deserialize)]
pub struct FileChange {
    #[serde(rename = "filename")]
    pub path: String,
    pub status: FileStatus,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

/// A commit as returned by the commit store
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    #[serde(rename = "sha")]
    pub id: CommitId,
    #[serde(default)]
    pub parents: Vec<CommitId>,
    #[serde(rename = "authored_at")]
    pub author_time: Timestamp,
    #[serde(default)]
    pub files: Vec<FileChange>,
}

/// Unordered commits belonging to one pull request. Parents may point outside the set.
#[derive(Debug, Clone, Default)]
pub struct PullRequestCommitSet {
    pub commits: Vec<Commit>,
}

impl PullRequestCommitSet {
    pub fn new(commits: Vec<Commit>) -> Self {
        Self { commits }
    }

    /// One-hop parents of every member commit
    pub fn global_parents(&self) -> HashSet<&str> {
        self.commits
            .iter()
            .flat_map(|c| c.parents.iter().map(String::as_str))
            .collect()
    }

    /// Every path the set touches, whatever the status
    pub fn touched_paths(&self) -> BTreeSet<&str> {
        self.commits
            .iter()
            .flat_map(|c| c.files.iter().map(|f| f.path.as_str()))
            .collect()
    }

    /// (commit, path) pairs for modified files, grouped by path. Candidates keep
    /// commit-set order and are deduplicated.
    pub fn modified_touches(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for commit in &self.commits {
            for change in commit.files.iter().filter(|f| f.status == FileStatus::Modified) {
                let candidates = grouped.entry(change.path.as_str()).or_default();
                if !candidates.contains(&commit.id.as_str()) {
                    candidates.push(commit.id.as_str());
                }
            }
        }
        grouped
    }
}

/// Metadata of a merged or closed pull request plus its commits
#[derive(Debug, Clone)]
pub struct PullRequest {
    pub id: u64,
    pub github_id: u64,
    pub project: ProjectId,
    pub created_at: Timestamp,
    pub merged_at: Option<Timestamp>,
    pub closed_at: Timestamp,
    pub commits: PullRequestCommitSet,
}

impl PullRequest {
    /// Merge time when merged, close time otherwise
    pub fn resolved_at(&self) -> Timestamp {
        self.merged_at.unwrap_or(self.closed_at)
    }
}

/// `owner/repo` identity of a project
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId {
    pub owner: String,
    pub repo: String,
}

impl ProjectId {
    /// Parses `owner/repo`
    pub fn parse(name: &str) -> Option<Self> {
        let (owner, repo) = name.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self { owner: owner.to_string(), repo: repo.to_string() })
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// One entry of a file's history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub commit: CommitId,
    pub author_time: Timestamp,
}

/// Path -> reference commit. `None` marks a file never modified inside the set.
pub type ReferenceMap = BTreeMap<String, Option<CommitId>>;

/// Input for the snapshot writer, produced by strict resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVersions {
    pub path: String,
    pub reference: CommitId,
    pub version_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn commit(id: &str, parents: &[&str], time: Timestamp, files: &[(&str, FileStatus)]) -> Commit {
        Commit {
            id: id.to_string(),
            parents: parents.iter().map(|p| p.to_string()).collect(),
            author_time: time,
            files: files
                .iter()
                .map(|(path, status)| FileChange { path: path.to_string(), status: *status, additions: 1, deletions: 1 })
                .collect(),
        }
    }

    #[test]
    fn global_parents_are_one_hop() {
        let set = PullRequestCommitSet::new(vec![
            commit("c2", &["c1"], 2, &[]),
            commit("c3", &["c2", "x"], 3, &[]),
        ]);
        let parents = set.global_parents();
        assert_eq!(parents.len(), 3);
        assert!(parents.contains("c1") && parents.contains("c2") && parents.contains("x"));
        assert!(!parents.contains("c3"));
    }

    #[test]
    fn modified_touches_skip_other_statuses_and_dedupe() {
        let mut dup = commit("c1", &[], 1, &[("a.txt", FileStatus::Modified)]);
        dup.files.push(FileChange { path: "a.txt".into(), status: FileStatus::Modified, additions: 0, deletions: 0 });
        let set = PullRequestCommitSet::new(vec![
            dup,
            commit("c2", &["c1"], 2, &[("a.txt", FileStatus::Modified), ("b.txt", FileStatus::Added)]),
        ]);
        let touches = set.modified_touches();
        assert_eq!(touches.get("a.txt"), Some(&vec!["c1", "c2"]));
        assert!(!touches.contains_key("b.txt"));
        assert_eq!(set.touched_paths().len(), 2);
    }

    #[test]
    fn unknown_status_deserializes_as_other() {
        let change: FileChange =
            serde_json::from_str(r#"{"filename":"x.rs","status":"renamed","additions":3}"#).unwrap();
        assert_eq!(change.status, FileStatus::Other);
        assert_eq!(change.deletions, 0);
    }

    #[test]
    fn project_id_parsing() {
        assert_eq!(ProjectId::parse("rails/rails").map(|p| p.to_string()), Some("rails/rails".to_string()));
        assert!(ProjectId::parse("rails").is_none());
        assert!(ProjectId::parse("a/b/c").is_none());
        assert!(ProjectId::parse("/b").is_none());
    }
}

#[cfg(test)]
pub(crate) use tests::commit as test_commit;
