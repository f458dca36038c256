// src/ancestry.rs

use crate::checkout::Checkout;
use crate::error::{MiningError, Result};
use crate::model::HistoryEntry;
use git2::{Commit, ErrorCode, Oid, Repository, Sort};
use std::path::Path;
use tracing::debug;

/// Answers ancestry questions about files of a project.
pub trait AncestryOracle: Sync {
    /// Commits that changed `path`, reachable from `from` (inclusive), most recent first.
    ///
    /// Fails with `PathNotFound` when no such commit exists.
    fn history(&self, from: &str, path: &str) -> Result<Vec<HistoryEntry>>;
}

/// Oracle backed by a local checkout. Each call opens its own libgit2 handle,
/// so queries for different files can run on different threads.
pub struct GitOracle {
    checkout: Checkout,
}

impl GitOracle {
    pub fn new(checkout: Checkout) -> Self {
        Self { checkout }
    }

    pub fn checkout(&self) -> &Checkout {
        &self.checkout
    }

    fn unknown(&self, commit: &str) -> MiningError {
        MiningError::UnknownCommit { project: self.checkout.project().to_string(), commit: commit.to_string() }
    }

    fn git(&self, e: git2::Error) -> MiningError {
        MiningError::unavailable(self.checkout.project(), e.message())
    }
}

impl AncestryOracle for GitOracle {
    fn history(&self, from: &str, path: &str) -> Result<Vec<HistoryEntry>> {
        let repo = self.checkout.open()?;
        let oid = Oid::from_str(from).map_err(|_| self.unknown(from))?;
        repo.find_commit(oid).map_err(|_| self.unknown(from))?;

        let history = walk_file_history(&repo, oid, path).map_err(|e| self.git(e))?;
        debug!("{} versions of {} reachable from {}", history.len(), path, from);

        if history.is_empty() {
            return Err(MiningError::PathNotFound { path: path.to_string(), commit: from.to_string() });
        }
        Ok(history)
    }
}

fn walk_file_history(repo: &Repository, from: Oid, path: &str) -> std::result::Result<Vec<HistoryEntry>, git2::Error> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push(from)?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

    let mut history = Vec::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        if changes_path(&commit, path)? {
            history.push(HistoryEntry { commit: commit.id().to_string(), author_time: commit.author().when().seconds() });
        }
    }
    Ok(history)
}

/// A commit changes a path when its blob differs from every parent's.
/// Merges identical to one side are skipped the way `git log <path>` does.
fn changes_path(commit: &Commit, path: &str) -> std::result::Result<bool, git2::Error> {
    let current = blob_at(commit, path)?;
    if commit.parent_count() == 0 {
        return Ok(current.is_some());
    }
    for parent in commit.parents() {
        if blob_at(&parent, path)? == current {
            return Ok(false);
        }
    }
    Ok(true)
}

fn blob_at(commit: &Commit, path: &str) -> std::result::Result<Option<Oid>, git2::Error> {
    match commit.tree()?.get_path(Path::new(path)) {
        Ok(entry) => Ok(Some(entry.id())),
        Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// In-memory oracle over a fixed commit graph
#[cfg(test)]
pub(crate) mod memory {
    use super::AncestryOracle;
    use crate::error::{MiningError, Result};
    use crate::model::{Commit, HistoryEntry};
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) struct MemoryOracle {
        commits: HashMap<String, Commit>,
        calls: AtomicUsize,
    }

    impl MemoryOracle {
        pub(crate) fn new(commits: impl IntoIterator<Item = Commit>) -> Self {
            Self { commits: commits.into_iter().map(|c| (c.id.clone(), c)).collect(), calls: AtomicUsize::new(0) }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AncestryOracle for MemoryOracle {
        fn history(&self, from: &str, path: &str) -> Result<Vec<HistoryEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.commits.contains_key(from) {
                return Err(MiningError::UnknownCommit { project: "memory".into(), commit: from.into() });
            }

            let mut seen = HashSet::new();
            let mut stack = vec![from.to_string()];
            let mut history = Vec::new();
            while let Some(id) = stack.pop() {
                if !seen.insert(id.clone()) {
                    continue;
                }
                let Some(commit) = self.commits.get(&id) else { continue };
                if commit.files.iter().any(|f| f.path == path) {
                    history.push(HistoryEntry { commit: id, author_time: commit.author_time });
                }
                stack.extend(commit.parents.iter().cloned());
            }

            if history.is_empty() {
                return Err(MiningError::PathNotFound { path: path.into(), commit: from.into() });
            }
            history.sort_by(|a, b| b.author_time.cmp(&a.author_time));
            Ok(history)
        }
    }
}
