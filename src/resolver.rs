// src/resolver.rs

use crate::ancestry::AncestryOracle;
use crate::error::{MiningError, Result};
use crate::model::{CommitId, FileVersions, HistoryEntry, PullRequestCommitSet, ReferenceMap};
use std::cell::{OnceCell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::debug;

/// A commit set being resolved, with facts derived from it computed at most once
pub struct SetView<'s> {
    set: &'s PullRequestCommitSet,
    parents: OnceCell<HashSet<&'s str>>,
}

impl<'s> SetView<'s> {
    pub fn new(set: &'s PullRequestCommitSet) -> Self {
        Self { set, parents: OnceCell::new() }
    }

    /// One-hop parents of every commit in the set
    pub fn global_parents(&self) -> &HashSet<&'s str> {
        self.parents.get_or_init(|| self.set.global_parents())
    }
}

/// Picks the reference commit of each file touched by a pull request.
pub trait ResolveStrategy {
    /// Chooses among the commits of the set that modified `path`. `candidates`
    /// has at least two entries and keeps commit-set order.
    fn pick(&self, view: &SetView<'_>, path: &str, candidates: &[&str]) -> Result<Vec<CommitId>>;
}

/// Builds the reference map of a pull request.
///
/// Every touched path gets an entry. Paths never modified inside the set map to
/// `None`, paths modified by one commit map to it, and anything else is up to
/// the strategy, which must come back with exactly one commit.
pub fn resolve(pull_request: u64, set: &PullRequestCommitSet, strategy: &dyn ResolveStrategy) -> Result<ReferenceMap> {
    let view = SetView::new(set);
    let mut references: ReferenceMap = set.touched_paths().into_iter().map(|p| (p.to_string(), None)).collect();

    for (path, candidates) in set.modified_touches() {
        let reference = match candidates.as_slice() {
            [only] => only.to_string(),
            _ => {
                let mut picked = strategy.pick(&view, path, &candidates)?;
                if picked.len() != 1 {
                    debug!("{} candidates qualify for {} out of {}", picked.len(), path, candidates.len());
                    return Err(MiningError::Resolution {
                        pull_request,
                        path: path.to_string(),
                        candidates: picked.len(),
                    });
                }
                picked.remove(0)
            }
        };
        references.insert(path.to_string(), Some(reference));
    }

    Ok(references)
}

/// One-hop test: the reference is the only candidate that is not a direct parent
/// of some commit of the set. Needs no repository access.
pub struct Heuristic;

impl ResolveStrategy for Heuristic {
    fn pick(&self, view: &SetView<'_>, _path: &str, candidates: &[&str]) -> Result<Vec<CommitId>> {
        let parents = view.global_parents();
        Ok(candidates.iter().filter(|c| !parents.contains(**c)).map(|c| c.to_string()).collect())
    }
}

/// Full-ancestry test: the reference is the candidate whose file history
/// contains every other candidate. Histories are memoized per (commit, path) for
/// the lifetime of the value, which should not outlive one pull request.
pub struct Strict<'o> {
    oracle: &'o dyn AncestryOracle,
    memo: RefCell<HashMap<(String, String), Rc<Vec<HistoryEntry>>>>,
}

impl<'o> Strict<'o> {
    pub fn new(oracle: &'o dyn AncestryOracle) -> Self {
        Self { oracle, memo: RefCell::new(HashMap::new()) }
    }

    /// History of `path` from `from`, computed once
    pub fn history(&self, from: &str, path: &str) -> Result<Rc<Vec<HistoryEntry>>> {
        let key = (from.to_string(), path.to_string());
        if let Some(hit) = self.memo.borrow().get(&key) {
            return Ok(Rc::clone(hit));
        }
        let history = Rc::new(self.oracle.history(from, path)?);
        self.memo.borrow_mut().insert(key, Rc::clone(&history));
        Ok(history)
    }

    /// Whether every commit in `ancestors` changed `path` on the way to `from`
    pub fn reaches_all(&self, from: &str, ancestors: &[&str], path: &str) -> Result<bool> {
        let history = match self.history(from, path) {
            Ok(history) => history,
            Err(MiningError::PathNotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        let reachable: HashSet<&str> = history.iter().map(|e| e.commit.as_str()).collect();
        Ok(ancestors.iter().all(|c| reachable.contains(c)))
    }
}

impl ResolveStrategy for Strict<'_> {
    fn pick(&self, _view: &SetView<'_>, path: &str, candidates: &[&str]) -> Result<Vec<CommitId>> {
        for candidate in candidates {
            if self.reaches_all(candidate, candidates, path)? {
                return Ok(vec![candidate.to_string()]);
            }
        }
        Ok(Vec::new())
    }
}

/// Snapshot writer input: one triple per file with a reference commit.
pub fn file_versions(set: &PullRequestCommitSet, references: &ReferenceMap) -> Vec<FileVersions> {
    let touches = set.modified_touches();
    references
        .iter()
        .filter_map(|(path, reference)| {
            let reference = reference.as_ref()?;
            let version_count = touches.get(path.as_str()).map_or(0, Vec::len);
            Some(FileVersions { path: path.clone(), reference: reference.clone(), version_count })
        })
        .collect()
}
