// src/activity.rs

use crate::ancestry::AncestryOracle;
use crate::error::{MiningError, Result};
use crate::model::{ReferenceMap, Timestamp};
use rayon::prelude::*;
use tracing::debug;

/// Commits on the files of a pull request authored after `lower_bound`.
///
/// Each file is counted from its own reference commit; a commit touching two
/// files counts twice. Files without a reference, or without any history, add
/// nothing. History lookups for different files run in parallel.
pub fn count_activity(oracle: &dyn AncestryOracle, references: &ReferenceMap, lower_bound: Timestamp) -> Result<u64> {
    Ok(file_activity(oracle, references, lower_bound)?.iter().map(|(_, n)| n).sum())
}

/// Per-file breakdown of [`count_activity`], in path order.
pub fn file_activity(
    oracle: &dyn AncestryOracle,
    references: &ReferenceMap,
    lower_bound: Timestamp,
) -> Result<Vec<(String, u64)>> {
    references
        .par_iter()
        .map(|(path, reference)| {
            let Some(commit) = reference else {
                return Ok((path.clone(), 0));
            };
            let count = match oracle.history(commit, path) {
                Ok(history) => history.iter().filter(|e| e.author_time > lower_bound).count() as u64,
                Err(MiningError::PathNotFound { .. }) => {
                    debug!("No history for {} at {}", path, commit);
                    0
                }
                Err(e) => return Err(e),
            };
            Ok((path.clone(), count))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ancestry::memory::MemoryOracle;
    use crate::model::{test_commit as commit, FileStatus::*};
    use crate::resolver::{resolve, Heuristic};
    use crate::model::PullRequestCommitSet;

    fn refs(entries: &[(&str, Option<&str>)]) -> ReferenceMap {
        entries.iter().map(|(p, c)| (p.to_string(), c.map(str::to_string))).collect()
    }

    #[test]
    fn two_commit_chain_counts_both_versions() {
        let commits = vec![commit("c1", &[], 100, &[("a.txt", Modified)]), commit("c2", &["c1"], 200, &[("a.txt", Modified)])];
        let oracle = MemoryOracle::new(commits.clone());
        let references = resolve(1, &PullRequestCommitSet::new(commits), &Heuristic).unwrap();
        assert_eq!(references.get("a.txt"), Some(&Some("c2".to_string())));
        assert_eq!(count_activity(&oracle, &references, 99).unwrap(), 2);
    }

    #[test]
    fn bound_is_strict_and_bound_agnostic() {
        let oracle = MemoryOracle::new(vec![
            commit("c1", &[], 100, &[("a.txt", Modified)]),
            commit("c2", &["c1"], 200, &[("a.txt", Modified)]),
            commit("c3", &["c2"], 300, &[("a.txt", Modified)]),
        ]);
        let references = refs(&[("a.txt", Some("c3"))]);
        assert_eq!(count_activity(&oracle, &references, 0).unwrap(), 3);
        assert_eq!(count_activity(&oracle, &references, 100).unwrap(), 2);
        assert_eq!(count_activity(&oracle, &references, 299).unwrap(), 1);
        assert_eq!(count_activity(&oracle, &references, 300).unwrap(), 0);
        assert_eq!(count_activity(&oracle, &references, 10_000).unwrap(), 0);
    }

    #[test]
    fn disjoint_files_are_summed_without_dedup() {
        let oracle = MemoryOracle::new(vec![
            commit("base", &[], 50, &[("a.txt", Added), ("b.txt", Added)]),
            commit("both", &["base"], 60, &[("a.txt", Modified), ("b.txt", Modified)]),
            commit("ca", &["both"], 70, &[("a.txt", Modified)]),
            commit("cb", &["ca"], 80, &[("b.txt", Modified)]),
        ]);
        let references = refs(&[("a.txt", Some("ca")), ("b.txt", Some("cb"))]);
        // a: ca, both, base; b: cb, both, base
        assert_eq!(count_activity(&oracle, &references, 0).unwrap(), 6);
        assert_eq!(
            file_activity(&oracle, &references, 55).unwrap(),
            vec![("a.txt".to_string(), 2), ("b.txt".to_string(), 2)]
        );
    }

    #[test]
    fn added_files_and_missing_history_count_zero() {
        let oracle = MemoryOracle::new(vec![commit("c1", &[], 100, &[("a.txt", Modified)])]);
        let references = refs(&[("a.txt", Some("c1")), ("new.txt", None), ("gone.txt", Some("c1"))]);
        assert_eq!(count_activity(&oracle, &references, 0).unwrap(), 1);
        assert_eq!(file_activity(&oracle, &references, 0).unwrap().len(), 3);
    }

    #[test]
    fn unknown_reference_commit_fails() {
        let oracle = MemoryOracle::new(Vec::new());
        let references = refs(&[("a.txt", Some("nope"))]);
        assert!(matches!(count_activity(&oracle, &references, 0), Err(MiningError::UnknownCommit { .. })));
    }
}
