// src/stats.rs

use crate::model::{FileStatus, PullRequestCommitSet};

/// Change statistics across all commits of a pull request. File counts are per
/// commit entry, so a file modified by two commits counts twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeStats {
    pub commits: usize,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub files_added: usize,
    pub files_removed: usize,
    pub files_modified: usize,
}

impl ChangeStats {
    pub fn of(set: &PullRequestCommitSet) -> Self {
        let mut stats = Self { commits: set.commits.len(), ..Self::default() };
        for change in set.commits.iter().flat_map(|c| &c.files) {
            stats.lines_added += change.additions;
            stats.lines_deleted += change.deletions;
            match change.status {
                FileStatus::Added => stats.files_added += 1,
                FileStatus::Removed => stats.files_removed += 1,
                FileStatus::Modified => stats.files_modified += 1,
                FileStatus::Other => {}
            }
        }
        stats
    }

    pub fn churn(&self) -> u64 {
        self.lines_added + self.lines_deleted
    }

    pub fn files_changed(&self) -> usize {
        self.files_added + self.files_removed + self.files_modified
    }
}
