// src/report.rs

use crate::model::PullRequest;
use crate::stats::ChangeStats;
use std::io::{self, Write};

pub const HEADER: &str = "pull_req_id,project_name,github_id,created_at,merged_at,closed_at,\
lifetime_minutes,mergetime_minutes,num_commits,files_changed,churn,commits_on_files_touched";

/// Everything the report needs for one pull request
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub pull_request: u64,
    pub project: String,
    pub github_id: u64,
    pub created_at: i64,
    pub merged_at: Option<i64>,
    pub closed_at: i64,
    pub stats: ChangeStats,
    pub commits_on_files_touched: u64,
}

impl ReportRow {
    pub fn new(pr: &PullRequest, stats: ChangeStats, commits_on_files_touched: u64) -> Self {
        Self {
            pull_request: pr.id,
            project: pr.project.to_string(),
            github_id: pr.github_id,
            created_at: pr.created_at,
            merged_at: pr.merged_at,
            closed_at: pr.closed_at,
            stats,
            commits_on_files_touched,
        }
    }

    pub fn to_csv(&self) -> String {
        let lifetime = (self.closed_at - self.created_at) / 60;
        let merged_at = self.merged_at.map(|t| t.to_string()).unwrap_or_default();
        let mergetime = self.merged_at.map(|t| ((t - self.created_at) / 60).to_string()).unwrap_or_default();
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            self.pull_request,
            self.project,
            self.github_id,
            self.created_at,
            merged_at,
            self.closed_at,
            lifetime,
            mergetime,
            self.stats.commits,
            self.stats.files_changed(),
            self.stats.churn(),
            self.commits_on_files_touched,
        )
    }
}

/// Writes the header and then one line per row as rows arrive
pub struct CsvReport<W: Write> {
    out: W,
}

impl<W: Write> CsvReport<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "{HEADER}")?;
        Ok(Self { out })
    }

    pub fn write_row(&mut self, row: &ReportRow) -> io::Result<()> {
        writeln!(self.out, "{}", row.to_csv())?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
