//! Repository state capture.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::warn;

use crate::error::RepoQueryError;

/// Identifies one repository query.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RepoQuery {
    /// Current commit id.
    CommitId,
    /// Message of the last commit.
    Message,
    /// Current branch name.
    Branch,
    /// Tags pointing at the current commit.
    Tags,
    /// Whether the working tree has uncommitted changes.
    UncommittedChanges,
}

impl RepoQuery {
    /// Human-readable query label.
    pub fn as_str(&self) -> &'static str {
        match self {
            RepoQuery::CommitId => "commit id",
            RepoQuery::Message => "last commit message",
            RepoQuery::Branch => "branch",
            RepoQuery::Tags => "tags",
            RepoQuery::UncommittedChanges => "uncommitted changes",
        }
    }
}

/// Best-effort snapshot of repository metadata.
///
/// Fields whose query failed are left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryState {
    /// Current commit id.
    pub commit_id: String,
    /// Message of the last commit.
    pub message: String,
    /// Current branch name.
    pub branch: String,
    /// Tags pointing at the current commit.
    pub tags: Vec<String>,
    /// Whether the working tree has uncommitted changes.
    pub has_uncommitted_changes: bool,
}

/// Independent, individually fallible repository queries.
#[cfg_attr(test, mockall::automock)]
pub trait RepositoryQueries {
    /// Current commit id.
    fn commit_id(&self) -> Result<String, RepoQueryError>;
    /// Message of the last commit.
    fn last_commit_message(&self) -> Result<String, RepoQueryError>;
    /// Current branch name.
    fn branch(&self) -> Result<String, RepoQueryError>;
    /// Tags pointing at the current commit.
    fn tags(&self) -> Result<Vec<String>, RepoQueryError>;
    /// Whether the working tree has uncommitted changes.
    fn has_uncommitted_changes(&self) -> Result<bool, RepoQueryError>;
}

/// Run every query, logging failures and leaving their fields empty.
pub fn read_repository_state<Q: RepositoryQueries + ?Sized>(queries: &Q) -> RepositoryState {
    RepositoryState {
        commit_id: settle(queries.commit_id()),
        message: settle(queries.last_commit_message()),
        branch: settle(queries.branch()),
        tags: settle(queries.tags()),
        has_uncommitted_changes: settle(queries.has_uncommitted_changes()),
    }
}

fn settle<T: Default>(result: Result<T, RepoQueryError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!("{err}");
            T::default()
        }
    }
}

/// Answers repository queries by running `git` in a working directory.
#[derive(Debug, Clone)]
pub struct GitCommandReader {
    dir: PathBuf,
}

impl GitCommandReader {
    /// Create a reader for the repository containing `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Working directory used for git commands.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn run(&self, query: RepoQuery, args: &[&str]) -> Result<String, RepoQueryError> {
        run_git(&self.dir, args).map_err(|message| RepoQueryError::new(query, message))
    }
}

impl RepositoryQueries for GitCommandReader {
    fn commit_id(&self) -> Result<String, RepoQueryError> {
        self.run(RepoQuery::CommitId, &["rev-parse", "HEAD"])
    }

    fn last_commit_message(&self) -> Result<String, RepoQueryError> {
        self.run(RepoQuery::Message, &["log", "-1", "--pretty=%B"])
    }

    fn branch(&self) -> Result<String, RepoQueryError> {
        self.run(RepoQuery::Branch, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn tags(&self) -> Result<Vec<String>, RepoQueryError> {
        let output = self.run(RepoQuery::Tags, &["tag", "--points-at", "HEAD"])?;
        Ok(split_lines(&output))
    }

    fn has_uncommitted_changes(&self) -> Result<bool, RepoQueryError> {
        let output = self.run(RepoQuery::UncommittedChanges, &["status", "--porcelain"])?;
        Ok(!output.is_empty())
    }
}

fn split_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String, String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|err| format!("git command failed: {err}"))?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    if !output.status.success() {
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(format!("git {:?} failed: {}", args, detail));
    }
    Ok(stdout.trim().to_string())
}
