//! Error taxonomy for a run.
//!
//! Each layer owns one error type. None of them escape the run: the updater
//! and orchestrator turn every one into an `Error` event and carry on with the
//! next branch or repository.

use crate::git::GitOutput;
use crate::probe::BranchName;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single git invocation.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Failed to spawn git command `git {command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for `git {command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} failed (exit code {code}): {}", .output.diagnostic())]
    Failed {
        command: String,
        code: i32,
        output: GitOutput,
    },

    #[error("git {command} timed out after {}s", .timeout.as_secs_f32())]
    Timeout { command: String, timeout: Duration },

    #[error("git {command} was cancelled")]
    Cancelled { command: String },

    #[error("Invalid branch name: {0:?}")]
    InvalidBranchName(String),
}

impl GitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GitError::Timeout { .. })
    }
}

/// The root directory could not be turned into a repository set.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("{} is not a valid directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to read directory {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A repository-level check failed before anything was modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreflightError {
    #[error("no current branch ({0})")]
    NoCurrentBranch(String),

    #[error("HEAD is detached, no current branch")]
    DetachedHead,

    #[error("uncommitted changes or conflicts")]
    UncommittedChanges,

    #[error("working tree status unknown ({0})")]
    StatusUnknown(String),

    #[error("no branches found")]
    NoBranches,

    #[error("update cancelled")]
    Cancelled,
}

/// Why a pull did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullFailureKind {
    /// Local and upstream history cannot be combined without a merge decision.
    Conflict,
    /// The branch has no upstream configured.
    NoUpstream,
    /// The remote could not be reached.
    Network,
    Timeout,
    Cancelled,
    Other,
}

impl fmt::Display for PullFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PullFailureKind::Conflict => "conflict",
            PullFailureKind::NoUpstream => "no upstream",
            PullFailureKind::Network => "network",
            PullFailureKind::Timeout => "timeout",
            PullFailureKind::Cancelled => "cancelled",
            PullFailureKind::Other => "error",
        };
        f.write_str(label)
    }
}

/// A checkout or pull of one branch failed. Processing continues with the
/// next branch.
#[derive(Debug, Error)]
pub enum BranchOperationError {
    #[error("Error switching to branch {branch}: {source}")]
    Checkout {
        branch: BranchName,
        #[source]
        source: GitError,
    },

    #[error("Error updating branch {branch} ({kind}): {source}")]
    Pull {
        branch: BranchName,
        kind: PullFailureKind,
        #[source]
        source: GitError,
    },
}

impl BranchOperationError {
    pub fn pull(branch: BranchName, source: GitError) -> Self {
        let kind = crate::probe::classify_pull_failure(&source);
        BranchOperationError::Pull {
            branch,
            kind,
            source,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            BranchOperationError::Checkout { source, .. } => source.is_timeout(),
            BranchOperationError::Pull { kind, .. } => *kind == PullFailureKind::Timeout,
        }
    }
}

/// Returning to the originally checked-out branch failed. Not retried.
#[derive(Debug, Error)]
#[error("Error switching back to original branch {branch}: {source}")]
pub struct RestoreError {
    pub branch: BranchName,
    #[source]
    pub source: GitError,
}
