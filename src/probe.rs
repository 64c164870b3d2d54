//! Version control probe: the seam between the update algorithm and git.
//!
//! The updater, discoverer and orchestrator only talk to a [`VersionControl`]
//! backend. [`crate::git::GitCli`] is the real implementation; tests use a
//! recording fake.

use crate::error::{GitError, PullFailureKind};
use std::fmt;
use std::path::Path;

/// A local branch name, exactly as listed by git.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchName(String);

impl BranchName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BranchName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What HEAD points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    Branch(BranchName),
    /// HEAD points directly at a commit.
    Detached,
    /// HEAD could not be resolved (empty repository, git failure, timeout).
    Unreadable(String),
}

/// Working tree cleanliness. `Unknown` means the status command itself failed
/// and must not be mistaken for `Clean`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkTreeStatus {
    Clean,
    Dirty,
    Unknown(String),
}

/// Result of a pull that exited successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    Updated,
    UpToDate,
}

/// Operations the updater needs from a version control tool.
///
/// Probes never fail: they fold errors into their return value. Mutating
/// operations return the underlying [`GitError`].
pub trait VersionControl {
    /// True iff `path` is inside a repository. Any failure yields `false`.
    fn is_repository(&self, path: &Path) -> bool;

    /// Local branches in listing order. Empty on failure.
    fn list_local_branches(&self, path: &Path) -> Vec<BranchName>;

    fn work_tree_status(&self, path: &Path) -> WorkTreeStatus;

    fn current_head(&self, path: &Path) -> HeadState;

    fn checkout(&self, path: &Path, branch: &BranchName) -> Result<(), GitError>;

    fn pull(&self, path: &Path) -> Result<PullOutcome, GitError>;

    /// Checkout used to return to the original branch. Backends that honour
    /// cancellation must still run this one.
    fn restore(&self, path: &Path, branch: &BranchName) -> Result<(), GitError> {
        self.checkout(path, branch)
    }

    /// Dirty or unknown status both count: only a confirmed clean tree is
    /// safe to switch branches in.
    fn has_uncommitted_or_conflict_state(&self, path: &Path) -> bool {
        !matches!(self.work_tree_status(path), WorkTreeStatus::Clean)
    }

    /// The checked-out branch, or `None` when HEAD is detached or unreadable.
    fn current_branch(&self, path: &Path) -> Option<BranchName> {
        match self.current_head(path) {
            HeadState::Branch(branch) => Some(branch),
            HeadState::Detached | HeadState::Unreadable(_) => None,
        }
    }
}

/// Parses `git branch --format=%(refname:short)` output.
/// Entries such as `(HEAD detached at 1a2b3c)` are not branches and are dropped.
pub fn parse_branch_list(output: &str) -> Vec<BranchName> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('('))
        .map(BranchName::from)
        .collect()
}

/// Parses the stdout of a successful `git pull`.
pub fn parse_pull_output(stdout: &str) -> PullOutcome {
    if stdout.contains("Already up to date") || stdout.contains("Already up-to-date") {
        PullOutcome::UpToDate
    } else {
        PullOutcome::Updated
    }
}

const CONFLICT_MARKERS: &[&str] = &[
    "CONFLICT",
    "Automatic merge failed",
    "Not possible to fast-forward",
    "divergent branches",
    "would be overwritten by merge",
];

const NO_UPSTREAM_MARKERS: &[&str] = &[
    "There is no tracking information",
    "no such ref was fetched",
];

const NETWORK_MARKERS: &[&str] = &[
    "Could not read from remote repository",
    "does not appear to be a git repository",
    "unable to access",
    "Could not resolve host",
    "Connection refused",
    "Connection timed out",
    "terminal prompts disabled",
];

/// Sorts a failed pull into a category from its exit status and output.
pub fn classify_pull_failure(err: &GitError) -> PullFailureKind {
    match err {
        GitError::Timeout { .. } => PullFailureKind::Timeout,
        GitError::Cancelled { .. } => PullFailureKind::Cancelled,
        GitError::Failed { output, .. } => {
            let text = format!("{}\n{}", output.stdout, output.stderr);
            let has_any = |markers: &[&str]| markers.iter().any(|m| text.contains(m));
            if has_any(CONFLICT_MARKERS) {
                PullFailureKind::Conflict
            } else if has_any(NO_UPSTREAM_MARKERS) {
                PullFailureKind::NoUpstream
            } else if has_any(NETWORK_MARKERS) {
                PullFailureKind::Network
            } else {
                PullFailureKind::Other
            }
        }
        GitError::Spawn { .. } | GitError::Wait { .. } | GitError::InvalidBranchName(_) => {
            PullFailureKind::Other
        }
    }
}
