// Repository update: pre-flight checks, per-branch checkout and pull, restore

use crate::cancel::CancellationToken;
use crate::error::{BranchOperationError, GitError, PreflightError, RestoreError};
use crate::events::EventSink;
use crate::probe::{BranchName, HeadState, PullOutcome, VersionControl, WorkTreeStatus};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Snapshot of a repository taken before any branch is switched.
///
/// Only built once every pre-flight check has passed, so the original branch
/// is always known and the tree is always clean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryState {
    pub repo_path: PathBuf,
    pub original_branch: BranchName,
    pub is_clean: bool,
    /// Listing taken once; branches created by later pulls are not picked up.
    pub branches: Vec<BranchName>,
}

#[derive(Debug)]
pub enum BranchOutcome {
    Success(PullOutcome),
    Skipped(String),
    Failed(BranchOperationError),
}

#[derive(Debug)]
pub struct BranchUpdateResult {
    pub branch: BranchName,
    pub outcome: BranchOutcome,
}

impl BranchUpdateResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, BranchOutcome::Success(_))
    }
}

#[derive(Debug)]
pub enum RepoOutcome {
    /// A pre-flight check failed; nothing was touched.
    Skipped(PreflightError),
    /// Branches were processed and restoration was attempted.
    Processed {
        branches: Vec<BranchUpdateResult>,
        restore: Option<RestoreError>,
    },
}

#[derive(Debug)]
pub struct RepoReport {
    pub path: PathBuf,
    pub outcome: RepoOutcome,
    pub duration: Duration,
}

impl RepoReport {
    /// Every branch updated and the original branch restored.
    pub fn is_success(&self) -> bool {
        match &self.outcome {
            RepoOutcome::Skipped(_) => false,
            RepoOutcome::Processed { branches, restore } => {
                restore.is_none() && branches.iter().all(BranchUpdateResult::is_success)
            }
        }
    }

    pub fn failed_branches(&self) -> usize {
        match &self.outcome {
            RepoOutcome::Skipped(_) => 0,
            RepoOutcome::Processed { branches, .. } => {
                branches.iter().filter(|b| !b.is_success()).count()
            }
        }
    }
}

/// Runs the read-only checks, in order, stopping at the first failure.
pub fn preflight<V>(path: &Path, vcs: &V) -> Result<RepositoryState, PreflightError>
where
    V: VersionControl + ?Sized,
{
    let original_branch = match vcs.current_head(path) {
        HeadState::Branch(branch) => branch,
        HeadState::Detached => return Err(PreflightError::DetachedHead),
        HeadState::Unreadable(reason) => return Err(PreflightError::NoCurrentBranch(reason)),
    };

    match vcs.work_tree_status(path) {
        WorkTreeStatus::Clean => {}
        WorkTreeStatus::Dirty => return Err(PreflightError::UncommittedChanges),
        WorkTreeStatus::Unknown(reason) => return Err(PreflightError::StatusUnknown(reason)),
    }

    let branches = vcs.list_local_branches(path);
    if branches.is_empty() {
        return Err(PreflightError::NoBranches);
    }

    Ok(RepositoryState {
        repo_path: path.to_path_buf(),
        original_branch,
        is_clean: true,
        branches,
    })
}

/// Brings every local branch of one repository up to date and returns to the
/// branch that was checked out before.
///
/// Never fails: every problem is emitted as an `Error` event and recorded in
/// the report.
pub fn update<V, S>(path: &Path, vcs: &V, sink: &S, cancel: &CancellationToken) -> RepoReport
where
    V: VersionControl + ?Sized,
    S: EventSink + ?Sized,
{
    let start = Instant::now();
    sink.info(format!("Processing repository: {}", path.display()));

    // Probes interrupted by cancellation fail with misleading reasons.
    let checked = if cancel.is_cancelled() {
        Err(PreflightError::Cancelled)
    } else {
        preflight(path, vcs).map_err(|err| {
            if cancel.is_cancelled() {
                PreflightError::Cancelled
            } else {
                err
            }
        })
    };

    let outcome = match checked {
        Ok(state) => process(&state, vcs, sink, cancel),
        Err(err) => {
            sink.error(format!("Skipping {}: {}", path.display(), err));
            RepoOutcome::Skipped(err)
        }
    };

    RepoReport {
        path: path.to_path_buf(),
        outcome,
        duration: start.elapsed(),
    }
}

fn process<V, S>(
    state: &RepositoryState,
    vcs: &V,
    sink: &S,
    cancel: &CancellationToken,
) -> RepoOutcome
where
    V: VersionControl + ?Sized,
    S: EventSink + ?Sized,
{
    let mut results = Vec::with_capacity(state.branches.len());

    for (index, branch) in state.branches.iter().enumerate() {
        if cancel.is_cancelled() {
            let remaining = &state.branches[index..];
            sink.error(format!(
                "Update cancelled, skipping {} remaining branch(es)",
                remaining.len()
            ));
            results.extend(remaining.iter().map(|branch| BranchUpdateResult {
                branch: branch.clone(),
                outcome: BranchOutcome::Skipped("cancelled".to_string()),
            }));
            break;
        }
        results.push(update_branch(&state.repo_path, branch, vcs, sink));
    }

    let restore = restore_original(state, vcs, sink).err();
    RepoOutcome::Processed {
        branches: results,
        restore,
    }
}

fn update_branch<V, S>(path: &Path, branch: &BranchName, vcs: &V, sink: &S) -> BranchUpdateResult
where
    V: VersionControl + ?Sized,
    S: EventSink + ?Sized,
{
    sink.info(format!("Switching to branch: {branch}"));

    let outcome = match vcs.checkout(path, branch) {
        Err(GitError::InvalidBranchName(name)) => {
            let reason = format!("invalid branch name {name:?}");
            sink.error(format!("Skipping branch {branch}: {reason}"));
            BranchOutcome::Skipped(reason)
        }
        Err(source) => {
            let err = BranchOperationError::Checkout {
                branch: branch.clone(),
                source,
            };
            sink.error(err.to_string());
            BranchOutcome::Failed(err)
        }
        Ok(()) => {
            sink.info(format!("Updating branch {branch}..."));
            pull_branch(path, branch, vcs, sink)
        }
    };

    BranchUpdateResult {
        branch: branch.clone(),
        outcome,
    }
}

fn pull_branch<V, S>(path: &Path, branch: &BranchName, vcs: &V, sink: &S) -> BranchOutcome
where
    V: VersionControl + ?Sized,
    S: EventSink + ?Sized,
{
    match vcs.pull(path) {
        Ok(pulled) => {
            match pulled {
                PullOutcome::Updated => {
                    sink.success(format!("Successfully updated branch {branch}"))
                }
                PullOutcome::UpToDate => {
                    sink.success(format!("Branch {branch} is already up to date"))
                }
            }
            BranchOutcome::Success(pulled)
        }
        Err(source) => {
            let err = BranchOperationError::pull(branch.clone(), source);
            sink.error(err.to_string());
            BranchOutcome::Failed(err)
        }
    }
}

fn restore_original<V, S>(state: &RepositoryState, vcs: &V, sink: &S) -> Result<(), RestoreError>
where
    V: VersionControl + ?Sized,
    S: EventSink + ?Sized,
{
    let branch = &state.original_branch;
    sink.info(format!("Switching back to original branch: {branch}"));
    vcs.restore(&state.repo_path, branch).map_err(|source| {
        let err = RestoreError {
            branch: branch.clone(),
            source,
        };
        sink.error(err.to_string());
        err
    })
}
