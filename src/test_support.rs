//! Recording fake [`VersionControl`] backend for unit tests.

use crate::cancel::CancellationToken;
use crate::error::GitError;
use crate::git::GitOutput;
use crate::probe::{BranchName, HeadState, PullOutcome, VersionControl, WorkTreeStatus};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    IsRepository(PathBuf),
    ListBranches,
    Status,
    CurrentHead,
    Checkout(String),
    Pull(String),
    Restore(String),
}

/// Simulates one repository (for updater tests) and a set of repository
/// paths (for discovery tests).
#[derive(Debug)]
pub struct FakeVcs {
    pub repositories: HashSet<PathBuf>,
    pub head: HeadState,
    pub status: WorkTreeStatus,
    pub branches: Vec<BranchName>,
    pub failing_checkouts: HashSet<String>,
    pub failing_pulls: HashMap<String, String>,
    pub up_to_date: HashSet<String>,
    pub restore_fails: bool,
    /// Branch created on the first pull, to check that listings are snapshots.
    pub branch_created_by_pull: Option<BranchName>,
    /// Cancelled when the working tree status is read.
    pub cancel_on_status: Option<CancellationToken>,
    /// Cancelled on every pull.
    pub cancel_on_pull: Option<CancellationToken>,
    current: RefCell<Option<String>>,
    calls: RefCell<Vec<Call>>,
}

impl FakeVcs {
    /// A clean repository on `current` with the given branches.
    pub fn with_branches(current: &str, branches: &[&str]) -> Self {
        Self {
            repositories: HashSet::new(),
            head: HeadState::Branch(BranchName::from(current)),
            status: WorkTreeStatus::Clean,
            branches: branches.iter().copied().map(BranchName::from).collect(),
            failing_checkouts: HashSet::new(),
            failing_pulls: HashMap::new(),
            up_to_date: HashSet::new(),
            restore_fails: false,
            branch_created_by_pull: None,
            cancel_on_status: None,
            cancel_on_pull: None,
            current: RefCell::new(Some(current.to_string())),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// No repository content, only the given repository paths.
    pub fn with_repositories<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut fake = Self::with_branches("main", &["main"]);
        fake.repositories = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        fake
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn current(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    /// Number of checkout and pull calls, restoration excluded.
    pub fn mutation_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Checkout(_) | Call::Pull(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn failure(command: &str, stderr: &str) -> GitError {
        GitError::Failed {
            command: command.to_string(),
            code: 1,
            output: GitOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        }
    }
}

impl VersionControl for FakeVcs {
    fn is_repository(&self, path: &Path) -> bool {
        self.record(Call::IsRepository(path.to_path_buf()));
        self.repositories.contains(path)
    }

    fn list_local_branches(&self, _path: &Path) -> Vec<BranchName> {
        self.record(Call::ListBranches);
        let pulls = self
            .calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Pull(_)))
            .count();
        let mut branches = self.branches.clone();
        if pulls > 0 {
            branches.extend(self.branch_created_by_pull.clone());
        }
        branches
    }

    fn work_tree_status(&self, _path: &Path) -> WorkTreeStatus {
        self.record(Call::Status);
        if let Some(cancel) = &self.cancel_on_status {
            cancel.cancel();
        }
        self.status.clone()
    }

    fn current_head(&self, _path: &Path) -> HeadState {
        self.record(Call::CurrentHead);
        self.head.clone()
    }

    fn checkout(&self, _path: &Path, branch: &BranchName) -> Result<(), GitError> {
        self.record(Call::Checkout(branch.to_string()));
        if branch.as_str().starts_with('-') {
            return Err(GitError::InvalidBranchName(branch.to_string()));
        }
        if self.failing_checkouts.contains(branch.as_str()) {
            return Err(Self::failure(
                "checkout",
                &format!("error: pathspec '{branch}' did not match any file(s) known to git"),
            ));
        }
        *self.current.borrow_mut() = Some(branch.to_string());
        Ok(())
    }

    fn pull(&self, _path: &Path) -> Result<PullOutcome, GitError> {
        let branch = self.current().unwrap_or_default();
        self.record(Call::Pull(branch.clone()));
        if let Some(cancel) = &self.cancel_on_pull {
            cancel.cancel();
        }
        if let Some(stderr) = self.failing_pulls.get(&branch) {
            return Err(Self::failure("pull", stderr));
        }
        if self.up_to_date.contains(&branch) {
            Ok(PullOutcome::UpToDate)
        } else {
            Ok(PullOutcome::Updated)
        }
    }

    fn restore(&self, _path: &Path, branch: &BranchName) -> Result<(), GitError> {
        self.record(Call::Restore(branch.to_string()));
        if self.restore_fails {
            return Err(Self::failure(
                "checkout",
                "error: Your local changes to the following files would be overwritten by checkout",
            ));
        }
        *self.current.borrow_mut() = Some(branch.to_string());
        Ok(())
    }
}
