//! Test infrastructure for git-multi-pull integration tests.
#![allow(dead_code)]

use anyhow::Result;
use git_multi_pull::cancel::CancellationToken;
use git_multi_pull::config::Config;
use git_multi_pull::git::{GitCli, run_git};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Backend with default timeouts and a fresh token.
pub fn git_cli() -> GitCli {
    git_cli_with(CancellationToken::new())
}

pub fn git_cli_with(cancel: CancellationToken) -> GitCli {
    GitCli::new(&Config::default(), cancel)
}

/// Initializes a repository with one commit on `branch`.
pub fn init_repo(path: &Path, branch: &str) -> Result<()> {
    run_git(path, &["init", "-b", branch])?;
    configure_identity(path)?;
    std::fs::write(path.join("README.md"), "# Test Repo\n")?;
    run_git(path, &["add", "README.md"])?;
    run_git(path, &["commit", "-m", "Initial commit"])?;
    Ok(())
}

fn configure_identity(path: &Path) -> Result<()> {
    run_git(path, &["config", "user.email", "test@example.com"])?;
    run_git(path, &["config", "user.name", "Test User"])?;
    run_git(path, &["config", "pull.rebase", "false"])?;
    Ok(())
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are valid UTF-8")
}

/// A temporary git repository for testing, optionally with a bare remote.
/// Automatically cleaned up when dropped.
pub struct TestRepo {
    _temp_dir: TempDir,
    remote: Option<TempDir>,
    path: PathBuf,
    default_branch: String,
}

impl TestRepo {
    /// Creates a new test repository with an initial commit on the master branch.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        init_repo(&path, "master")?;

        Ok(Self {
            _temp_dir: temp_dir,
            remote: None,
            path,
            default_branch: "master".to_string(),
        })
    }

    /// Creates a test repository whose default branch tracks a bare remote.
    pub fn with_remote(default_branch: Option<&str>) -> Result<Self> {
        let default_branch = default_branch.unwrap_or("master");
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().to_path_buf();
        init_repo(&path, default_branch)?;

        let remote = TempDir::new()?;
        attach_remote(&path, remote.path(), default_branch)?;

        Ok(Self {
            _temp_dir: temp_dir,
            remote: Some(remote),
            path,
            default_branch: default_branch.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn remote_path(&self) -> Option<&Path> {
        self.remote.as_ref().map(TempDir::path)
    }

    pub fn current_branch(&self) -> Result<String> {
        run_git(&self.path, &["rev-parse", "--abbrev-ref", "HEAD"])
    }

    pub fn head_of(&self, branch: &str) -> Result<String> {
        run_git(&self.path, &["rev-parse", branch])
    }

    /// Creates a local branch without an upstream.
    pub fn create_branch(&self, name: &str) -> Result<()> {
        run_git(&self.path, &["branch", name])?;
        Ok(())
    }

    /// Creates a local branch and pushes it with upstream tracking.
    pub fn create_tracked_branch(&self, name: &str) -> Result<()> {
        self.create_branch(name)?;
        run_git(&self.path, &["push", "-u", "origin", name])?;
        Ok(())
    }

    pub fn checkout(&self, branch: &str) -> Result<()> {
        run_git(&self.path, &["checkout", branch])?;
        Ok(())
    }

    pub fn detach_head(&self) -> Result<()> {
        run_git(&self.path, &["checkout", "--detach", "HEAD"])?;
        Ok(())
    }

    pub fn make_dirty(&self) -> Result<()> {
        std::fs::write(self.path.join("README.md"), "# Modified\n")?;
        Ok(())
    }

    pub fn make_untracked(&self) -> Result<()> {
        std::fs::write(self.path.join("untracked.txt"), "untracked content\n")?;
        Ok(())
    }

    /// Commits to `branch` from a second clone and pushes, so the remote is
    /// ahead of this repository. Returns the pushed commit.
    pub fn push_upstream_commit(&self, branch: &str, file: &str) -> Result<String> {
        let remote = self
            .remote_path()
            .ok_or_else(|| anyhow::anyhow!("repository has no remote"))?;
        let scratch = TempDir::new()?;
        let clone = scratch.path().join("clone");
        run_git(
            scratch.path(),
            &["clone", "-b", branch, path_str(remote), path_str(&clone)],
        )?;
        configure_identity(&clone)?;
        std::fs::write(clone.join(file), format!("{file}\n"))?;
        run_git(&clone, &["add", file])?;
        run_git(&clone, &["commit", "-m", &format!("Add {file}")])?;
        run_git(&clone, &["push", "origin", branch])?;
        run_git(&clone, &["rev-parse", "HEAD"])
    }

    /// Deletes the remote directory so every fetch fails.
    pub fn remove_remote(&mut self) {
        self.remote = None;
    }

    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }
}

fn attach_remote(repo: &Path, remote: &Path, branch: &str) -> Result<()> {
    run_git(remote, &["init", "--bare"])?;
    run_git(repo, &["remote", "add", "origin", path_str(remote)])?;
    run_git(repo, &["push", "-u", "origin", branch])?;
    Ok(())
}

/// A directory holding several repositories. Their remotes live in a separate
/// temp dir so they are not discovered as repositories themselves.
pub struct Workspace {
    dir: TempDir,
    remotes: TempDir,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
            remotes: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Adds a repository tracking its own bare remote.
    pub fn add_repo(&self, name: &str, branch: &str) -> Result<PathBuf> {
        let repo = self.dir.path().join(name);
        let remote = self.remotes.path().join(format!("{name}.git"));
        std::fs::create_dir_all(&repo)?;
        std::fs::create_dir_all(&remote)?;
        init_repo(&repo, branch)?;
        attach_remote(&repo, &remote, branch)?;
        Ok(repo)
    }

    pub fn add_plain_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.dir.path().join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
