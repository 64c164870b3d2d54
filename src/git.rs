//! Git command wrappers.
//!
//! Every git invocation runs as a child process with captured output, a
//! timeout, and an optional cancellation token. [`GitCli`] builds the
//! [`VersionControl`] operations on top of that runner.

use crate::cancel::CancellationToken;
use crate::config::Config;
use crate::constants::{DETACHED_HEAD, PROCESS_POLL_MS};
use crate::error::GitError;
use crate::probe::{
    self, BranchName, HeadState, PullOutcome, VersionControl, WorkTreeStatus,
};
use anyhow::Context;
use colored::Colorize;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Callback invoked before each git command with the repository and arguments.
pub type GitLogger = fn(&Path, &[&str]);

pub fn no_op_logger(_repo: &Path, _args: &[&str]) {}

pub fn verbose_logger(repo: &Path, args: &[&str]) {
    eprintln!(
        "{}",
        format!("  $ git {}  ({})", args.join(" "), repo.display()).dimmed()
    );
}

/// Captured output of a git command, trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    fn from_bytes(stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            stdout: String::from_utf8_lossy(stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }

    /// The most useful text for an error message: stderr, or stdout if git
    /// wrote nothing to stderr.
    pub fn diagnostic(&self) -> &str {
        if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Runs git without a timeout and returns trimmed stdout.
///
/// Convenience for setting up repositories; the update path uses
/// [`run_git_bounded`].
pub fn run_git(repo: &Path, args: &[&str]) -> anyhow::Result<String> {
    let output = Command::new("git")
        .current_dir(repo)
        .args(args)
        .output()
        .context("Failed to execute git command")?;

    if output.status.success() {
        let result = String::from_utf8_lossy(&output.stdout);
        Ok(result.as_ref().trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git {} failed: {}", args.join(" "), stderr)
    }
}

/// Runs git in `repo`, killing it once `timeout` elapses or `cancel` fires.
///
/// Credential prompts are disabled and messages are forced to the C locale so
/// output can be classified.
pub fn run_git_bounded(
    repo: &Path,
    args: &[&str],
    timeout: Duration,
    cancel: Option<&CancellationToken>,
) -> Result<GitOutput, GitError> {
    let label = args.join(" ");
    let mut command = Command::new("git");
    command
        .current_dir(repo)
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("LC_ALL", "C");

    let (status, output) = execute(command, &label, timeout, cancel)?;

    if status.success() {
        Ok(output)
    } else {
        Err(GitError::Failed {
            command: label,
            code: status.code().unwrap_or(-1),
            output,
        })
    }
}

/// Spawns `command` with piped output and waits for it under the given bounds.
fn execute(
    mut command: Command,
    label: &str,
    timeout: Duration,
    cancel: Option<&CancellationToken>,
) -> Result<(ExitStatus, GitOutput), GitError> {
    let cancelled = || cancel.is_some_and(CancellationToken::is_cancelled);
    if cancelled() {
        return Err(GitError::Cancelled {
            command: label.to_string(),
        });
    }

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| GitError::Spawn {
            command: label.to_string(),
            source,
        })?;

    // Pipes are drained concurrently so a chatty child never blocks on a full
    // pipe buffer while we poll.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let start = Instant::now();
    let poll_interval = Duration::from_millis(PROCESS_POLL_MS);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if cancelled() {
                    kill_process(&mut child);
                    return Err(GitError::Cancelled {
                        command: label.to_string(),
                    });
                }
                if start.elapsed() >= timeout {
                    kill_process(&mut child);
                    return Err(GitError::Timeout {
                        command: label.to_string(),
                        timeout,
                    });
                }
                thread::sleep(poll_interval);
            }
            Err(source) => {
                kill_process(&mut child);
                return Err(GitError::Wait {
                    command: label.to_string(),
                    source,
                });
            }
        }
    };

    let stdout = stdout.join().unwrap_or_default();
    let stderr = stderr.join().unwrap_or_default();
    Ok((status, GitOutput::from_bytes(&stdout, &stderr)))
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Kill a process and reap it. Reader threads are left to finish on their own
/// since grandchildren (ssh, credential helpers) may still hold the pipes.
fn kill_process(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn validate_branch_name(branch: &str) -> Result<(), GitError> {
    if branch.is_empty()
        || branch.contains('\0')
        || branch.contains('\n')
        || branch.starts_with('-')
    {
        return Err(GitError::InvalidBranchName(branch.to_string()));
    }
    Ok(())
}

/// [`VersionControl`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    probe_timeout: Duration,
    command_timeout: Duration,
    cancel: CancellationToken,
    logger: GitLogger,
}

impl GitCli {
    pub fn new(config: &Config, cancel: CancellationToken) -> Self {
        Self {
            probe_timeout: config.probe_timeout,
            command_timeout: config.command_timeout,
            cancel,
            logger: config.git_logger(),
        }
    }

    fn run(&self, repo: &Path, args: &[&str]) -> Result<GitOutput, GitError> {
        (self.logger)(repo, args);
        run_git_bounded(repo, args, self.command_timeout, Some(&self.cancel))
    }
}

impl VersionControl for GitCli {
    fn is_repository(&self, path: &Path) -> bool {
        let args = ["rev-parse", "--git-dir"];
        (self.logger)(path, &args);
        path.is_dir()
            && run_git_bounded(path, &args, self.probe_timeout, Some(&self.cancel)).is_ok()
    }

    fn list_local_branches(&self, path: &Path) -> Vec<BranchName> {
        self.run(path, &["branch", "--format=%(refname:short)"])
            .map(|output| probe::parse_branch_list(&output.stdout))
            .unwrap_or_default()
    }

    fn work_tree_status(&self, path: &Path) -> WorkTreeStatus {
        match self.run(path, &["status", "--porcelain"]) {
            Ok(output) if output.stdout.is_empty() => WorkTreeStatus::Clean,
            Ok(_) => WorkTreeStatus::Dirty,
            Err(err) => WorkTreeStatus::Unknown(err.to_string()),
        }
    }

    fn current_head(&self, path: &Path) -> HeadState {
        match self.run(path, &["rev-parse", "--abbrev-ref", "HEAD"]) {
            Ok(output) if output.stdout == DETACHED_HEAD => HeadState::Detached,
            Ok(output) if output.stdout.is_empty() => {
                HeadState::Unreadable("git printed no branch name".to_string())
            }
            Ok(output) => HeadState::Branch(BranchName::new(output.stdout)),
            Err(err) => HeadState::Unreadable(err.to_string()),
        }
    }

    fn checkout(&self, path: &Path, branch: &BranchName) -> Result<(), GitError> {
        validate_branch_name(branch.as_str())?;
        self.run(path, &["checkout", branch.as_str()])?;
        Ok(())
    }

    fn pull(&self, path: &Path) -> Result<PullOutcome, GitError> {
        let output = self.run(path, &["pull"])?;
        Ok(probe::parse_pull_output(&output.stdout))
    }

    fn restore(&self, path: &Path, branch: &BranchName) -> Result<(), GitError> {
        validate_branch_name(branch.as_str())?;
        let args = ["checkout", branch.as_str()];
        (self.logger)(path, &args);
        run_git_bounded(path, &args, self.command_timeout, None)?;
        Ok(())
    }
}
