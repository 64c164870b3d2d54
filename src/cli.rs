//! Command line arguments and the interactive directory prompt.

use crate::config::{Config, Verbosity};
use crate::constants::{DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_PROBE_TIMEOUT_SECS};
use anyhow::Context;
use clap::Parser;
use dialoguer::{Confirm, Input};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "git-multi-pull", version)]
#[command(
    about = "Pull every local branch of every git repository under a directory, then return each repository to the branch it was on"
)]
pub struct Cli {
    /// A repository, or a directory whose immediate subdirectories are repositories.
    /// Prompted for when omitted.
    pub root: Option<PathBuf>,

    /// Only print errors and a one-line summary
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print every event and every git command
    #[arg(short, long)]
    pub verbose: bool,

    /// Timeout in seconds for each checkout, pull and status command
    #[arg(long, env = "GIT_MULTI_PULL_TIMEOUT", default_value_t = DEFAULT_COMMAND_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Timeout in seconds for detecting whether a directory is a repository
    #[arg(long, env = "GIT_MULTI_PULL_PROBE_TIMEOUT", default_value_t = DEFAULT_PROBE_TIMEOUT_SECS)]
    pub probe_timeout: u64,
}

impl Cli {
    #[must_use]
    pub fn config(&self) -> Config {
        let verbosity = if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Config {
            verbosity,
            probe_timeout: Duration::from_secs(self.probe_timeout),
            command_timeout: Duration::from_secs(self.timeout),
        }
    }

    /// The directory to update: the positional argument, or one picked
    /// interactively. `None` when the user declines to start.
    pub fn resolve_root(&self) -> anyhow::Result<Option<PathBuf>> {
        if let Some(root) = &self.root {
            return Ok(Some(root.clone()));
        }
        if !std::io::stdin().is_terminal() {
            anyhow::bail!("no directory given and stdin is not a terminal");
        }
        prompt_for_root()
    }
}

fn prompt_for_root() -> anyhow::Result<Option<PathBuf>> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    let input: String = Input::new()
        .with_prompt("Directory to update")
        .default(cwd.display().to_string())
        .validate_with(|input: &String| -> Result<(), String> {
            if PathBuf::from(input).is_dir() {
                Ok(())
            } else {
                Err(format!("{input} is not a directory"))
            }
        })
        .interact_text()
        .context("Failed to read directory")?;
    let root = PathBuf::from(input);

    let confirmed = Confirm::new()
        .with_prompt(format!("Update all repositories in {}?", root.display()))
        .default(true)
        .interact()
        .context("Failed to read confirmation")?;

    Ok(confirmed.then_some(root))
}
