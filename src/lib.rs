//! Multi-repository branch updater library.
//!
//! This crate updates every git repository under a root directory by:
//! - Discovering the root repository, or the repositories directly inside it
//! - Refusing to touch repositories with uncommitted changes
//! - Checking out and pulling each local branch in turn
//! - Restoring the branch that was checked out before
//!
//! The work runs on a background thread and reports through a stream of
//! timestamped events.

pub mod cancel;
pub mod cli;
pub mod config;
pub mod constants;
pub mod discover;
pub mod error;
pub mod events;
pub mod git;
pub mod orchestrator;
pub mod output;
pub mod probe;
pub mod repo;

#[cfg(test)]
mod test_support;
