//! Application-wide constants.
//!
//! Centralized configuration values to avoid magic numbers throughout the codebase.

/// Default timeout for the repository detection probe (in seconds).
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Default timeout for every other git invocation (in seconds).
/// Pulls talk to the network, so this is generous.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;

/// How often a running git child is polled for exit, cancellation and timeout.
pub const PROCESS_POLL_MS: u64 = 20;

/// Progress spinner tick interval in milliseconds.
pub const PROGRESS_TICK_MS: u64 = 80;

/// Timestamp prefix format for rendered events (millisecond precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Output printed by `git rev-parse --abbrev-ref HEAD` when HEAD is detached.
pub const DETACHED_HEAD: &str = "HEAD";
