//! Drives a whole run on a background worker thread.

use crate::cancel::CancellationToken;
use crate::discover;
use crate::error::DiscoveryError;
use crate::events::{EventSink, UpdateEvent};
use crate::probe::VersionControl;
use crate::repo::{self, RepoReport};
use crossbeam_channel::Receiver;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Everything a run produced, for the final summary.
#[derive(Debug)]
pub struct RunSummary {
    pub root: PathBuf,
    pub reports: Vec<RepoReport>,
    pub discovery_error: Option<DiscoveryError>,
    pub cancelled: bool,
    pub duration: Duration,
}

impl RunSummary {
    fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            reports: Vec::new(),
            discovery_error: None,
            cancelled: false,
            duration: Duration::ZERO,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.is_success()).count()
    }

    pub fn is_success(&self) -> bool {
        self.discovery_error.is_none()
            && !self.cancelled
            && self.reports.iter().all(RepoReport::is_success)
    }
}

/// Updates every repository under `root`, one after another.
///
/// Performs no git operations itself; it sequences discovery and the updater
/// and relays their events.
pub fn run<V, S>(root: &Path, vcs: &V, sink: &S, cancel: &CancellationToken) -> RunSummary
where
    V: VersionControl + ?Sized,
    S: EventSink + ?Sized,
{
    let start = Instant::now();
    let mut summary = RunSummary::new(root);

    let repositories = match discover::discover(root, vcs) {
        Ok(repositories) => repositories,
        Err(err) => {
            sink.error(format!("Error: {err}"));
            summary.discovery_error = Some(err);
            summary.duration = start.elapsed();
            return summary;
        }
    };

    // A token cancelled during discovery makes every probe answer "not a
    // repository", so an empty result here cannot be trusted.
    if cancel.is_cancelled() {
        let message = "Update cancelled during repository discovery".to_string();
        return stop_cancelled(summary, sink, message, start);
    }

    if repositories.is_empty() {
        sink.info(format!("No git repositories found in {}", root.display()));
    }

    for (index, path) in repositories.iter().enumerate() {
        if cancel.is_cancelled() {
            let remaining = repositories.len() - index;
            let message = format!("Update cancelled, {remaining} repositories not processed");
            return stop_cancelled(summary, sink, message, start);
        }
        summary.reports.push(repo::update(path, vcs, sink, cancel));
    }

    if cancel.is_cancelled() {
        let message = "Update cancelled before completion".to_string();
        return stop_cancelled(summary, sink, message, start);
    }

    sink.info("Update finished!".to_string());
    summary.duration = start.elapsed();
    summary
}

fn stop_cancelled<S>(
    mut summary: RunSummary,
    sink: &S,
    message: String,
    start: Instant,
) -> RunSummary
where
    S: EventSink + ?Sized,
{
    summary.cancelled = true;
    sink.error(message);
    summary.duration = start.elapsed();
    summary
}

/// A run executing on its worker thread.
pub struct RunHandle {
    events: Receiver<UpdateEvent>,
    worker: JoinHandle<RunSummary>,
}

impl RunHandle {
    /// Events in emission order. Iteration ends when the worker finishes.
    pub fn events(&self) -> &Receiver<UpdateEvent> {
        &self.events
    }

    pub fn join(self) -> anyhow::Result<RunSummary> {
        self.worker
            .join()
            .map_err(|_| anyhow::anyhow!("update worker panicked"))
    }
}

/// Starts [`run`] on a dedicated worker thread.
///
/// Only fails if the thread cannot be spawned.
pub fn spawn<V>(root: PathBuf, vcs: V, cancel: CancellationToken) -> std::io::Result<RunHandle>
where
    V: VersionControl + Send + 'static,
{
    let (sender, events) = crossbeam_channel::unbounded();
    let worker = thread::Builder::new()
        .name("git-multi-pull-worker".to_string())
        .spawn(move || run(&root, &vcs, &sender, &cancel))?;

    Ok(RunHandle { events, worker })
}
