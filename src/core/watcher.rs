//! Filesystem watch subscription and the dispatch loop.
//!
//! Renewal is detected via write events on the watched paths (by default
//! just the certificate file). The dispatch loop is a single task: while a
//! distribution run is in flight, new events sit in the OS notification
//! buffer, and an overflow there loses them silently.

use crate::core::runner::ActionRunner;
use crate::introspect::DaemonStatus;
use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Watch subscription handle; events arrive on an internal channel.
///
/// Dropping this stops the watch, so it stays alive for the daemon's
/// whole run inside [`dispatch`].
pub struct CertWatcher {
    watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl CertWatcher {
    /// Open the underlying OS notification channel.
    ///
    /// Failure here is fatal to startup.
    pub fn new() -> Result<Self> {
        let (tx, events) = mpsc::unbounded_channel();
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })
        .context("create filesystem watcher")?;
        Ok(Self { watcher, events })
    }

    /// Subscribe to change notifications for one path.
    ///
    /// A failure is logged and the daemon keeps running; with every watch
    /// failed it idles without ever observing an event.
    pub fn watch(&mut self, path: &Path) {
        match self.watcher.watch(path, RecursiveMode::NonRecursive) {
            Ok(()) => debug!(path = %path.display(), "added watch"),
            Err(e) => error!(path = %path.display(), error = %e, "cannot watch path"),
        }
    }
}

/// Whether an event kind indicates the watched file's contents changed.
pub fn is_write_event(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(ModifyKind::Data(_)))
}

/// Consume watcher events until the stream closes.
///
/// Write events trigger a full distribution run; the loop blocks until the
/// run finishes, so runs never overlap. Watch errors and non-write events
/// are logged and skipped.
pub async fn dispatch(mut watcher: CertWatcher, runner: ActionRunner, status: Arc<DaemonStatus>) {
    while let Some(item) = watcher.events.recv().await {
        match item {
            Err(e) => error!(error = %e, "problem watching files"),
            Ok(event) if is_write_event(&event.kind) => {
                info!(paths = ?event.paths, "certificate change detected, distributing");
                let started = Instant::now();
                runner.run_all().await;
                status.record_run(started.elapsed());
            }
            Ok(event) => debug!(kind = ?event.kind, "ignoring event"),
        }
    }
    info!("event stream closed, stopping dispatch");
}
