//! Concurrent per-action distribution runner.
//!
//! One worker task per configured action, no pooling: concurrency equals
//! the action count. The caller gets control back only once every worker
//! has finished, whether or not individual steps failed. Step failures are
//! logged and never abort the rest of the worker's steps, and never affect
//! another action.

use crate::core::{fileops, hooks};
use crate::models::action::ActionSpec;
use crate::models::source::CertificateSource;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Per-action diagnostics from one run. Never persisted.
#[derive(Debug, Clone)]
pub struct WorkResult {
    pub name: String,
    pub elapsed: Duration,
    pub failed_steps: u32,
}

/// Executes the configured action set against the certificate source.
pub struct ActionRunner {
    source: Arc<CertificateSource>,
    actions: Vec<ActionSpec>,
}

impl ActionRunner {
    pub fn new(source: CertificateSource, actions: Vec<ActionSpec>) -> Self {
        Self {
            source: Arc::new(source),
            actions,
        }
    }

    /// Run every action concurrently and wait for all of them.
    ///
    /// Returns one [`WorkResult`] per finished worker. There is no
    /// aggregate success value; per-step outcomes are only in the logs.
    pub async fn run_all(&self) -> Vec<WorkResult> {
        let mut workers = JoinSet::new();
        for action in &self.actions {
            workers.spawn(run_action(Arc::clone(&self.source), action.clone()));
        }

        let mut results = Vec::with_capacity(self.actions.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!(error = %e, "action worker did not finish"),
            }
        }

        let failed = results.iter().filter(|r| r.failed_steps > 0).count();
        info!(
            actions = results.len(),
            failed, "distribution run complete"
        );
        results
    }
}

async fn run_action(source: Arc<CertificateSource>, action: ActionSpec) -> WorkResult {
    let started = Instant::now();
    let mut failed_steps = 0u32;

    for command in &action.pre {
        if !hooks::run_logged(&action.name, "pre", command).await {
            failed_steps += 1;
        }
    }

    debug!(
        action = %action.name,
        from = %source.cert.display(),
        to = %action.cert.display(),
        "copying certificate"
    );
    match fileops::copy(&source.cert, &action.cert).await {
        Ok(bytes) => debug!(action = %action.name, bytes, "certificate copied"),
        Err(e) => {
            error!(action = %action.name, error = %e, "failed to copy certificate");
            failed_steps += 1;
        }
    }

    debug!(
        action = %action.name,
        from = %source.key.display(),
        to = %action.key.display(),
        "copying key"
    );
    match fileops::copy(&source.key, &action.key).await {
        Ok(bytes) => debug!(action = %action.name, bytes, "key copied"),
        Err(e) => {
            error!(action = %action.name, error = %e, "failed to copy key");
            failed_steps += 1;
        }
    }

    if let Some(fullchain) = &action.fullchain {
        debug!(action = %action.name, path = %fullchain.display(), "writing fullchain");
        match fileops::concat(fullchain, &[&source.cert, &source.ca]).await {
            Ok(bytes) => debug!(action = %action.name, bytes, "fullchain written"),
            Err(e) => {
                error!(action = %action.name, error = %e, "failed to write fullchain");
                failed_steps += 1;
            }
        }
    }

    for command in &action.post {
        if !hooks::run_logged(&action.name, "post", command).await {
            failed_steps += 1;
        }
    }

    let elapsed = started.elapsed();
    debug!(action = %action.name, ?elapsed, "action finished");
    WorkResult {
        name: action.name,
        elapsed,
        failed_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::action::HookCommand;
    use std::fs;
    use std::path::Path;

    fn write_source(dir: &Path) -> CertificateSource {
        let source = CertificateSource {
            cert: dir.join("server.crt"),
            key: dir.join("server.key"),
            ca: dir.join("ca.crt"),
        };
        fs::write(&source.cert, b"CERT BYTES\n").unwrap();
        fs::write(&source.key, b"KEY BYTES\n").unwrap();
        fs::write(&source.ca, b"CA BYTES\n").unwrap();
        source
    }

    fn action_in(dir: &Path, name: &str) -> ActionSpec {
        let target = dir.join(name);
        fs::create_dir_all(&target).unwrap();
        ActionSpec {
            name: name.to_string(),
            cert: target.join("server.crt"),
            key: target.join("server.key"),
            fullchain: None,
            pre: Vec::new(),
            post: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_destinations_match_source_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path());
        let action = action_in(dir.path(), "web");
        let runner = ActionRunner::new(source.clone(), vec![action.clone()]);

        let results = runner.run_all().await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].failed_steps, 0);
        assert_eq!(fs::read(&action.cert).unwrap(), fs::read(&source.cert).unwrap());
        assert_eq!(fs::read(&action.key).unwrap(), fs::read(&source.key).unwrap());
    }

    #[tokio::test]
    async fn test_fullchain_only_where_configured() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path());
        let mut with_chain = action_in(dir.path(), "with-chain");
        with_chain.fullchain = Some(dir.path().join("with-chain/fullchain.pem"));
        let without_chain = action_in(dir.path(), "without-chain");

        let runner =
            ActionRunner::new(source, vec![with_chain.clone(), without_chain.clone()]);
        runner.run_all().await;

        let fullchain = fs::read(with_chain.fullchain.as_ref().unwrap()).unwrap();
        assert_eq!(fullchain, b"CERT BYTES\nCA BYTES\n");
        assert!(!dir.path().join("without-chain/fullchain.pem").exists());
    }

    #[tokio::test]
    async fn test_failing_pre_hook_does_not_stop_copies() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path());
        let mut action = action_in(dir.path(), "stubborn");
        action.pre = vec![HookCommand::Line("false".into())];
        action.post = vec![HookCommand::Line("true".into())];

        let runner = ActionRunner::new(source.clone(), vec![action.clone()]);
        let results = runner.run_all().await;

        assert_eq!(results[0].failed_steps, 1);
        assert_eq!(fs::read(&action.cert).unwrap(), fs::read(&source.cert).unwrap());
    }

    #[tokio::test]
    async fn test_one_failing_action_does_not_affect_others() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path());
        let broken = ActionSpec {
            name: "broken".into(),
            cert: dir.path().join("missing-dir/server.crt"),
            key: dir.path().join("missing-dir/server.key"),
            fullchain: None,
            pre: Vec::new(),
            post: Vec::new(),
        };
        let healthy = action_in(dir.path(), "healthy");

        let runner = ActionRunner::new(source.clone(), vec![broken, healthy.clone()]);
        let results = runner.run_all().await;

        assert_eq!(results.len(), 2);
        let broken_result = results.iter().find(|r| r.name == "broken").unwrap();
        assert_eq!(broken_result.failed_steps, 2);
        let healthy_result = results.iter().find(|r| r.name == "healthy").unwrap();
        assert_eq!(healthy_result.failed_steps, 0);
        assert_eq!(fs::read(&healthy.cert).unwrap(), fs::read(&source.cert).unwrap());
    }

    #[tokio::test]
    async fn test_all_workers_finish_before_return() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path());
        let actions: Vec<ActionSpec> = (0..4)
            .map(|i| action_in(dir.path(), &format!("target-{i}")))
            .collect();

        let runner = ActionRunner::new(source.clone(), actions.clone());
        let results = runner.run_all().await;

        // Completion is established by the join, not by any message from
        // the workers: once run_all returns, every side effect is visible.
        assert_eq!(results.len(), 4);
        for action in &actions {
            assert_eq!(fs::read(&action.cert).unwrap(), fs::read(&source.cert).unwrap());
            assert_eq!(fs::read(&action.key).unwrap(), fs::read(&source.key).unwrap());
        }
    }

    #[tokio::test]
    async fn test_post_hook_runs_after_copy() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path());
        let mut action = action_in(dir.path(), "ordered");
        let marker = dir.path().join("ordered/marker");
        // The post hook copies the freshly written destination cert, so the
        // marker only matches if copies happened first.
        action.post = vec![HookCommand::Argv(vec![
            "cp".into(),
            action.cert.to_string_lossy().into_owned(),
            marker.to_string_lossy().into_owned(),
        ])];

        let runner = ActionRunner::new(source.clone(), vec![action]);
        let results = runner.run_all().await;

        assert_eq!(results[0].failed_steps, 0);
        assert_eq!(fs::read(&marker).unwrap(), fs::read(&source.cert).unwrap());
    }
}
