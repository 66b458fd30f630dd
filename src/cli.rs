//! Command-line surface and daemon bootstrap.

use crate::constants;
use crate::core::config;
use crate::core::runner::ActionRunner;
use crate::core::watcher::{self, CertWatcher};
use crate::introspect::{self, DaemonStatus};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "renewd",
    version,
    about = "Distributes renewed TLS certificates to dependent services"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(
        long,
        env = "RENEWD_CONFIG",
        value_name = "PATH",
        default_value = constants::DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(long, short = 'd')]
    pub debug: bool,

    /// Serve runtime introspection data on localhost
    #[arg(long, short = 'p')]
    pub profile: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_logging(self.debug);

        let config = config::load(&self.config)?;
        info!(file = %self.config.display(), "loaded configuration");
        debug!(cert = %config.source.cert.display(), "using source certificate");
        debug!(key = %config.source.key.display(), "using source key");
        debug!(ca = %config.source.ca.display(), "using source ca");

        if config.actions.is_empty() {
            info!("no actions configured, nothing to do");
            return Ok(());
        }
        debug!(count = config.actions.len(), "actions to process");

        let status = DaemonStatus::new(config.watch.clone(), config.actions.len());
        if self.profile {
            introspect::spawn(Arc::clone(&status));
        }

        let mut cert_watcher = CertWatcher::new()?;
        for path in &config.watch {
            cert_watcher.watch(path);
        }

        let runner = ActionRunner::new(config.source, config.actions);
        watcher::dispatch(cert_watcher, runner, status).await;
        Ok(())
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["renewd"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(constants::DEFAULT_CONFIG_PATH));
        assert!(!cli.debug);
        assert!(!cli.profile);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from(["renewd", "-d", "-p", "--config", "/tmp/c.toml"]).unwrap();
        assert!(cli.debug);
        assert!(cli.profile);
        assert_eq!(cli.config, PathBuf::from("/tmp/c.toml"));
    }
}
