//! Configuration loading and validation.
//!
//! The file is TOML: top-level `cert`, `key`, `ca` source paths, an optional
//! `watch` list, and `[[actions]]` records. Everything is validated once at
//! startup; the resulting [`Config`] is immutable for the daemon's lifetime.

use crate::models::action::ActionSpec;
use crate::models::source::CertificateSource;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub source: CertificateSource,
    /// Paths the daemon subscribes to. Defaults to the certificate path
    /// only: renewals are detected via the certificate file, not the key
    /// or CA file.
    #[serde(default)]
    pub watch: Vec<PathBuf>,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

/// Read, parse, and validate a configuration file.
///
/// Any failure here is fatal to startup.
pub fn load(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    let config = parse(&content)
        .with_context(|| format!("parse config file {}", path.display()))?;
    config.source.validate()?;
    Ok(config)
}

/// Parse and validate configuration content (testable without filesystem).
///
/// Does everything except the source regular-file checks.
pub fn parse(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content).context("decode configuration")?;

    // An empty fullchain value means the same as leaving it out.
    for action in &mut config.actions {
        if matches!(&action.fullchain, Some(p) if p.as_os_str().is_empty()) {
            action.fullchain = None;
        }
    }

    validate_actions(&config.actions)?;

    if config.watch.is_empty() {
        config.watch = vec![config.source.cert.clone()];
    }

    Ok(config)
}

/// Reject action lists the runner cannot execute safely.
///
/// Two actions writing the same destination path would race, so overlapping
/// destinations are a load-time error rather than an unchecked hazard.
/// Duplicate names are rejected too since the name is the only handle an
/// operator has in the logs.
fn validate_actions(actions: &[ActionSpec]) -> Result<()> {
    for action in actions {
        if action.name.trim().is_empty() {
            bail!("action with empty name");
        }
    }

    for (i, action) in actions.iter().enumerate() {
        for other in &actions[i + 1..] {
            if action.name == other.name {
                bail!("duplicate action name '{}'", action.name);
            }
        }
    }

    let mut destinations: Vec<(&Path, &str)> = Vec::new();
    for action in actions {
        destinations.push((action.cert.as_path(), action.name.as_str()));
        destinations.push((action.key.as_path(), action.name.as_str()));
        if let Some(fullchain) = &action.fullchain {
            destinations.push((fullchain.as_path(), action.name.as_str()));
        }
    }
    for (i, (path, name)) in destinations.iter().enumerate() {
        for (other_path, other_name) in &destinations[i + 1..] {
            if path == other_path {
                bail!(
                    "destination {} used by both '{}' and '{}'",
                    path.display(),
                    name,
                    other_name
                );
            }
        }
    }

    Ok(())
}
