//! Authority-managed certificate source locations.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Paths to the certificate material written by the certificate authority.
///
/// The bytes behind these paths are treated as opaque payloads; nothing here
/// parses or verifies certificate contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSource {
    pub cert: PathBuf,
    pub key: PathBuf,
    pub ca: PathBuf,
}

impl CertificateSource {
    /// Check that all three source paths are existing regular files.
    ///
    /// Runs once at startup; events later in the daemon's life do not
    /// re-validate the sources.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.cert, &self.key, &self.ca] {
            check_regular_file(path)?;
        }
        Ok(())
    }
}

fn check_regular_file(path: &Path) -> Result<()> {
    let meta = fs::metadata(path)
        .with_context(|| format!("stat source file {}", path.display()))?;
    if !meta.is_file() {
        bail!("{} is not a regular file", path.display());
    }
    Ok(())
}
