//! Whole-file copy and concatenation primitives.
//!
//! Destinations are created-or-truncated in place, so a concurrent reader
//! of a destination may observe a partially written file.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{self, AsyncWriteExt};

/// Copy all bytes from `src` to `dst`, returning the byte count.
///
/// Fails if the source is unreadable or the destination's directory does
/// not exist; the destination is truncated first either way.
pub async fn copy(src: &Path, dst: &Path) -> Result<u64> {
    let mut source = File::open(src)
        .await
        .with_context(|| format!("open {}", src.display()))?;
    let mut dest = File::create(dst)
        .await
        .with_context(|| format!("create {}", dst.display()))?;
    let bytes = io::copy(&mut source, &mut dest)
        .await
        .with_context(|| format!("copy {} to {}", src.display(), dst.display()))?;
    dest.flush()
        .await
        .with_context(|| format!("flush {}", dst.display()))?;
    Ok(bytes)
}

/// Write the concatenation of `sources`, in order, to `dst`.
///
/// The destination is created-or-truncated once, then each source is
/// streamed onto it. The first source failure stops the operation; bytes
/// already written from earlier sources remain on disk.
pub async fn concat(dst: &Path, sources: &[&Path]) -> Result<u64> {
    let mut dest = File::create(dst)
        .await
        .with_context(|| format!("create {}", dst.display()))?;
    let result = append_sources(&mut dest, sources).await;
    dest.flush()
        .await
        .with_context(|| format!("flush {}", dst.display()))?;
    result
}

async fn append_sources(dest: &mut File, sources: &[&Path]) -> Result<u64> {
    let mut total = 0u64;
    for src in sources {
        let mut source = File::open(src)
            .await
            .with_context(|| format!("open {}", src.display()))?;
        total += io::copy(&mut source, dest)
            .await
            .with_context(|| format!("append {}", src.display()))?;
    }
    Ok(total)
}
