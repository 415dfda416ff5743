use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaOutcome {
    pub target: PathBuf,
    /// Bytes copied, or the error chain of a failed copy.
    pub result: std::result::Result<u64, String>,
}

/// Copies the finished store file to every target, creating parent
/// directories. Each target is tried once; a failure is reported and the
/// rest still run. A target naming the source itself is skipped.
pub fn replicate(source: &Path, targets: &[PathBuf]) -> Vec<ReplicaOutcome> {
    let mut out = Vec::new();
    for target in targets {
        if same_path(source, target) {
            debug!(target = %target.display(), "replica is the primary store, skipping");
            continue;
        }
        let result = copy_store(source, target).map_err(|err| format!("{err:#}"));
        match &result {
            Ok(bytes) => info!(target = %target.display(), bytes, "replicated store"),
            Err(err) => warn!(target = %target.display(), "replication failed: {err}"),
        }
        out.push(ReplicaOutcome {
            target: target.clone(),
            result,
        });
    }
    out
}

fn copy_store(source: &Path, target: &Path) -> Result<u64> {
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create replica directory {}", parent.display()))?;
    }
    fs::copy(source, target)
        .with_context(|| format!("copy {} to {}", source.display(), target.display()))
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (std::path::absolute(a), std::path::absolute(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vbdb-replicate-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn copies_into_new_directories_and_skips_self() {
        let dir = scratch_dir("copy");
        let source = dir.join("vbdb.db");
        fs::write(&source, b"sqlite bytes").unwrap();
        let nested = dir.join("a").join("b").join("copy.db");

        let outcomes = replicate(&source, &[source.clone(), nested.clone()]);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].result, Ok(12));
        assert_eq!(fs::read(&nested).unwrap(), b"sqlite bytes");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_source_reports_error() {
        let dir = scratch_dir("missing");
        let outcomes = replicate(&dir.join("absent.db"), &[dir.join("copy.db")]);
        assert!(outcomes[0].result.is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
