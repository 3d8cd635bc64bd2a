//! Per-run scratch copies of the Terraform module.
//!
//! Each run applies from its own directory, so parallel runs never share a
//! `.terraform/` directory or a state file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Entries never copied from the source module (local state from manual runs).
const SKIPPED_ENTRIES: &[&str] = &[
    ".terraform",
    ".terraform.lock.hcl",
    "terraform.tfstate",
    "terraform.tfstate.backup",
];

const STATE_FILE: &str = "terraform.tfstate";

/// A temporary copy of a Terraform module, removed on drop unless persisted.
#[derive(Debug)]
pub struct Workspace {
    // `None` once persisted; the path then outlives this value.
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Copy `src` into a fresh directory under the system temp dir.
    pub fn copy_from(src: &Path, suffix: &str) -> Result<Self> {
        if !src.is_dir() {
            anyhow::bail!("terraform module directory not found: {}", src.display());
        }
        let dir = tempfile::Builder::new()
            .prefix(&format!("dynamo-provision-{suffix}-"))
            .tempdir()
            .context("creating terraform workspace")?;
        let path = dir.path().to_path_buf();
        copy_dir_recursive(src, &path)
            .with_context(|| format!("copying {} to {}", src.display(), path.display()))?;
        debug!(src = %src.display(), dest = %path.display(), "created terraform workspace");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the directory on drop (it holds state for a resource that still exists).
    pub fn persist(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.keep();
            warn!(path = %path.display(), "keeping terraform workspace for manual cleanup");
        }
    }

    /// Whether the local state file still tracks any resource.
    ///
    /// A missing state file means nothing was ever created from this directory.
    /// An unreadable one counts as holding resources.
    pub fn holds_resources(&self) -> bool {
        let state = self.path.join(STATE_FILE);
        let Ok(raw) = std::fs::read_to_string(&state) else {
            return state.exists();
        };
        serde_json::from_str::<serde_json::Value>(&raw).map_or(true, |v| {
            v.get("resources")
                .and_then(serde_json::Value::as_array)
                .is_none_or(|r| !r.is_empty())
        })
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        if SKIPPED_ENTRIES.iter().any(|s| name == *s) {
            continue;
        }
        let target = dst.join(&name);
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
