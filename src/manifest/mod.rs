//! Transactional handling of the live `go.mod` and `go.sum` files
//!
//! Pinning a dependency version mutates the consuming module's files in
//! place. [`ModTransaction`] snapshots both files up front and guarantees
//! that, whatever happens during a mutation, the live files can be put
//! back byte-for-byte. Restore is idempotent and verified; a restore
//! failure is reported distinctly because the working tree is then in an
//! unknown state.

use crate::core::error::{InspectError, InspectResult, ResultExt, SetupError};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The dependency manifest file name
pub const GO_MOD: &str = "go.mod";
/// The checksum/lock file name
pub const GO_SUM: &str = "go.sum";

/// Exact byte copies of the module files plus their live locations
#[derive(Debug, Clone)]
pub struct ManifestSnapshot {
  mod_path: PathBuf,
  sum_path: PathBuf,
  mod_contents: Vec<u8>,
  sum_contents: Vec<u8>,
}

impl ManifestSnapshot {
  /// Read the live module files under `module_root`.
  ///
  /// A missing file is fatal: nothing can be pinned or restored without
  /// both files present.
  pub fn read(module_root: &Path) -> InspectResult<Self> {
    let mod_path = module_root.join(GO_MOD);
    let sum_path = module_root.join(GO_SUM);
    let mod_contents = read_manifest_file(&mod_path)?;
    let sum_contents = read_manifest_file(&sum_path)?;
    Ok(Self {
      mod_path,
      sum_path,
      mod_contents,
      sum_contents,
    })
  }

  /// The pinned version of every required dependency, keyed by module path.
  ///
  /// After `go mod tidy` the `require` directives list the full resolved
  /// set, including indirect dependencies.
  pub fn require_versions(&self) -> BTreeMap<String, String> {
    let contents = String::from_utf8_lossy(&self.mod_contents);
    let mut versions = BTreeMap::new();
    let mut in_require = false;

    for line in contents.lines() {
      let line = match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
      };
      let line = line.trim();

      if in_require {
        if line == ")" {
          in_require = false;
          continue;
        }
        if let Some((path, version)) = split_require_entry(line) {
          versions.insert(path, version);
        }
        continue;
      }

      if line == "require (" {
        in_require = true;
        continue;
      }
      if let Some(rest) = line.strip_prefix("require ")
        && let Some((path, version)) = split_require_entry(rest.trim())
      {
        versions.insert(path, version);
      }
    }

    versions
  }

  /// The pinned version of a single dependency, if required
  pub fn resolved_version(&self, dep: &str) -> Option<String> {
    self.require_versions().get(dep).cloned()
  }
}

fn read_manifest_file(path: &Path) -> InspectResult<Vec<u8>> {
  if !path.is_file() {
    return Err(InspectError::Setup(SetupError::ManifestNotFound {
      path: path.to_path_buf(),
    }));
  }
  fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn split_require_entry(entry: &str) -> Option<(String, String)> {
  let mut parts = entry.split_whitespace();
  let path = parts.next()?;
  let version = parts.next()?;
  if !version.starts_with('v') {
    return None;
  }
  Some((path.to_string(), version.to_string()))
}

/// A begin/mutate/restore transaction over the live module files
#[derive(Debug)]
pub struct ModTransaction {
  backup: ManifestSnapshot,
}

impl ModTransaction {
  /// Snapshot the live files, returning the transaction handle
  pub fn begin(module_root: &Path) -> InspectResult<Self> {
    Ok(Self {
      backup: ManifestSnapshot::read(module_root)?,
    })
  }

  /// The pristine snapshot taken when the transaction began
  pub fn backup(&self) -> &ManifestSnapshot {
    &self.backup
  }

  /// Apply a mutation to the live files.
  ///
  /// If the mutation fails the backup is restored immediately and any
  /// restore failure is joined with (never replaces) the original error.
  pub fn mutate<T>(&self, op: impl FnOnce() -> InspectResult<T>) -> InspectResult<T> {
    match op() {
      Ok(value) => Ok(value),
      Err(err) => match self.restore() {
        Ok(()) => Err(err),
        Err(restore_err) => Err(InspectError::join(vec![err, restore_err])),
      },
    }
  }

  /// Overwrite the live files with the backup, verified byte-for-byte.
  ///
  /// Safe to call any number of times, including after a failed mutation
  /// or a previous restore.
  pub fn restore(&self) -> InspectResult<()> {
    restore_file(&self.backup.mod_path, &self.backup.mod_contents)?;
    restore_file(&self.backup.sum_path, &self.backup.sum_contents)?;
    Ok(())
  }
}

fn restore_file(path: &Path, contents: &[u8]) -> InspectResult<()> {
  // fs::write truncates before writing, so a leftover longer file from a
  // partial mutation cannot survive
  if let Err(err) = fs::write(path, contents) {
    return Err(InspectError::Setup(SetupError::RestoreFailed {
      path: path.to_path_buf(),
      reason: err.to_string(),
    }));
  }
  let written = fs::read(path).map_err(|err| {
    InspectError::Setup(SetupError::RestoreFailed {
      path: path.to_path_buf(),
      reason: err.to_string(),
    })
  })?;
  if written != contents {
    return Err(InspectError::Setup(SetupError::RestoreMismatch {
      path: path.to_path_buf(),
    }));
  }
  Ok(())
}
