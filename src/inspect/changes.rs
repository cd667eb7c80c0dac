//! Transitive dependency change resolution between two manifest states

use crate::manifest::ManifestSnapshot;

/// A dependency whose pinned version differs between two manifest states
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedDependency {
  /// Module path of the dependency
  pub path: String,
  /// Version in the old state; `None` means newly introduced
  pub old_version: Option<String>,
  /// Version in the new state
  pub new_version: String,
}

/// Every dependency of the new snapshot whose version differs from, or is
/// absent in, the old snapshot. Both snapshots must be fully resolved
/// (post-tidy) so their require directives list the complete dependency
/// set. Dependencies dropped by the upgrade produce no entry; there is
/// nothing to analyze for them.
pub fn changed_dependencies(old: &ManifestSnapshot, new: &ManifestSnapshot) -> Vec<ChangedDependency> {
  let old_versions = old.require_versions();

  new
    .require_versions()
    .into_iter()
    .filter_map(|(path, new_version)| {
      let old_version = old_versions.get(&path).cloned();
      if old_version.as_deref() == Some(new_version.as_str()) {
        return None;
      }
      Some(ChangedDependency {
        path,
        old_version,
        new_version,
      })
    })
    .collect()
}
