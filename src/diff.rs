//! Semantic three-way diff over finding sets
//!
//! Findings from different subprocess runs are never pointer-equal, so the
//! diff is parameterized by a caller-supplied value equality predicate.
//! The result keeps the relative order of the source sets; deterministic
//! sorting is applied before diffing, not here.

/// Partitions produced by [`diff`]
#[derive(Debug, Clone)]
pub struct DiffParts<T> {
  /// Present in the old set only
  pub removed: Vec<T>,
  /// Present in both sets; the new set's element is retained
  pub stale: Vec<T>,
  /// Present in the new set only
  pub added: Vec<T>,
}

// not derived: the element type itself need not be Default
impl<T> Default for DiffParts<T> {
  fn default() -> Self {
    Self {
      removed: Vec::new(),
      stale: Vec::new(),
      added: Vec::new(),
    }
  }
}

/// Partition `old` and `new` into removed, stale, and added findings.
///
/// Two passes are required: with duplicate-looking findings a single
/// marking pass cannot classify both directions correctly. Stale entries
/// keep the matched new-set element so metadata that naturally changes
/// with the version (normalized line text, cache paths) reflects the
/// current state.
pub fn diff<T: Clone>(old: &[T], new: &[T], eq: impl Fn(&T, &T) -> bool) -> DiffParts<T> {
  let mut parts = DiffParts::default();

  for old_item in old {
    match new.iter().find(|new_item| eq(old_item, *new_item)) {
      Some(new_item) => parts.stale.push(new_item.clone()),
      None => parts.removed.push(old_item.clone()),
    }
  }
  for new_item in new {
    if !old.iter().any(|old_item| eq(old_item, new_item)) {
      parts.added.push(new_item.clone());
    }
  }

  parts
}
