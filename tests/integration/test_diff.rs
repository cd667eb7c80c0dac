//! End-to-end diff scenarios over real finding types

use crate::helpers::{capability, lint_issue};
use dep_inspector::analyzers::capslock::caps_equal;
use dep_inspector::analyzers::lint::issues_equal;
use dep_inspector::diff::diff;

const DEP: &str = "example.com/dep";

#[test]
fn whitespace_only_reformat_yields_a_stale_issue() {
  let old = vec![lint_issue(
    "L",
    "T",
    "example.com/dep@v1.0.0/f.go",
    10,
    4,
    &["  foo()"],
  )];
  let new = vec![lint_issue(
    "L",
    "T",
    "example.com/dep@v1.1.0/f.go",
    10,
    4,
    &["foo()  "],
  )];

  let parts = diff(&old, &new, |a, b| issues_equal(DEP, a, b, false));
  assert!(parts.removed.is_empty());
  assert!(parts.added.is_empty());
  assert_eq!(parts.stale.len(), 1);
  // the new version's record is the one retained
  assert_eq!(parts.stale[0].source_lines, vec!["foo()  ".to_string()]);
}

#[test]
fn unrelated_new_capability_is_added_alongside_stale_match() {
  let existing = capability(
    "CAPABILITY_FILES",
    DEP,
    &[
      ("example.com/dep.Load", "", "", ""),
      ("os.ReadFile", "load.go", "12", "8"),
    ],
  );
  let unrelated = capability("CAPABILITY_NETWORK", DEP, &[("example.com/dep.Fetch", "", "", "")]);

  let old = vec![existing.clone()];
  let new = vec![existing.clone(), unrelated.clone()];

  let parts = diff(&old, &new, |a, b| caps_equal(a, b));
  assert!(parts.removed.is_empty());
  assert_eq!(parts.stale.len(), 1);
  assert_eq!(parts.stale[0].capability, "CAPABILITY_FILES");
  assert_eq!(parts.added.len(), 1);
  assert_eq!(parts.added[0].capability, "CAPABILITY_NETWORK");
}

#[test]
fn call_path_length_discriminates_capabilities() {
  let two_hop = capability(
    "CAPABILITY_FILES",
    DEP,
    &[("a", "a.go", "1", "1"), ("b", "b.go", "2", "2")],
  );
  let one_hop = capability("CAPABILITY_FILES", DEP, &[("a", "a.go", "1", "1")]);

  let parts = diff(&[two_hop], &[one_hop], |a, b| caps_equal(a, b));
  assert_eq!(parts.removed.len(), 1);
  assert!(parts.stale.is_empty());
  assert_eq!(parts.added.len(), 1);
}

#[test]
fn diff_classifies_old_and_new_completely() {
  let old: Vec<_> = (0..6)
    .map(|i| lint_issue("L", &format!("t{}", i), "example.com/dep@v1.0.0/f.go", i, 1, &[]))
    .collect();
  let new: Vec<_> = (3..9)
    .map(|i| lint_issue("L", &format!("t{}", i), "example.com/dep@v1.1.0/f.go", i, 1, &[]))
    .collect();

  let parts = diff(&old, &new, |a, b| issues_equal(DEP, a, b, false));
  assert_eq!(parts.removed.len() + parts.stale.len(), old.len());
  assert_eq!(parts.added.len() + parts.stale.len(), new.len());
  assert_eq!(parts.stale.len(), 3);
}
