//! Summarized finding counts and per-category deltas
//!
//! Totals are computed per inspected version and combined across the
//! partitions of a comparison so a multi-dependency report can present
//! one current count and one signed delta per category.

use crate::analyzers::capslock::Capability;
use crate::analyzers::lint::LintIssue;
use std::collections::BTreeMap;

/// Finding counts by category, with deltas when part of a comparison
#[derive(Debug, Clone, Default)]
pub struct FindingTotals {
  /// Whether the delta maps are meaningful
  pub has_deltas: bool,

  pub total_caps: usize,
  pub caps: BTreeMap<String, usize>,
  pub cap_deltas: BTreeMap<String, i64>,
  pub total_issues: usize,
  pub issues: BTreeMap<String, usize>,
  pub issue_deltas: BTreeMap<String, i64>,
}

/// Count findings by category for one version's result sets
pub fn calculate_totals(caps: &[Capability], issues: &[LintIssue]) -> FindingTotals {
  let mut totals = FindingTotals {
    total_caps: caps.len(),
    total_issues: issues.len(),
    ..FindingTotals::default()
  };

  for cap in caps {
    *totals.caps.entry(capability_label(&cap.capability)).or_insert(0) += 1;
  }
  for issue in issues {
    *totals.issues.entry(linter_label(&issue.from_linter)).or_insert(0) += 1;
  }

  totals
}

/// Human-readable category for a capability tag:
/// `CAPABILITY_ARBITRARY_EXECUTION` becomes "Arbitrary Execution"
fn capability_label(capability: &str) -> String {
  let name = capability.strip_prefix("CAPABILITY_").unwrap_or(capability);
  name
    .split('_')
    .map(|word| {
      let mut chars = word.chars();
      match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

/// Issue category for a linter id; every staticcheck check collapses into
/// one "staticcheck" bucket
fn linter_label(from_linter: &str) -> String {
  if from_linter.starts_with("staticcheck") {
    return "staticcheck".to_string();
  }
  from_linter.to_string()
}

/// Combine the removed/stale/added totals of a comparison into current
/// counts, per-category deltas, and grand totals
pub fn combined_totals(removed: &FindingTotals, same: &FindingTotals, added: &FindingTotals) -> FindingTotals {
  let (total_caps, caps, cap_deltas) = current_totals(&removed.caps, &same.caps, &added.caps);
  let (total_issues, issues, issue_deltas) = current_totals(&removed.issues, &same.issues, &added.issues);
  FindingTotals {
    has_deltas: true,
    total_caps,
    caps,
    cap_deltas,
    total_issues,
    issues,
    issue_deltas,
  }
}

/// For every category name in any input: current = same + added,
/// delta = added - removed, missing entries counting as zero
fn current_totals(
  removed: &BTreeMap<String, usize>,
  same: &BTreeMap<String, usize>,
  added: &BTreeMap<String, usize>,
) -> (usize, BTreeMap<String, usize>, BTreeMap<String, i64>) {
  let mut names: Vec<&String> = removed.keys().chain(same.keys()).chain(added.keys()).collect();
  names.sort();
  names.dedup();

  let mut grand_total = 0;
  let mut current = BTreeMap::new();
  let mut deltas = BTreeMap::new();

  for name in names {
    let same_count = same.get(name).copied().unwrap_or(0);
    let added_count = added.get(name).copied().unwrap_or(0);
    let removed_count = removed.get(name).copied().unwrap_or(0);

    let total = same_count + added_count;
    current.insert(name.clone(), total);
    deltas.insert(name.clone(), added_count as i64 - removed_count as i64);
    grand_total += total;
  }

  (grand_total, current, deltas)
}
