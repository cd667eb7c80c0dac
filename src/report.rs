//! Plain-text rendering of inspection and comparison results
//!
//! The core hands over pre-sorted, immutable finding lists; this module
//! only walks and prints them.

use crate::analyzers::capslock::Capability;
use crate::analyzers::lint::LintIssue;
use crate::inspect::{ComparisonResult, DependencyReport, RecursiveComparison, VersionFindings, version_str};
use crate::totals::FindingTotals;

/// Print the findings of a single-version inspection
pub fn print_inspection(findings: &VersionFindings) {
  println!("findings for {}:", version_str(&findings.dep, &findings.version));

  if !findings.capabilities.is_empty() {
    println!("capabilities:");
    print_caps(&findings.capabilities);
  }
  if !findings.issues.is_empty() {
    println!("issues:");
    print_issues(&findings.issues);
  }
  print_totals(&findings.totals);
}

/// Print a two-version comparison
pub fn print_comparison(result: &ComparisonResult) {
  println!(
    "comparing {} to {}:",
    version_str(&result.dep, &result.old_version),
    version_str(&result.dep, &result.new_version)
  );

  if !result.removed_caps.is_empty() {
    println!("removed capabilities:");
    print_caps(&result.removed_caps);
  }
  if !result.stale_caps.is_empty() {
    println!("stale capabilities:");
    print_caps(&result.stale_caps);
  }
  if !result.added_caps.is_empty() {
    println!("added capabilities:");
    print_caps(&result.added_caps);
  }
  println!(
    "total:\nremoved capabilities: {}\nstale capabilities:   {}\nadded capabilities:   {}",
    result.removed_caps.len(),
    result.stale_caps.len(),
    result.added_caps.len(),
  );

  if !result.fixed_issues.is_empty() {
    println!("fixed issues:");
    print_issues(&result.fixed_issues);
  }
  if !result.stale_issues.is_empty() {
    println!("stale issues:");
    print_issues(&result.stale_issues);
  }
  if !result.new_issues.is_empty() {
    println!("new issues:");
    print_issues(&result.new_issues);
  }
  println!(
    "total:\nfixed issues: {}\nstale issues: {}\nnew issues:   {}\n",
    result.fixed_issues.len(),
    result.stale_issues.len(),
    result.new_issues.len(),
  );

  print_deltas(&result.totals);
}

/// Print a recursive comparison: the target first, then every changed
/// dependency's report
pub fn print_recursive(result: &RecursiveComparison) {
  print_comparison(&result.target);

  for report in &result.dependencies {
    match report {
      DependencyReport::Compared(comparison) => print_comparison(comparison),
      DependencyReport::Introduced(findings) => {
        println!("newly introduced dependency:");
        print_inspection(findings);
      }
    }
  }
}

fn print_caps(caps: &[Capability]) {
  for cap in caps {
    println!("{}: {}", cap.capability, cap.capability_type);
    for (i, call) in cap.path.iter().enumerate() {
      if i == 0 {
        println!("{}", call.name);
        continue;
      }
      if !call.site.filename.is_empty() {
        println!(
          "  {} {}:{}:{}",
          call.name, call.site.filename, call.site.line, call.site.column
        );
        continue;
      }
      println!("  {}", call.name);
    }
    println!("\n");
  }
}

fn print_issues(issues: &[LintIssue]) {
  for issue in issues {
    let src_lines = issue.source_lines.join("\n");
    println!(
      "({}) {}: {}:{}:{}:\n{}\n",
      issue.from_linter, issue.text, issue.pos.filename, issue.pos.line, issue.pos.column, src_lines
    );
  }
}

fn print_totals(totals: &FindingTotals) {
  println!("total capabilities: {}", totals.total_caps);
  for (name, count) in &totals.caps {
    println!("  {}: {}", name, count);
  }
  println!("total issues: {}", totals.total_issues);
  for (name, count) in &totals.issues {
    println!("  {}: {}", name, count);
  }
}

fn print_deltas(totals: &FindingTotals) {
  println!("current capabilities: {}", totals.total_caps);
  for (name, count) in &totals.caps {
    println!("  {}: {} ({:+})", name, count, totals.cap_deltas.get(name).copied().unwrap_or(0));
  }
  println!("current issues: {}", totals.total_issues);
  for (name, count) in &totals.issues {
    println!(
      "  {}: {} ({:+})",
      name,
      count,
      totals.issue_deltas.get(name).copied().unwrap_or(0)
    );
  }
}
