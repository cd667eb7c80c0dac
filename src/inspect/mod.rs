//! Orchestration of version inspections and comparisons
//!
//! The [`Inspector`] owns the full pipeline for one consuming module:
//! pin a dependency version inside a manifest transaction, resolve the
//! package scope, fan out to the capability and lint analyzers in
//! parallel, and diff the normalized findings between versions. The live
//! module files are restored on every path out of here.

pub mod changes;

use crate::analyzers::capslock::{self, CapModule, Capability};
use crate::analyzers::lint::{self, LintIssue};
use crate::core::error::{InspectError, InspectResult};
use crate::diff::diff;
use crate::gocmd::{CancelToken, GoTool};
use crate::manifest::{ManifestSnapshot, ModTransaction};
use crate::resolve::{self, ScopeMode};
use crate::totals::{FindingTotals, calculate_totals, combined_totals};
use changes::{ChangedDependency, changed_dependencies};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Caller-facing knobs for an inspection run
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectorOptions {
  /// Analyze every package of the dependency instead of only the ones the
  /// consumer reaches
  pub all_packages: bool,
  /// Require matching column positions when diffing lint findings
  /// (stricter than the default, which absorbs within-line drift)
  pub match_columns: bool,
}

/// Findings of one (dependency, version) inspection
#[derive(Debug, Clone)]
pub struct VersionFindings {
  pub dep: String,
  pub version: String,
  /// Sorted capability findings
  pub capabilities: Vec<Capability>,
  /// Modules the capability analysis resolved, with versions
  pub capability_modules: Vec<CapModule>,
  /// Sorted lint findings
  pub issues: Vec<LintIssue>,
  pub totals: FindingTotals,
}

/// Outcome of comparing two versions of one dependency
#[derive(Debug, Clone)]
pub struct ComparisonResult {
  pub dep: String,
  pub old_version: String,
  pub new_version: String,

  pub removed_caps: Vec<Capability>,
  pub stale_caps: Vec<Capability>,
  pub added_caps: Vec<Capability>,

  pub fixed_issues: Vec<LintIssue>,
  pub stale_issues: Vec<LintIssue>,
  pub new_issues: Vec<LintIssue>,

  pub old_totals: FindingTotals,
  pub same_totals: FindingTotals,
  pub new_totals: FindingTotals,
  /// Combined current counts and per-category deltas
  pub totals: FindingTotals,
}

/// Per-dependency outcome inside a recursive comparison
#[derive(Debug, Clone)]
pub enum DependencyReport {
  /// The dependency changed version and was compared
  Compared(ComparisonResult),
  /// The dependency is newly introduced; only its new version exists
  Introduced(VersionFindings),
}

/// Result of recursively comparing a dependency upgrade
#[derive(Debug, Clone)]
pub struct RecursiveComparison {
  /// Comparison of the requested dependency itself
  pub target: ComparisonResult,
  /// Reports for every transitively changed dependency
  pub dependencies: Vec<DependencyReport>,
}

/// `dep@version`, the form the Go toolchain and reports use
pub fn version_str(dep: &str, version: &str) -> String {
  format!("{}@{}", dep, version)
}

/// Validate a `vX.Y.Z[-pre]` module version string
pub fn validate_version(version: &str) -> InspectResult<()> {
  let numeric = version
    .strip_prefix('v')
    .ok_or_else(|| InspectError::message(format!("version {} must start with 'v'", version)))?;
  semver::Version::parse(numeric)?;
  Ok(())
}

/// The resolved version in `snapshot` must equal the requested one;
/// otherwise a comparison would silently target the wrong artifact.
/// A dependency the consumer does not import is dropped by tidy and has
/// no require entry to check against.
pub fn verify_resolved(snapshot: &ManifestSnapshot, dep: &str, requested: &str) -> InspectResult<()> {
  match snapshot.resolved_version(dep) {
    Some(resolved) if resolved == requested => Ok(()),
    Some(resolved) => Err(InspectError::VersionMismatch {
      dep: dep.to_string(),
      requested: requested.to_string(),
      resolved,
    }),
    None => Ok(()),
  }
}

/// Barrier fan-in for the two analyzer tasks: both results are awaited
/// by the caller, both failures are preserved in order, and no partial
/// results escape
fn join_analyzers<A, B>(caps: InspectResult<A>, lints: InspectResult<B>) -> InspectResult<(A, B)> {
  match (caps, lints) {
    (Ok(caps), Ok(lints)) => Ok((caps, lints)),
    (caps, lints) => {
      let mut errors = Vec::new();
      if let Err(err) = caps {
        errors.push(err);
      }
      if let Err(err) = lints {
        errors.push(err);
      }
      Err(InspectError::join(errors))
    }
  }
}

/// Drives inspections of one consuming module
pub struct Inspector {
  go: GoTool,
  mod_cache: PathBuf,
  options: InspectorOptions,
}

impl Inspector {
  /// Create an inspector rooted at `module_root`
  pub fn new(module_root: &Path, options: InspectorOptions, cancel: CancelToken) -> InspectResult<Self> {
    let go = GoTool::new(module_root, cancel);
    let mod_cache = go.mod_cache()?;
    Ok(Self { go, mod_cache, options })
  }

  /// Inspect a single version of `dep`, restoring the module files before
  /// returning
  pub fn inspect_version(&self, dep: &str, version: &str) -> InspectResult<VersionFindings> {
    self.with_transaction(|txn| txn.mutate(|| self.pin_and_analyze(dep, version)))
  }

  /// Compare two versions of `dep`, restoring the module files before
  /// returning.
  ///
  /// The two inspections share one transaction over the live files, so
  /// they run sequentially; pinning the old and the new version are
  /// mutually exclusive mutations.
  pub fn compare_versions(&self, dep: &str, old_version: &str, new_version: &str) -> InspectResult<ComparisonResult> {
    self.with_transaction(|txn| self.compare_in_txn(txn, dep, old_version, new_version))
  }

  /// Compare two versions of `dep` and every dependency that changed
  /// version between the two states.
  ///
  /// A failure to analyze one transitive dependency is logged and skipped
  /// so the remaining dependencies still get analyzed; only failures on
  /// the target dependency itself (or cancellation) abort the run.
  pub fn compare_recursively(
    &self,
    dep: &str,
    old_version: &str,
    new_version: &str,
  ) -> InspectResult<RecursiveComparison> {
    self.with_transaction(|txn| {
      let old_findings = txn.mutate(|| self.pin_and_analyze(dep, old_version))?;
      let old_snapshot = ManifestSnapshot::read(self.go.module_root())?;
      let new_findings = txn.mutate(|| self.pin_and_analyze(dep, new_version))?;
      let new_snapshot = ManifestSnapshot::read(self.go.module_root())?;

      let target = self.diff_findings(dep, old_version, new_version, &old_findings, &new_findings);

      let changed: Vec<ChangedDependency> = changed_dependencies(&old_snapshot, &new_snapshot)
        .into_iter()
        .filter(|ch| ch.path != dep)
        .collect();
      info!("{} transitive dependencies changed", changed.len());

      let mut dependencies = Vec::with_capacity(changed.len());
      for ch in changed {
        self.go.cancel_token().check()?;
        let report = match &ch.old_version {
          None => txn
            .mutate(|| self.pin_and_analyze(&ch.path, &ch.new_version))
            .map(DependencyReport::Introduced),
          Some(old) => self
            .compare_in_txn(txn, &ch.path, old, &ch.new_version)
            .map(DependencyReport::Compared),
        };
        match report {
          Ok(report) => dependencies.push(report),
          Err(InspectError::Cancelled) => return Err(InspectError::Cancelled),
          Err(err) => warn!("skipping changed dependency {}: {}", ch.path, err),
        }
      }

      Ok(RecursiveComparison { target, dependencies })
    })
  }

  /// Run `op` inside a manifest transaction, restoring the live files on
  /// every path and joining a restore failure with the original error
  fn with_transaction<T>(&self, op: impl FnOnce(&ModTransaction) -> InspectResult<T>) -> InspectResult<T> {
    let txn = ModTransaction::begin(self.go.module_root())?;
    let result = op(&txn);
    match (result, txn.restore()) {
      (Ok(value), Ok(())) => Ok(value),
      (Ok(_), Err(restore_err)) => Err(restore_err),
      (Err(err), Ok(())) => Err(err),
      (Err(err), Err(restore_err)) => Err(InspectError::join(vec![err, restore_err])),
    }
  }

  fn compare_in_txn(
    &self,
    txn: &ModTransaction,
    dep: &str,
    old_version: &str,
    new_version: &str,
  ) -> InspectResult<ComparisonResult> {
    let old_findings = txn.mutate(|| self.pin_and_analyze(dep, old_version))?;
    let new_findings = txn.mutate(|| self.pin_and_analyze(dep, new_version))?;
    Ok(self.diff_findings(dep, old_version, new_version, &old_findings, &new_findings))
  }

  /// Pin `dep` to `version` in the live files, verify the resolution took,
  /// and run both analyzers over the resulting package set
  fn pin_and_analyze(&self, dep: &str, version: &str) -> InspectResult<VersionFindings> {
    let ver_str = version_str(dep, version);

    self.pin(&ver_str)?;
    self.verify_pinned(dep, version)?;

    let pkgs = resolve::list_packages(&self.go, &[])?;
    let used = !resolve::dependency_packages(dep, &pkgs).is_empty();
    if !used {
      info!("{} is not imported by the consuming module, analyzing all of its packages", dep);
    }
    let mode = if self.options.all_packages || !used {
      ScopeMode::AllPackages
    } else {
      ScopeMode::UsedOnly
    };
    let scope = resolve::dependency_scope(dep, &pkgs, mode)?;

    self.go.cancel_token().check()?;

    // Both analyzers are independent read-only passes; run them in
    // parallel and wait for both, collecting both failures
    let (cap_result, lint_result) = rayon::join(
      || {
        capslock::find_capabilities(&self.go, &self.mod_cache, &ver_str, &scope).map_err(|err| {
          InspectError::Analyzer {
            analyzer: "capslock".to_string(),
            source: Box::new(err),
          }
        })
      },
      || {
        lint::lint_dependency(&self.go, &self.mod_cache, &ver_str, dep, &pkgs, &scope).map_err(|err| {
          InspectError::Analyzer {
            analyzer: "linters".to_string(),
            source: Box::new(err),
          }
        })
      },
    );

    let (report, issues) = join_analyzers(cap_result, lint_result)?;

    let totals = calculate_totals(&report.capability_info, &issues);
    Ok(VersionFindings {
      dep: dep.to_string(),
      version: version.to_string(),
      capabilities: report.capability_info,
      capability_modules: report.module_info,
      issues,
      totals,
    })
  }

  fn pin(&self, ver_str: &str) -> InspectResult<()> {
    info!("pinning {}", ver_str);
    self
      .go
      .run_go(&["go", "get", ver_str])
      .map_err(|err| err.context(format!("downloading {}", ver_str)))?;
    self
      .go
      .run_go(&["go", "mod", "tidy"])
      .map_err(|err| err.context("tidying modules"))
  }

  fn verify_pinned(&self, dep: &str, version: &str) -> InspectResult<()> {
    let snapshot = ManifestSnapshot::read(self.go.module_root())?;
    verify_resolved(&snapshot, dep, version)
  }

  /// Diff two versions' findings and aggregate the partition totals
  fn diff_findings(
    &self,
    dep: &str,
    old_version: &str,
    new_version: &str,
    old: &VersionFindings,
    new: &VersionFindings,
  ) -> ComparisonResult {
    let caps = diff(&old.capabilities, &new.capabilities, |a, b| capslock::caps_equal(a, b));
    let issues = diff(&old.issues, &new.issues, |a, b| {
      lint::issues_equal(dep, a, b, self.options.match_columns)
    });

    let old_totals = calculate_totals(&caps.removed, &issues.removed);
    let same_totals = calculate_totals(&caps.stale, &issues.stale);
    let new_totals = calculate_totals(&caps.added, &issues.added);
    let totals = combined_totals(&old_totals, &same_totals, &new_totals);

    ComparisonResult {
      dep: dep.to_string(),
      old_version: old_version.to_string(),
      new_version: new_version.to_string(),
      removed_caps: caps.removed,
      stale_caps: caps.stale,
      added_caps: caps.added,
      fixed_issues: issues.removed,
      stale_issues: issues.stale,
      new_issues: issues.added,
      old_totals,
      same_totals,
      new_totals,
      totals,
    }
  }
}
