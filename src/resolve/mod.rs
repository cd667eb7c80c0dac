//! Package graph resolution via `go list -deps -json`
//!
//! The resolver walks the consuming module's full package graph once per
//! inspection and computes the minimal scope the analyzers should be
//! pointed at for a given dependency.

use crate::core::error::{InspectError, InspectResult, ResolutionError};
use crate::gocmd::GoTool;
use serde::Deserialize;
use std::collections::BTreeMap;

/// One package as reported by `go list -deps -json`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListedPackage {
  /// Directory containing the package's sources
  pub dir: String,
  /// Canonical import path
  pub import_path: String,
  /// Package name
  pub name: String,
  /// Owning module
  pub module: ListedModule,
  /// Whether the package is part of the standard library
  pub standard: bool,
  /// Direct imports
  pub imports: Vec<String>,
  /// Transitive dependency import paths
  pub deps: Vec<String>,
  /// Whether loading the package reported errors
  pub incomplete: bool,
}

/// Module metadata attached to a listed package
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListedModule {
  pub path: String,
  pub version: String,
}

/// Resolved packages keyed by import path
pub type PackagesInfo = BTreeMap<String, ListedPackage>;

/// How much of a dependency the analyzers should see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMode {
  /// Analyze every package of the dependency (`dep/...`)
  AllPackages,
  /// Analyze only packages the consumer actually reaches
  UsedOnly,
}

/// List the consuming module's transitive package graph.
///
/// With no patterns this covers the module's own packages and everything
/// they depend on.
pub fn list_packages(go: &GoTool, patterns: &[String]) -> InspectResult<PackagesInfo> {
  let mut args = vec!["go", "list", "-deps", "-json"];
  args.extend(patterns.iter().map(String::as_str));

  let out = go.run(&args)?;
  if !out.exited_with(0) {
    return Err(InspectError::Command {
      command: args.join(" "),
      stderr: out.stderr,
      code: out.code,
    });
  }

  decode_packages(&out.stdout)
}

/// Decode the concatenated JSON objects `go list` emits
pub fn decode_packages(raw: &[u8]) -> InspectResult<PackagesInfo> {
  let mut packages = PackagesInfo::new();
  for pkg in serde_json::Deserializer::from_slice(raw).into_iter::<ListedPackage>() {
    let pkg = pkg?;
    packages.insert(pkg.import_path.clone(), pkg);
  }
  Ok(packages)
}

/// Import paths of the dependency's packages present in the resolved graph
pub fn dependency_packages<'a>(dep: &str, pkgs: &'a PackagesInfo) -> Vec<&'a ListedPackage> {
  pkgs
    .values()
    .filter(|pkg| !pkg.standard && pkg.module.path == dep)
    .collect()
}

/// Compute the package scope to hand to the capability analyzer.
///
/// In [`ScopeMode::UsedOnly`] the scope is minimized by containment: when
/// package A of the dependency already transitively imports package B of
/// the same dependency, B is dropped, since analyzing A covers B and
/// overlapping scope requests would produce duplicate findings. A
/// dependency package referenced by another's import list but absent from
/// the resolved set indicates the resolver and the consumer's declared
/// dependencies disagree, which is fatal.
pub fn dependency_scope(dep: &str, pkgs: &PackagesInfo, mode: ScopeMode) -> InspectResult<Vec<String>> {
  let dep_pkgs = dependency_packages(dep, pkgs);

  if mode == ScopeMode::AllPackages || dep_pkgs.is_empty() {
    return Ok(vec![format!("{}/...", dep)]);
  }

  for pkg in &dep_pkgs {
    for imported in pkg.imports.iter().filter(|imp| in_module(dep, imp)) {
      if !pkgs.contains_key(imported) {
        return Err(InspectError::Resolution(ResolutionError::PackageNotFound {
          import_path: imported.clone(),
        }));
      }
    }
  }

  let mut scope: Vec<String> = Vec::with_capacity(dep_pkgs.len());
  for pkg in &dep_pkgs {
    let contained = dep_pkgs
      .iter()
      .any(|other| other.import_path != pkg.import_path && other.deps.iter().any(|d| *d == pkg.import_path));
    if !contained {
      scope.push(pkg.import_path.clone());
    }
  }
  scope.sort();

  Ok(scope)
}

fn in_module(dep: &str, import_path: &str) -> bool {
  import_path == dep || import_path.strip_prefix(dep).is_some_and(|rest| rest.starts_with('/'))
}
