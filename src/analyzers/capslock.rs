//! Capability analyzer adapter (capslock)
//!
//! Invokes capslock over an explicit package scope with the embedded
//! capability map, decodes its JSON report into canonical findings, and
//! owns the domain equality and ordering used when diffing capability
//! sets between versions.

use crate::core::error::{InspectError, InspectResult, ResultExt};
use crate::gocmd::GoTool;
use serde::Deserialize;
use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use tracing::info;

/// Capability map handed to capslock, materialized to a temp file per run
const CAPABILITY_MAP: &str = include_str!("../../configs/capability-map.cm");
const CAPABILITY_MAP_NAME: &str = "dep-inspector.cm";

/// Full report decoded from capslock's JSON output
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CapslockReport {
  pub capability_info: Vec<Capability>,
  pub module_info: Vec<CapModule>,
}

/// One capability finding
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Capability {
  /// Name of the package exhibiting the capability
  pub package_name: String,
  /// Capability tag from the closed taxonomy, e.g. `CAPABILITY_FILES`
  pub capability: String,
  /// Ordered call path from an entry point to the capability's call site
  pub path: Vec<FunctionCall>,
  /// Directory of the owning package
  pub package_dir: String,
  /// Direct or transitive, e.g. `CAPABILITY_TYPE_DIRECT`
  pub capability_type: String,
}

/// One hop of a call path
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FunctionCall {
  pub name: String,
  pub site: CallSite,
}

/// Source site of a call; capslock reports line and column as strings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CallSite {
  pub filename: String,
  pub line: String,
  pub column: String,
}

/// A module the analyzed packages resolved to
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CapModule {
  pub path: String,
  pub version: String,
}

/// Run capslock over `scope` and decode the findings.
///
/// Reported call-site paths are rewritten relative to the module cache so
/// findings stay comparable across the per-version cache directories.
/// The report is sorted into the deterministic order used for output.
pub fn find_capabilities(
  go: &GoTool,
  mod_cache: &Path,
  version_str: &str,
  scope: &[String],
) -> InspectResult<CapslockReport> {
  let cfg_dir = tempfile::Builder::new()
    .prefix("dep-inspector")
    .tempdir()
    .context("creating temporary directory")?;
  let map_path = cfg_dir.path().join(CAPABILITY_MAP_NAME);
  fs::write(&map_path, CAPABILITY_MAP).context("writing capability map file")?;

  info!("finding capabilities of {} with capslock", version_str);
  let packages = scope.join(",");
  let map_arg = map_path.to_string_lossy().into_owned();
  let args = [
    "capslock",
    "-packages",
    packages.as_str(),
    "-capability_map",
    map_arg.as_str(),
    "-output=json",
  ];
  let out = go.run(&args)?;
  if !out.exited_with(0) {
    return Err(InspectError::Command {
      command: args.join(" "),
      stderr: out.stderr,
      code: out.code,
    });
  }

  let mut report = decode_report(&out.stdout)?;
  normalize_report(&mut report, mod_cache);
  Ok(report)
}

/// Decode capslock's JSON document
pub fn decode_report(raw: &[u8]) -> InspectResult<CapslockReport> {
  serde_json::from_slice(raw).context("decoding results from capslock")
}

/// Rewrite call-site paths relative to the module cache and sort findings
pub fn normalize_report(report: &mut CapslockReport, mod_cache: &Path) {
  for cap in &mut report.capability_info {
    for call in &mut cap.path {
      call.site.filename = super::cache_relative(mod_cache, &call.site.filename);
    }
  }
  report.capability_info.sort_by(compare_caps);
}

/// Deterministic total order for capability findings: ascending call-path
/// length, then capability, package dir, capability type, then every hop's
/// name, file, line, and column.
pub fn compare_caps(a: &Capability, b: &Capability) -> Ordering {
  a.path
    .len()
    .cmp(&b.path.len())
    .then_with(|| a.capability.cmp(&b.capability))
    .then_with(|| a.package_dir.cmp(&b.package_dir))
    .then_with(|| a.capability_type.cmp(&b.capability_type))
    .then_with(|| {
      for (ca, cb) in a.path.iter().zip(&b.path) {
        let ord = ca
          .name
          .cmp(&cb.name)
          .then_with(|| ca.site.filename.cmp(&cb.site.filename))
          .then_with(|| ca.site.line.cmp(&cb.site.line))
          .then_with(|| ca.site.column.cmp(&cb.site.column));
        if ord != Ordering::Equal {
          return ord;
        }
      }
      Ordering::Equal
    })
}

/// Domain equality for capability findings.
///
/// Equal iff owning package dir, package name, capability, direct or
/// transitive flag, and the entire call path (every hop's name and exact
/// source site) match. Paths of differing length are never equal.
pub fn caps_equal(a: &Capability, b: &Capability) -> bool {
  if a.package_dir != b.package_dir
    || a.package_name != b.package_name
    || a.capability != b.capability
    || a.capability_type != b.capability_type
    || a.path.len() != b.path.len()
  {
    return false;
  }

  a.path.iter().zip(&b.path).all(|(ca, cb)| {
    ca.name == cb.name
      && ca.site.filename == cb.site.filename
      && ca.site.line == cb.site.line
      && ca.site.column == cb.site.column
  })
}
