//! Lint analyzer adapter (golangci-lint and staticcheck)
//!
//! Both linters run against the dependency's package directories and
//! their findings are merged into one canonical issue list. Each linter
//! uses exit code 1 to mean "issues were reported", which is benign;
//! any other non-zero code is a real failure. staticcheck does not
//! report source lines itself, so the adapter reads them from disk.

use crate::core::error::{InspectError, InspectResult, ResultExt};
use crate::gocmd::GoTool;
use crate::resolve::{PackagesInfo, dependency_packages};
use serde::Deserialize;
use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// golangci-lint configuration shipped with the binary, materialized to a
/// temp file per run
const GOLANGCI_CONFIG: &str = include_str!("../../configs/golangci-deps.yml");
const GOLANGCI_CONFIG_NAME: &str = ".golangci-deps.yml";

/// staticcheck check classes to run; correctness (SA) checks only
const STATICCHECK_CHECKS: &str = "-checks=SA1*,SA2*,SA4*,SA5*,SA9*";

/// Exit code the linters use for "issues found", distinct from failure
const ISSUES_FOUND_EXIT_CODE: i32 = 1;

/// One canonical lint finding
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LintIssue {
  /// Identifier of the originating linter
  pub from_linter: String,
  /// Human-readable message
  pub text: String,
  /// Literal source line(s) spanning the reported range
  pub source_lines: Vec<String>,
  /// Source position of the finding
  pub pos: LintPosition,
}

/// Source position of a lint finding
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LintPosition {
  pub filename: String,
  pub offset: i64,
  pub line: i64,
  pub column: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct GolangciResult {
  // golangci-lint emits an explicit null when no linter reported anything
  issues: Option<Vec<LintIssue>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct StaticcheckIssue {
  code: String,
  location: StaticcheckPosition,
  end: StaticcheckPosition,
  message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct StaticcheckPosition {
  file: String,
  line: i64,
  column: i64,
}

/// Lint one pinned version of `dep` with both linters.
///
/// Findings are merged, sorted deterministically, and normalized: source
/// lines get uniform leading whitespace and filenames are rewritten
/// relative to the module cache.
pub fn lint_dependency(
  go: &GoTool,
  mod_cache: &Path,
  version_str: &str,
  dep: &str,
  pkgs: &PackagesInfo,
  scope: &[String],
) -> InspectResult<Vec<LintIssue>> {
  let targets = lint_targets(dep, pkgs, scope);

  info!("linting {} with golangci-lint", version_str);
  let mut issues = golangci_lint(go, &targets)
    .with_context(|| format!("linting {} with golangci-lint", version_str))?;

  info!("linting {} with staticcheck", version_str);
  let staticcheck_issues =
    staticcheck_lint(go, &targets).with_context(|| format!("linting {} with staticcheck", version_str))?;
  issues.extend(staticcheck_issues);

  normalize_issues(&mut issues, mod_cache);
  issues.sort_by(compare_issues);
  Ok(issues)
}

/// The dependency's package dirs, or the caller's scope patterns when the
/// resolved graph has none (unused dependency). Running the linters with
/// no targets would lint the consuming module itself.
fn lint_targets(dep: &str, pkgs: &PackagesInfo, scope: &[String]) -> Vec<String> {
  let dirs: Vec<String> = dependency_packages(dep, pkgs)
    .iter()
    .map(|pkg| pkg.dir.clone())
    .collect();
  if dirs.is_empty() { scope.to_vec() } else { dirs }
}

fn golangci_lint(go: &GoTool, dirs: &[String]) -> InspectResult<Vec<LintIssue>> {
  let cfg_dir = tempfile::Builder::new()
    .prefix("dep-inspector")
    .tempdir()
    .context("creating temporary directory")?;
  let cfg_path = cfg_dir.path().join(GOLANGCI_CONFIG_NAME);
  fs::write(&cfg_path, GOLANGCI_CONFIG).context("writing golangci-lint config file")?;

  let cfg_arg = cfg_path.to_string_lossy().into_owned();
  let mut args = vec!["golangci-lint", "run", "-c", cfg_arg.as_str(), "--out-format=json"];
  args.extend(dirs.iter().map(String::as_str));

  let out = go.run(&args)?;
  if !out.exited_with(0) && !out.exited_with(ISSUES_FOUND_EXIT_CODE) {
    return Err(InspectError::Command {
      command: args.join(" "),
      stderr: out.stderr,
      code: out.code,
    });
  }

  decode_golangci(&out.stdout)
}

/// Decode golangci-lint's JSON document into canonical issues
pub fn decode_golangci(raw: &[u8]) -> InspectResult<Vec<LintIssue>> {
  let result: GolangciResult = serde_json::from_slice(raw).context("decoding results from golangci-lint")?;
  Ok(result.issues.unwrap_or_default())
}

fn staticcheck_lint(go: &GoTool, dirs: &[String]) -> InspectResult<Vec<LintIssue>> {
  let mut args = vec!["staticcheck", STATICCHECK_CHECKS, "-f=json", "-tests=false"];
  args.extend(dirs.iter().map(String::as_str));

  let out = go.run(&args)?;
  if !out.exited_with(0) && !out.exited_with(ISSUES_FOUND_EXIT_CODE) {
    return Err(InspectError::Command {
      command: args.join(" "),
      stderr: out.stderr,
      code: out.code,
    });
  }

  let raw_issues = decode_staticcheck(&out.stdout)?;
  raw_issues
    .into_iter()
    .map(|issue| {
      let source_lines = read_issue_source(&issue)?;
      Ok(canonical_staticcheck_issue(issue, source_lines))
    })
    .collect()
}

/// Decode staticcheck's newline-delimited JSON records
fn decode_staticcheck(raw: &[u8]) -> InspectResult<Vec<StaticcheckIssue>> {
  serde_json::Deserializer::from_slice(raw)
    .into_iter::<StaticcheckIssue>()
    .map(|issue| issue.context("decoding results from staticcheck"))
    .collect()
}

/// Convert one staticcheck record into the canonical shape
fn canonical_staticcheck_issue(issue: StaticcheckIssue, source_lines: Vec<String>) -> LintIssue {
  LintIssue {
    from_linter: format!("staticcheck {}", issue.code),
    text: trim_linter_msg(&issue.message),
    source_lines,
    pos: LintPosition {
      filename: issue.location.file,
      offset: issue.end.column,
      line: issue.location.line,
      column: issue.location.column,
    },
  }
}

fn read_issue_source(issue: &StaticcheckIssue) -> InspectResult<Vec<String>> {
  let file = File::open(&issue.location.file)
    .with_context(|| format!("opening source file {}", issue.location.file))?;
  let mut reader = LineReader::new(BufReader::new(file));
  let end = if issue.end.line > 0 { issue.end.line } else { issue.location.line };
  read_src_lines(&mut reader, issue.location.line, end)
    .with_context(|| format!("reading source file {}", issue.location.file))
}

/// staticcheck messages end with a period; strip it so the text matches
/// the style of the other linters
fn trim_linter_msg(msg: &str) -> String {
  let msg = msg.trim();
  msg.strip_suffix('.').unwrap_or(msg).to_string()
}

/// Buffered line-oriented reader that tracks the current line number
pub struct LineReader<R: BufRead> {
  reader: R,
  line: i64,
  text: String,
}

impl<R: BufRead> LineReader<R> {
  pub fn new(reader: R) -> Self {
    Self {
      reader,
      line: 0,
      text: String::new(),
    }
  }

  /// Advance to the next line; false at end of input
  pub fn scan(&mut self) -> io::Result<bool> {
    self.text.clear();
    let read = self.reader.read_line(&mut self.text)?;
    if read == 0 {
      return Ok(false);
    }
    while self.text.ends_with('\n') || self.text.ends_with('\r') {
      self.text.pop();
    }
    self.line += 1;
    Ok(true)
  }

  /// Current line number, 0 before the first scan
  pub fn line(&self) -> i64 {
    self.line
  }

  /// Text of the current line
  pub fn text(&self) -> &str {
    &self.text
  }
}

/// Collect the lines spanning `start..=end` from the reader.
///
/// The buffered line is consulted first so sequential extractions from
/// one file can share a single reader.
pub fn read_src_lines<R: BufRead>(l: &mut LineReader<R>, start: i64, end: i64) -> io::Result<Vec<String>> {
  let mut src_lines = Vec::with_capacity(1);

  if l.line() > 0 && !collect_line(l, start, end, &mut src_lines) {
    return Ok(src_lines);
  }
  while l.scan()? {
    if !collect_line(l, start, end, &mut src_lines) {
      return Ok(src_lines);
    }
  }

  Ok(src_lines)
}

fn collect_line<R: BufRead>(l: &LineReader<R>, start: i64, end: i64, src_lines: &mut Vec<String>) -> bool {
  let line = l.line();
  if line == start {
    src_lines.push(l.text().to_string());
  }
  if line == end {
    if start != end {
      src_lines.push(l.text().to_string());
    }
    return false;
  }
  if line > start && line < end {
    src_lines.push(l.text().to_string());
  }
  true
}

/// Make source line whitespace uniform and anchor filenames to the cache
fn normalize_issues(issues: &mut [LintIssue], mod_cache: &Path) {
  for issue in issues.iter_mut() {
    for line in &mut issue.source_lines {
      *line = format!("\t{}", line.trim());
    }
    issue.pos.filename = super::cache_relative(mod_cache, &issue.pos.filename);
  }
}

/// Deterministic total order for lint issues: linter, file, line, column
pub fn compare_issues(a: &LintIssue, b: &LintIssue) -> Ordering {
  a.from_linter
    .cmp(&b.from_linter)
    .then_with(|| a.pos.filename.cmp(&b.pos.filename))
    .then_with(|| a.pos.line.cmp(&b.pos.line))
    .then_with(|| a.pos.column.cmp(&b.pos.column))
}

/// Domain equality for lint issues.
///
/// Filenames are compared only on the portion after the dependency's own
/// root, so per-version cache directories do not break matches, and
/// source lines are compared with surrounding whitespace discarded, so a
/// purely cosmetic reformat still matches. Column position is excluded
/// unless `match_columns` is set; the loose default absorbs within-line
/// drift between versions.
pub fn issues_equal(dep: &str, a: &LintIssue, b: &LintIssue, match_columns: bool) -> bool {
  if a.from_linter != b.from_linter || a.text != b.text {
    return false;
  }
  if a.pos.line != b.pos.line {
    return false;
  }
  if match_columns && a.pos.column != b.pos.column {
    return false;
  }
  if a.source_lines.len() != b.source_lines.len() {
    return false;
  }

  if dep_rel_path(dep, &a.pos.filename) != dep_rel_path(dep, &b.pos.filename) {
    return false;
  }

  a.source_lines
    .iter()
    .zip(&b.source_lines)
    .all(|(la, lb)| la.trim() == lb.trim())
}

/// The part of `path` after the dependency root's version segment.
///
/// `example.com/dep@v1.2.3/sub/file.go` becomes `/sub/file.go` for any
/// version of `example.com/dep`.
pub fn dep_rel_path(dep: &str, path: &str) -> String {
  let Some(dep_idx) = path.find(dep) else {
    warn!("could not find {} in path {}", dep, path);
    return path.to_string();
  };
  let after_dep = &path[dep_idx + dep.len()..];
  let Some(slash_idx) = after_dep.find('/') else {
    warn!("could not find slash in path {}", after_dep);
    return path.to_string();
  };
  after_dep[slash_idx..].to_string()
}
