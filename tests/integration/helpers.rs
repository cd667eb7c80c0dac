//! Test helpers for integration tests

use anyhow::Result;
use dep_inspector::analyzers::capslock::{CallSite, Capability, FunctionCall};
use dep_inspector::analyzers::lint::{LintIssue, LintPosition};
use std::path::PathBuf;
use tempfile::TempDir;

/// A throwaway Go module directory with live go.mod/go.sum files
pub struct TestModule {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestModule {
  /// Create a module directory with the given file contents
  pub fn new(go_mod: &[u8], go_sum: &[u8]) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    std::fs::write(path.join("go.mod"), go_mod)?;
    std::fs::write(path.join("go.sum"), go_sum)?;
    Ok(Self { _root: root, path })
  }

  pub fn read_go_mod(&self) -> Result<Vec<u8>> {
    Ok(std::fs::read(self.path.join("go.mod"))?)
  }

  pub fn read_go_sum(&self) -> Result<Vec<u8>> {
    Ok(std::fs::read(self.path.join("go.sum"))?)
  }

  pub fn write_go_mod(&self, contents: &[u8]) -> Result<()> {
    Ok(std::fs::write(self.path.join("go.mod"), contents)?)
  }

  pub fn write_go_sum(&self, contents: &[u8]) -> Result<()> {
    Ok(std::fs::write(self.path.join("go.sum"), contents)?)
  }
}

/// Build a lint issue with the fields the diff predicates look at
pub fn lint_issue(linter: &str, text: &str, file: &str, line: i64, column: i64, src: &[&str]) -> LintIssue {
  LintIssue {
    from_linter: linter.to_string(),
    text: text.to_string(),
    source_lines: src.iter().map(|s| s.to_string()).collect(),
    pos: LintPosition {
      filename: file.to_string(),
      offset: 0,
      line,
      column,
    },
  }
}

/// Build a capability finding with the given call path hops
pub fn capability(kind: &str, package: &str, hops: &[(&str, &str, &str, &str)]) -> Capability {
  Capability {
    package_name: package.rsplit('/').next().unwrap_or(package).to_string(),
    capability: kind.to_string(),
    path: hops
      .iter()
      .map(|(name, file, line, column)| FunctionCall {
        name: name.to_string(),
        site: CallSite {
          filename: file.to_string(),
          line: line.to_string(),
          column: column.to_string(),
        },
      })
      .collect(),
    package_dir: package.to_string(),
    capability_type: "CAPABILITY_TYPE_DIRECT".to_string(),
  }
}
