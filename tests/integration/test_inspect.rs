//! Version-consistency checks of the inspection pipeline

use crate::helpers::TestModule;
use anyhow::Result;
use dep_inspector::core::error::{ExitCode, InspectError};
use dep_inspector::inspect::verify_resolved;
use dep_inspector::manifest::ManifestSnapshot;

#[test]
fn resolved_version_must_match_the_request() -> Result<()> {
  let module = TestModule::new(
    b"module example.com/consumer\n\ngo 1.21\n\nrequire example.com/dep v1.2.4\n",
    b"",
  )?;
  let snapshot = ManifestSnapshot::read(&module.path)?;

  // resolution silently picked a different version: fatal before any
  // analyzer runs
  let err = verify_resolved(&snapshot, "example.com/dep", "v1.2.3").unwrap_err();
  match &err {
    InspectError::VersionMismatch { dep, requested, resolved } => {
      assert_eq!(dep, "example.com/dep");
      assert_eq!(requested, "v1.2.3");
      assert_eq!(resolved, "v1.2.4");
    }
    other => panic!("expected version mismatch, got {}", other),
  }
  assert_eq!(err.exit_code(), ExitCode::User);

  Ok(())
}

#[test]
fn matching_resolved_version_passes() -> Result<()> {
  let module = TestModule::new(
    b"module example.com/consumer\n\ngo 1.21\n\nrequire example.com/dep v1.2.3\n",
    b"",
  )?;
  let snapshot = ManifestSnapshot::read(&module.path)?;
  verify_resolved(&snapshot, "example.com/dep", "v1.2.3")?;
  Ok(())
}

#[test]
fn dependency_dropped_by_tidy_passes_verification() -> Result<()> {
  let module = TestModule::new(b"module example.com/consumer\n\ngo 1.21\n", b"")?;
  let snapshot = ManifestSnapshot::read(&module.path)?;
  // unused dependency: no require entry to check against
  verify_resolved(&snapshot, "example.com/dep", "v1.2.3")?;
  Ok(())
}
