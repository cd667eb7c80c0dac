//! Integration tests for the manifest transaction discipline

use crate::helpers::TestModule;
use anyhow::Result;
use dep_inspector::core::error::{InspectError, SetupError};
use dep_inspector::manifest::{ManifestSnapshot, ModTransaction};

const GO_MOD: &[u8] = b"module example.com/consumer\n\ngo 1.21\n\nrequire example.com/dep v1.2.3\n";
const GO_SUM: &[u8] = b"example.com/dep v1.2.3 h1:abcdef=\nexample.com/dep v1.2.3/go.mod h1:ghijkl=\n";

#[test]
fn restore_returns_files_to_pre_transaction_bytes() -> Result<()> {
  let module = TestModule::new(GO_MOD, GO_SUM)?;
  let txn = ModTransaction::begin(&module.path)?;

  module.write_go_mod(b"module example.com/consumer\n\nrequire example.com/dep v9.9.9\n")?;
  module.write_go_sum(b"totally different\n")?;

  txn.restore()?;
  assert_eq!(module.read_go_mod()?, GO_MOD);
  assert_eq!(module.read_go_sum()?, GO_SUM);
  Ok(())
}

#[test]
fn restore_is_idempotent() -> Result<()> {
  let module = TestModule::new(GO_MOD, GO_SUM)?;
  let txn = ModTransaction::begin(&module.path)?;

  module.write_go_mod(b"mutated\n")?;
  txn.restore()?;
  txn.restore()?;
  txn.restore()?;

  assert_eq!(module.read_go_mod()?, GO_MOD);
  assert_eq!(module.read_go_sum()?, GO_SUM);
  Ok(())
}

#[test]
fn failed_mutation_restores_and_keeps_the_original_error() -> Result<()> {
  let module = TestModule::new(GO_MOD, GO_SUM)?;
  let txn = ModTransaction::begin(&module.path)?;

  let err = txn
    .mutate(|| -> Result<(), InspectError> {
      // a partial write happened before the mutation failed
      std::fs::write(module.path.join("go.mod"), b"half-written")?;
      Err(InspectError::message("tidy blew up"))
    })
    .unwrap_err();

  assert!(err.to_string().contains("tidy blew up"));
  assert_eq!(module.read_go_mod()?, GO_MOD);
  assert_eq!(module.read_go_sum()?, GO_SUM);
  Ok(())
}

#[test]
fn successful_mutation_leaves_live_files_until_restore() -> Result<()> {
  let module = TestModule::new(GO_MOD, GO_SUM)?;
  let txn = ModTransaction::begin(&module.path)?;

  txn.mutate(|| {
    module.write_go_mod(b"pinned state\n").unwrap();
    Ok::<(), InspectError>(())
  })?;
  assert_eq!(module.read_go_mod()?, b"pinned state\n");

  txn.restore()?;
  assert_eq!(module.read_go_mod()?, GO_MOD);
  Ok(())
}

#[test]
fn missing_lock_file_aborts_at_begin() -> Result<()> {
  let module = TestModule::new(GO_MOD, GO_SUM)?;
  std::fs::remove_file(module.path.join("go.sum"))?;

  let err = ModTransaction::begin(&module.path).unwrap_err();
  assert!(matches!(
    err,
    InspectError::Setup(SetupError::ManifestNotFound { .. })
  ));
  Ok(())
}

#[test]
fn snapshot_reports_resolved_versions() -> Result<()> {
  let module = TestModule::new(GO_MOD, GO_SUM)?;
  let snapshot = ManifestSnapshot::read(&module.path)?;
  assert_eq!(snapshot.resolved_version("example.com/dep").as_deref(), Some("v1.2.3"));
  assert_eq!(snapshot.resolved_version("example.com/other"), None);
  Ok(())
}
