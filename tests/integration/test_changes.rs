//! Transitive change resolution between two manifest states

use crate::helpers::TestModule;
use anyhow::Result;
use dep_inspector::inspect::changes::{ChangedDependency, changed_dependencies};
use dep_inspector::manifest::ManifestSnapshot;

fn snapshot(go_mod: &str) -> Result<ManifestSnapshot> {
  let module = TestModule::new(go_mod.as_bytes(), b"")?;
  Ok(ManifestSnapshot::read(&module.path)?)
}

#[test]
fn detects_bumped_added_and_unchanged_dependencies() -> Result<()> {
  let old = snapshot(
    "module example.com/consumer\n\ngo 1.21\n\nrequire (\n\
     \texample.com/bumped v1.0.0\n\
     \texample.com/stable v2.0.0\n\
     \texample.com/dropped v0.5.0\n)\n",
  )?;
  let new = snapshot(
    "module example.com/consumer\n\ngo 1.21\n\nrequire (\n\
     \texample.com/bumped v1.1.0\n\
     \texample.com/stable v2.0.0\n\
     \texample.com/fresh v0.1.0\n)\n",
  )?;

  let mut changed = changed_dependencies(&old, &new);
  changed.sort_by(|a, b| a.path.cmp(&b.path));

  assert_eq!(
    changed,
    vec![
      ChangedDependency {
        path: "example.com/bumped".to_string(),
        old_version: Some("v1.0.0".to_string()),
        new_version: "v1.1.0".to_string(),
      },
      ChangedDependency {
        path: "example.com/fresh".to_string(),
        old_version: None,
        new_version: "v0.1.0".to_string(),
      },
    ]
  );
  Ok(())
}

#[test]
fn identical_snapshots_produce_no_changes() -> Result<()> {
  let go_mod = "module example.com/consumer\n\ngo 1.21\n\nrequire example.com/dep v1.2.3\n";
  let old = snapshot(go_mod)?;
  let new = snapshot(go_mod)?;
  assert!(changed_dependencies(&old, &new).is_empty());
  Ok(())
}

#[test]
fn indirect_markers_do_not_affect_detection() -> Result<()> {
  let old = snapshot("module m\n\nrequire example.com/sys v0.1.0 // indirect\n")?;
  let new = snapshot("module m\n\nrequire example.com/sys v0.2.0 // indirect\n")?;

  let changed = changed_dependencies(&old, &new);
  assert_eq!(changed.len(), 1);
  assert_eq!(changed[0].old_version.as_deref(), Some("v0.1.0"));
  assert_eq!(changed[0].new_version, "v0.2.0");
  Ok(())
}
