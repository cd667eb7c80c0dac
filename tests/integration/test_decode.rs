//! Decoding of the analyzers' and build tool's wire formats

use anyhow::Result;
use dep_inspector::analyzers::capslock::{compare_caps, decode_report, normalize_report};
use dep_inspector::analyzers::lint::decode_golangci;
use dep_inspector::resolve::decode_packages;
use std::path::Path;

#[test]
fn go_list_stream_decodes_into_package_graph() -> Result<()> {
  let raw = br#"
{"Dir": "/home/u/go/pkg/mod/example.com/dep@v1.2.3", "ImportPath": "example.com/dep",
 "Name": "dep", "Module": {"Path": "example.com/dep", "Version": "v1.2.3"},
 "Imports": ["fmt", "os"], "Deps": ["fmt", "os", "io"]}
{"Dir": "/goroot/src/os", "ImportPath": "os", "Name": "os", "Standard": true,
 "Imports": ["io"], "Deps": ["io"]}
{"Dir": "/work/consumer", "ImportPath": "example.com/consumer", "Name": "main",
 "Module": {"Path": "example.com/consumer"}, "Imports": ["example.com/dep"],
 "Deps": ["example.com/dep", "fmt", "os", "io"]}
"#;
  let pkgs = decode_packages(raw)?;
  assert_eq!(pkgs.len(), 3);
  assert!(pkgs["os"].standard);
  assert!(!pkgs["example.com/dep"].standard);
  assert_eq!(pkgs["example.com/consumer"].deps.len(), 4);
  Ok(())
}

#[test]
fn capslock_report_normalizes_and_sorts() -> Result<()> {
  let raw = br#"{
    "CapabilityInfo": [
      {
        "PackageName": "dep",
        "Capability": "CAPABILITY_NETWORK",
        "Path": [
          {"Name": "example.com/dep.Fetch"},
          {"Name": "net/http.Get",
           "Site": {"Filename": "/cache/example.com/dep@v1.2.3/fetch.go", "Line": "42", "Column": "9"}}
        ],
        "PackageDir": "example.com/dep",
        "CapabilityType": "CAPABILITY_TYPE_DIRECT"
      },
      {
        "PackageName": "dep",
        "Capability": "CAPABILITY_FILES",
        "Path": [{"Name": "example.com/dep.Load"}],
        "PackageDir": "example.com/dep",
        "CapabilityType": "CAPABILITY_TYPE_DIRECT"
      }
    ],
    "ModuleInfo": [{"Path": "example.com/dep", "Version": "v1.2.3"}]
  }"#;

  let mut report = decode_report(raw)?;
  normalize_report(&mut report, Path::new("/cache"));

  // shorter call path sorts first regardless of capability name
  assert_eq!(report.capability_info[0].capability, "CAPABILITY_FILES");
  assert_eq!(report.capability_info[1].capability, "CAPABILITY_NETWORK");
  assert_eq!(
    report.capability_info[1].path[1].site.filename,
    "example.com/dep@v1.2.3/fetch.go"
  );
  assert!(report.capability_info.is_sorted_by(|a, b| compare_caps(a, b) != std::cmp::Ordering::Greater));
  Ok(())
}

#[test]
fn golangci_document_decodes_into_canonical_issues() -> Result<()> {
  let raw = br#"{
    "Issues": [
      {
        "FromLinter": "gosec",
        "Text": "G404: Use of weak random number generator",
        "SourceLines": ["    n := rand.Intn(100)"],
        "Pos": {"Filename": "dep/random.go", "Offset": 311, "Line": 23, "Column": 10}
      },
      {
        "FromLinter": "errorlint",
        "Text": "type assertion on error will fail on wrapped errors",
        "SourceLines": ["  if e, ok := err.(*os.PathError); ok {"],
        "Pos": {"Filename": "dep/walk.go", "Offset": 120, "Line": 17, "Column": 12}
      }
    ]
  }"#;

  let issues = decode_golangci(raw)?;
  assert_eq!(issues.len(), 2);
  assert_eq!(issues[0].from_linter, "gosec");
  assert_eq!(issues[0].pos.column, 10);
  assert_eq!(issues[1].source_lines.len(), 1);
  Ok(())
}

#[test]
fn empty_golangci_document_yields_no_issues() -> Result<()> {
  let issues = decode_golangci(br#"{"Issues": null}"#)?;
  assert!(issues.is_empty());
  Ok(())
}
