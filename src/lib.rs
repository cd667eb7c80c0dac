//! Inspect and diff Go module dependencies
//!
//! dep-inspector pins a dependency of the consuming Go module to a
//! specific version, drives external analyzers (capslock for capability
//! analysis, golangci-lint and staticcheck for correctness lints) over
//! the packages the consumer actually uses, and diffs the normalized
//! findings between two versions so an upgrade's behavioral surface is
//! visible before it lands. The live `go.mod`/`go.sum` are snapshotted
//! and restored around every run.

pub mod analyzers;
pub mod core;
pub mod diff;
pub mod gocmd;
pub mod inspect;
pub mod manifest;
pub mod report;
pub mod resolve;
pub mod totals;
