//! Adapters around the external analyzers
//!
//! Each adapter materializes its embedded configuration into a private
//! temporary directory, invokes the analyzer through the isolated
//! subprocess layer, and decodes the wire format into canonical finding
//! types at this boundary. Nothing past these modules ever sees an
//! analyzer-specific shape.

pub mod capslock;
pub mod lint;

use std::path::Path;

/// Make a reported source path relative to the module cache root.
///
/// The cache directory differs between machines and the per-version
/// package directories differ between inspections, so findings are only
/// comparable once anchored to this fixed root. Paths outside the cache
/// are returned unchanged.
pub(crate) fn cache_relative(mod_cache: &Path, reported: &str) -> String {
  Path::new(reported)
    .strip_prefix(mod_cache)
    .map(|rel| rel.to_string_lossy().into_owned())
    .unwrap_or_else(|_| reported.to_string())
}
