//! Integration test entry point

mod helpers;
mod test_changes;
mod test_decode;
mod test_diff;
mod test_inspect;
mod test_manifest;
