//! imgsync core - backend logic for publishing image folders through a git remote.
//!
//! This crate contains all business logic with zero UI dependencies.
//! It copies image folders into a local working tree, pushes them to the
//! remote in bounded batches, and writes a per-folder spreadsheet of CDN URLs.
//! It can be driven by the CLI frontend, a GUI, or a test harness.

pub mod batching;
pub mod config;
pub mod logging;
pub mod manifest;
pub mod models;
pub mod orchestrator;
pub mod staging;
pub mod vcs;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
