//! OBS source service that vendors Cargo dependencies.
//!
//! Given a package directory holding an RPM spec file and the upstream source
//! (an archive or an unpacked tree), the service extracts the source into the
//! output directory, runs `cargo vendor` in the project root, and packs the
//! result as `vendor.tar.<codec>` next to a `cargo_config` file holding the
//! source replacement configuration cargo printed.
//!
//! # Modules
//!
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Validated run configuration
//! - [`error`] - Error types and exit codes
//! - [`extraction`] - Archive unpacking and directory copying
//! - [`locator`] - Source archive discovery from the spec file
//! - [`logging`] - Log subscriber set-up for the binary
//! - [`manifest`] - `Cargo.toml` discovery
//! - [`packaging`] - Vendor archive creation and cleanup
//! - [`pipeline`] - Stage orchestration
//! - [`spec_file`] - RPM spec file parsing
//! - [`vendor`] - `cargo vendor` invocation

pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod locator;
pub mod logging;
pub mod manifest;
pub mod packaging;
pub mod pipeline;
pub mod spec_file;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod vendor;
