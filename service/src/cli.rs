//! CLI argument definitions for the cargo vendor source service.
//!
//! OBS invokes the service with `--name value` pairs taken from the package's
//! `_service` file. Strategy and compression stay plain strings here so that
//! unknown values are rejected by [`crate::config`] with exit status 1 instead
//! of clap's usage error.

use camino::Utf8PathBuf;
use clap::Parser;

/// Vendor Cargo dependencies into a compressed archive for an OBS build.
#[derive(Parser, Debug, Clone)]
#[command(name = "obs-service-cargo-vendor")]
#[command(version, about)]
#[command(long_about = concat!(
    "Vendor Cargo dependencies for an OBS package build.\n\n",
    "The service locates the package's source archive (or an unpacked source ",
    "directory), extracts it into the output directory, runs `cargo vendor` ",
    "in the project root, and packs the result into vendor.tar.<codec>. ",
    "The configuration snippet printed by cargo is kept as cargo_config.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Autodetect the archive from the spec file:\n",
    "    $ obs-service-cargo-vendor --outdir out\n\n",
    "  Use an explicit archive and zstd compression:\n",
    "    $ obs-service-cargo-vendor --archive demo-1.2.3.tar.zst --compression zst --outdir out\n",
))]
pub struct Cli {
    /// Vendoring strategy (only "vendor" is implemented).
    #[arg(long, value_name = "STRATEGY", default_value = "vendor")]
    pub strategy: String,

    /// Archive or source directory to vendor [default: autodetect from the spec file].
    #[arg(long, value_name = "NAME")]
    pub archive: Option<Utf8PathBuf>,

    /// Output directory for the vendor archive and cargo_config.
    #[arg(long, value_name = "DIR")]
    pub outdir: Option<Utf8PathBuf>,

    /// Compression codec for the archives (tar, gz, xz, zst, bz2).
    #[arg(long, value_name = "CODEC", default_value = "gz")]
    pub compression: String,

    /// Run `cargo update` before vendoring.
    #[arg(long)]
    pub update: bool,
}

impl Default for Cli {
    /// Creates a `Cli` with the same values clap uses when no flags are given.
    ///
    /// # Examples
    ///
    /// ```
    /// use obs_service_cargo_vendor::cli::Cli;
    ///
    /// let cli = Cli::default();
    /// assert_eq!(cli.strategy, "vendor");
    /// assert_eq!(cli.compression, "gz");
    /// assert!(cli.outdir.is_none());
    /// ```
    fn default() -> Self {
        Self {
            strategy: "vendor".to_owned(),
            archive: None,
            outdir: None,
            compression: "gz".to_owned(),
            update: false,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
