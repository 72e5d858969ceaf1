//! Invocation configuration built once from the parsed command line.
//!
//! [`ServiceConfig`] is immutable after construction and is the only value the
//! pipeline consults for flags. Validation of strategy and codec names happens
//! here so that every later stage can rely on a supported configuration.

use crate::cli::Cli;
use crate::error::{Result, ServiceError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Vendoring strategy selected with `--strategy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Run `cargo vendor` and pack the vendored sources.
    Vendor,
}

impl FromStr for Strategy {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "vendor" => Ok(Self::Vendor),
            other => Err(ServiceError::UnknownStrategy {
                name: other.to_owned(),
            }),
        }
    }
}

/// Compression codec used for both the input source archive and the produced
/// vendor archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Plain, uncompressed tar.
    Tar,
    /// gzip via `flate2`.
    Gz,
    /// xz via `xz2`.
    Xz,
    /// Zstandard via `zstd`.
    Zst,
    /// bzip2 via `bzip2`.
    Bz2,
}

impl Compression {
    /// Returns the filename extension of archives using this codec, without a
    /// leading dot.
    ///
    /// # Examples
    ///
    /// ```
    /// use obs_service_cargo_vendor::config::Compression;
    ///
    /// assert_eq!(Compression::Gz.archive_extension(), "tar.gz");
    /// assert_eq!(Compression::Tar.archive_extension(), "tar");
    /// ```
    #[must_use]
    pub const fn archive_extension(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::Gz => "tar.gz",
            Self::Xz => "tar.xz",
            Self::Zst => "tar.zst",
            Self::Bz2 => "tar.bz2",
        }
    }

    /// Returns `true` if `name` ends with this codec's archive extension.
    #[must_use]
    pub fn matches(self, name: &str) -> bool {
        name.strip_suffix(self.archive_extension())
            .is_some_and(|rest| rest.ends_with('.'))
    }

    /// Strips this codec's archive extension (and its dot) from `name`.
    ///
    /// Names that do not carry the extension are returned unchanged, which is
    /// what directory sources need.
    #[must_use]
    pub fn strip_extension(self, name: &str) -> &str {
        name.strip_suffix(self.archive_extension())
            .and_then(|rest| rest.strip_suffix('.'))
            .unwrap_or(name)
    }
}

impl FromStr for Compression {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tar" => Ok(Self::Tar),
            "gz" => Ok(Self::Gz),
            "xz" => Ok(Self::Xz),
            "zst" | "zstd" => Ok(Self::Zst),
            "bz2" | "bzip2" => Ok(Self::Bz2),
            other => Err(ServiceError::UnsupportedCompression {
                name: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tar => "tar",
            Self::Gz => "gz",
            Self::Xz => "xz",
            Self::Zst => "zst",
            Self::Bz2 => "bz2",
        };
        f.write_str(name)
    }
}

/// Immutable configuration for one service run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Selected vendoring strategy.
    pub strategy: Strategy,
    /// Explicit archive or directory name; `None` triggers autodetection.
    pub archive: Option<PathBuf>,
    /// Absolute output directory.
    pub outdir: PathBuf,
    /// Codec for the source and vendor archives.
    pub compression: Compression,
    /// Whether to run `cargo update` before vendoring.
    pub update: bool,
    /// Directory in which autodetection runs and relative names resolve.
    pub workdir: PathBuf,
}

impl ServiceConfig {
    /// Validates the parsed flags and builds the run configuration.
    ///
    /// Compression is checked first, then the strategy, then the output
    /// directory. Relative output paths resolve against `workdir`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::UnsupportedCompression`],
    /// [`ServiceError::UnknownStrategy`] or [`ServiceError::MissingOutdir`].
    pub fn from_cli(cli: &Cli, workdir: &Path) -> Result<Self> {
        let compression = cli.compression.parse::<Compression>()?;
        let strategy = cli.strategy.parse::<Strategy>()?;
        let outdir = cli
            .outdir
            .as_ref()
            .map(|dir| workdir.join(dir.as_std_path()))
            .ok_or(ServiceError::MissingOutdir)?;

        Ok(Self {
            strategy,
            archive: cli.archive.as_ref().map(|a| a.as_std_path().to_path_buf()),
            outdir,
            compression,
            update: cli.update,
            workdir: workdir.to_path_buf(),
        })
    }

    /// Returns the path of the produced vendor archive.
    #[must_use]
    pub fn vendor_archive_path(&self) -> PathBuf {
        self.outdir
            .join(format!("vendor.{}", self.compression.archive_extension()))
    }

    /// Returns the path of the captured cargo configuration snippet.
    #[must_use]
    pub fn cargo_config_path(&self) -> PathBuf {
        self.outdir.join(CARGO_CONFIG_FILE)
    }
}

/// Name of the file receiving the configuration printed by `cargo vendor`.
pub const CARGO_CONFIG_FILE: &str = "cargo_config";
