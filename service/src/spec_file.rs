//! RPM spec file parsing.
//!
//! Only the pieces the locator needs are read: the file stem, used as the
//! archive name prefix, and the last `Version:` directive.

use crate::error::Result;
use std::path::{Path, PathBuf};

const VERSION_TAG: &str = "version:";

/// A parsed packaging recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFile {
    path: PathBuf,
    version: Option<String>,
}

impl SpecFile {
    /// Reads and parses the spec file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ServiceError::Io`] if the file cannot be read.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse(path, &contents))
    }

    /// Parses spec file `contents` that were read from `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use obs_service_cargo_vendor::spec_file::SpecFile;
    /// use std::path::Path;
    ///
    /// let spec = SpecFile::parse(Path::new("demo.spec"), "Name: demo\nVersion: 1.2.3\n");
    /// assert_eq!(spec.version(), Some("1.2.3"));
    /// assert_eq!(spec.stem(), Some("demo"));
    /// ```
    #[must_use]
    pub fn parse(path: &Path, contents: &str) -> Self {
        let version = contents.lines().filter_map(parse_version_line).last();
        Self {
            path: path.to_path_buf(),
            version,
        }
    }

    /// Returns the value of the last `Version:` directive, if any.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the file name without the `.spec` extension.
    #[must_use]
    pub fn stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|stem| stem.to_str())
    }

    /// Returns the path the spec file was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_version_line(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let tag = trimmed.get(..VERSION_TAG.len())?;
    if !tag.eq_ignore_ascii_case(VERSION_TAG) {
        return None;
    }
    let value = trimmed.get(VERSION_TAG.len()..)?.trim();
    (!value.is_empty()).then(|| value.to_owned())
}
