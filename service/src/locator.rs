//! Source archive autodetection.
//!
//! Without `--archive`, the source is found by convention: the
//! lexicographically greatest `*.spec` file names the package, and the
//! greatest `<stem>*.<archive extension>` next to it is the source archive.
//! Picking the greatest name stands in for "newest version"; no version
//! parsing is attempted. When no archive matches, an already unpacked source
//! tree containing a `Cargo.toml` is used instead.

use crate::config::Compression;
use crate::error::{Result, ServiceError};
use crate::manifest::{ManifestSearch, find_manifest_with};
use crate::spec_file::SpecFile;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// What the locator selected as the source to vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// An archive or directory name given with `--archive`.
    Explicit(PathBuf),
    /// An archive matched against the spec file.
    Archive {
        /// Archive file name relative to the working directory.
        name: PathBuf,
        /// Set when the spec's `Version:` is not part of the archive name.
        version_mismatch: Option<VersionMismatch>,
    },
    /// An unpacked source directory containing a manifest.
    Directory(PathBuf),
}

impl SourceRef {
    /// Returns the selected archive or directory path, relative to the
    /// working directory unless given as an absolute path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(path) | Self::Directory(path) => path,
            Self::Archive { name, .. } => name,
        }
    }
}

/// A spec version that does not appear in the selected archive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMismatch {
    /// Version declared in the spec file.
    pub spec_version: String,
    /// File name of the selected archive.
    pub archive: String,
}

/// Determines which archive or directory to vendor.
///
/// `explicit` short-circuits detection. `skip` names a directory the manifest
/// fallback must not descend into, normally the output directory.
///
/// # Errors
///
/// Returns [`ServiceError::NoSpecFile`] when autodetection finds no spec
/// file, and [`ServiceError::NoManifest`] when neither an archive nor an
/// unpacked source tree is present.
pub fn locate(
    workdir: &Path,
    explicit: Option<&Path>,
    compression: Compression,
    skip: Option<&Path>,
) -> Result<SourceRef> {
    if let Some(archive) = explicit {
        info!("using archive {}", archive.display());
        return Ok(SourceRef::Explicit(archive.to_path_buf()));
    }

    let spec_path = greatest_match(workdir, "*.spec")?.ok_or_else(|| ServiceError::NoSpecFile {
        dir: workdir.to_path_buf(),
    })?;
    info!("using spec file {}", spec_path.display());
    let spec = SpecFile::read(&spec_path)?;

    let archive = match spec.stem() {
        Some(stem) => {
            let pattern = format!(
                "{}*.{}",
                glob::Pattern::escape(stem),
                compression.archive_extension()
            );
            greatest_match(spec_dir(&spec_path, workdir), &pattern)?
        }
        None => None,
    };

    match archive {
        Some(archive_path) => {
            let name = file_name_of(&archive_path);
            info!("detected archive {name}");
            let version_mismatch = check_version(&spec, &name);
            if let Some(mismatch) = &version_mismatch {
                warn!(
                    "spec version {} does not appear in archive name {}",
                    mismatch.spec_version, mismatch.archive
                );
            }
            Ok(SourceRef::Archive {
                name: PathBuf::from(name),
                version_mismatch,
            })
        }
        None => locate_source_directory(workdir, skip),
    }
}

/// Falls back to an unpacked source tree below `workdir`.
fn locate_source_directory(workdir: &Path, skip: Option<&Path>) -> Result<SourceRef> {
    debug!("no matching archive; searching {} for a manifest", workdir.display());
    let search = ManifestSearch { min_depth: 2, skip };
    let manifest = find_manifest_with(workdir, &search)?.ok_or_else(|| ServiceError::NoManifest {
        dir: workdir.to_path_buf(),
    })?;

    // min_depth 2 guarantees a parent strictly below workdir.
    let source_dir = manifest
        .parent()
        .and_then(|parent| parent.strip_prefix(workdir).ok())
        .map(Path::to_path_buf)
        .ok_or_else(|| ServiceError::NoManifest {
            dir: workdir.to_path_buf(),
        })?;
    info!("using source directory {}", source_dir.display());
    Ok(SourceRef::Directory(source_dir))
}

fn check_version(spec: &SpecFile, archive_name: &str) -> Option<VersionMismatch> {
    let version = spec.version()?;
    if archive_name.contains(version) {
        return None;
    }
    Some(VersionMismatch {
        spec_version: version.to_owned(),
        archive: archive_name.to_owned(),
    })
}

/// Returns the lexicographically greatest file in `dir` matching `pattern`.
fn greatest_match(dir: &Path, pattern: &str) -> Result<Option<PathBuf>> {
    let full = format!("{}/{pattern}", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut matches: Vec<PathBuf> = glob::glob(&full)?
        .filter_map(std::result::Result::ok)
        .filter(|path| path.is_file())
        .collect();
    matches.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(matches.into_iter().next())
}

fn spec_dir<'a>(spec_path: &'a Path, workdir: &'a Path) -> &'a Path {
    spec_path.parent().unwrap_or(workdir)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write file");
    }

    #[test]
    fn explicit_archive_short_circuits_detection() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = locate(
            dir.path(),
            Some(Path::new("custom.tar.gz")),
            Compression::Gz,
            None,
        )
        .expect("locate");
        assert_eq!(source, SourceRef::Explicit(PathBuf::from("custom.tar.gz")));
    }

    #[test]
    fn missing_spec_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "demo-1.2.3.tar.gz", "");
        let err = locate(dir.path(), None, Compression::Gz, None).expect_err("no spec");
        assert!(matches!(err, ServiceError::NoSpecFile { .. }));
    }

    #[test]
    fn picks_greatest_matching_archive() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "demo.spec", "Version: 1.10.0\n");
        write(dir.path(), "demo-1.0.0.tar.gz", "");
        write(dir.path(), "demo-1.10.0.tar.gz", "");
        write(dir.path(), "demo-1.10.0.tar.zst", "");
        let source = locate(dir.path(), None, Compression::Gz, None).expect("locate");
        assert_eq!(
            source,
            SourceRef::Archive {
                name: PathBuf::from("demo-1.10.0.tar.gz"),
                version_mismatch: None,
            }
        );
    }

    #[test]
    fn picks_greatest_spec_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "alpha.spec", "Version: 1.0.0\n");
        write(dir.path(), "beta.spec", "Version: 2.0.0\n");
        write(dir.path(), "alpha-1.0.0.tar.gz", "");
        write(dir.path(), "beta-2.0.0.tar.gz", "");
        let source = locate(dir.path(), None, Compression::Gz, None).expect("locate");
        assert_eq!(source.path(), Path::new("beta-2.0.0.tar.gz"));
    }

    #[test]
    fn version_mismatch_is_reported_not_fatal() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "foo.spec", "Name: foo\nVersion: 2.0.0\n");
        write(dir.path(), "foo-1.9.0.tar.gz", "");
        let source = locate(dir.path(), None, Compression::Gz, None).expect("locate");
        assert_eq!(
            source,
            SourceRef::Archive {
                name: PathBuf::from("foo-1.9.0.tar.gz"),
                version_mismatch: Some(VersionMismatch {
                    spec_version: "2.0.0".to_owned(),
                    archive: "foo-1.9.0.tar.gz".to_owned(),
                }),
            }
        );
    }

    #[test]
    fn falls_back_to_unpacked_source_tree() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "demo.spec", "Version: 1.2.3\n");
        write(dir.path(), "demo-1.2.3/Cargo.toml", "[package]\n");
        let source = locate(dir.path(), None, Compression::Gz, None).expect("locate");
        assert_eq!(source, SourceRef::Directory(PathBuf::from("demo-1.2.3")));
    }

    #[test]
    fn fallback_skips_output_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "demo.spec", "Version: 1.2.3\n");
        write(dir.path(), "out/demo-1.2.3/Cargo.toml", "[package]\n");
        let out = dir.path().join("out");
        let err = locate(dir.path(), None, Compression::Gz, Some(&out)).expect_err("no source");
        assert!(matches!(err, ServiceError::NoManifest { .. }));
    }

    #[test]
    fn fallback_without_manifest_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "demo.spec", "Version: 1.2.3\n");
        write(dir.path(), "demo-1.2.3.tar.zst", "");
        let err = locate(dir.path(), None, Compression::Gz, None).expect_err("no source");
        assert!(matches!(err, ServiceError::NoManifest { .. }));
    }

    #[test]
    fn archive_prefix_must_match_spec_stem() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "demo.spec", "Version: 1.2.3\n");
        write(dir.path(), "other-1.2.3.tar.gz", "");
        write(dir.path(), "src/demo/Cargo.toml", "[package]\n");
        let source = locate(dir.path(), None, Compression::Gz, None).expect("locate");
        assert_eq!(source, SourceRef::Directory(PathBuf::from("src/demo")));
    }
}
