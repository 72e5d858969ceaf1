//! Manifest discovery.
//!
//! A project root is the directory holding a `Cargo.toml`. The walk is depth
//! first and visits a directory's files before its subdirectories, each group
//! in file-name order. The first match wins: a manifest beside the tree root
//! beats any nested crate, though a nested crate in an earlier sibling
//! directory still beats a shallower manifest in a later one.

use crate::error::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File name marking a Cargo project root.
pub const MANIFEST_FILE: &str = "Cargo.toml";

/// Options restricting a manifest walk.
#[derive(Debug, Clone, Default)]
pub struct ManifestSearch<'a> {
    /// Minimum depth of the manifest relative to the root (0 is the root itself).
    pub min_depth: usize,
    /// Directory excluded from the walk, together with everything below it.
    pub skip: Option<&'a Path>,
}

/// Returns the full path of the first `Cargo.toml` below `root`, if any.
///
/// # Errors
///
/// Returns [`crate::error::ServiceError::Io`] if `root` cannot be read.
/// Unreadable entries below `root` are skipped.
///
/// # Examples
///
/// ```
/// use obs_service_cargo_vendor::manifest::find_manifest;
///
/// let dir = tempfile::tempdir()?;
/// std::fs::create_dir_all(dir.path().join("pkg"))?;
/// std::fs::write(dir.path().join("pkg/Cargo.toml"), "[package]\n")?;
///
/// let found = find_manifest(dir.path())?.expect("manifest present");
/// assert!(found.ends_with("pkg/Cargo.toml"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn find_manifest(root: &Path) -> Result<Option<PathBuf>> {
    find_manifest_with(root, &ManifestSearch::default())
}

/// Returns the first `Cargo.toml` below `root` honouring `search`.
///
/// # Errors
///
/// Returns [`crate::error::ServiceError::Io`] if `root` cannot be read.
pub fn find_manifest_with(root: &Path, search: &ManifestSearch<'_>) -> Result<Option<PathBuf>> {
    // Surface an unreadable root instead of reporting "not found".
    std::fs::read_dir(root)?;

    // Entries above min_depth never reach the filter, so `skip` is matched by
    // prefix rather than on the directory itself.
    let walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(search.min_depth)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter()
        .filter_entry(|entry| search.skip.is_none_or(|skip| !entry.path().starts_with(skip)));

    let found = walker
        .filter_map(std::result::Result::ok)
        .find(|entry| entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE)
        .map(walkdir::DirEntry::into_path);
    Ok(found)
}

/// Returns the directory containing the manifest found below `root`.
///
/// # Errors
///
/// Returns [`crate::error::ServiceError::NoManifest`] when the tree holds no
/// manifest.
pub fn find_project_root(root: &Path) -> Result<PathBuf> {
    find_manifest(root)?
        .and_then(|manifest| manifest.parent().map(Path::to_path_buf))
        .ok_or_else(|| crate::error::ServiceError::NoManifest {
            dir: root.to_path_buf(),
        })
}
