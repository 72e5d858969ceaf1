//! Source extraction into the output directory.
//!
//! Archives carrying the configured extension are unpacked with `tar` and the
//! matching decoder. Directories holding a `Cargo.toml` are copied instead,
//! keeping their own name. Anything else is rejected.

use crate::config::Compression;
use crate::error::{Result, ServiceError};
use crate::manifest::find_manifest;
use bzip2::read::MultiBzDecoder;
use flate2::read::GzDecoder;
use log::{debug, info};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path};
use walkdir::WalkDir;
use xz2::read::XzDecoder;

/// How the source ended up in the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// An archive was unpacked.
    Unpacked,
    /// A source directory was copied under its own name.
    Copied,
    /// The source directory already is the copy target and was used as is.
    /// It belongs to the caller and must not be cleaned up.
    InPlace,
}

impl Extraction {
    /// Returns `true` when the extracted tree was created by this run.
    #[must_use]
    pub const fn is_owned(self) -> bool {
        !matches!(self, Self::InPlace)
    }
}

/// Unpacks or copies `source` into `dest_dir`.
///
/// A directory whose copy target resolves to the directory itself, as with
/// `--archive checkout --outdir .`, is not copied onto itself; the result is
/// [`Extraction::InPlace`].
///
/// # Errors
///
/// Returns [`ServiceError::UnsupportedArchiveFormat`] when `source` is neither
/// an archive with the configured extension nor a directory containing a
/// manifest, [`ServiceError::PathTraversal`] when an archive entry would land
/// outside `dest_dir`, and I/O errors from reading or writing files.
pub fn extract(source: &Path, dest_dir: &Path, compression: Compression) -> Result<Extraction> {
    let name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    if compression.matches(&name) {
        info!("extracting {} into {}", source.display(), dest_dir.display());
        fs::create_dir_all(dest_dir)?;
        let entries = unpack_archive(source, dest_dir, compression)?;
        debug!("unpacked {entries} entries from {name}");
        return Ok(Extraction::Unpacked);
    }

    if !name.is_empty() && source.is_dir() && find_manifest(source)?.is_some() {
        let target = dest_dir.join(&name);
        if is_same_dir(source, &target)? {
            info!("{} is already in the output directory; using it in place", source.display());
            return Ok(Extraction::InPlace);
        }
        info!("copying {} to {}", source.display(), target.display());
        fs::create_dir_all(dest_dir)?;
        copy_tree(source, &target, dest_dir)?;
        return Ok(Extraction::Copied);
    }

    Err(ServiceError::UnsupportedArchiveFormat {
        path: source.to_path_buf(),
    })
}

/// Compares canonical paths; a missing `target` is never the same.
fn is_same_dir(source: &Path, target: &Path) -> Result<bool> {
    let source = fs::canonicalize(source)?;
    Ok(fs::canonicalize(target).is_ok_and(|target| target == source))
}

/// Opens `path` with the decoder for `compression`.
///
/// # Errors
///
/// Returns [`ServiceError::Io`] if the file cannot be opened or the decoder
/// cannot be initialised.
pub fn open_archive(path: &Path, compression: Compression) -> Result<tar::Archive<Box<dyn Read>>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = match compression {
        Compression::Tar => Box::new(file),
        Compression::Gz => Box::new(GzDecoder::new(file)),
        Compression::Xz => Box::new(XzDecoder::new_multi_decoder(file)),
        Compression::Zst => Box::new(zstd::Decoder::new(file)?),
        Compression::Bz2 => Box::new(MultiBzDecoder::new(file)),
    };
    Ok(tar::Archive::new(reader))
}

fn unpack_archive(source: &Path, dest_dir: &Path, compression: Compression) -> Result<usize> {
    let mut archive = open_archive(source, compression)?;
    let mut unpacked = 0;

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();
        validate_entry_path(&entry_path)?;

        entry.unpack_in(dest_dir)?;
        unpacked += 1;
    }

    Ok(unpacked)
}

/// Rejects entry paths that are absolute or contain `..`.
fn validate_entry_path(path: &Path) -> Result<()> {
    let escapes = path.components().any(|component| {
        matches!(
            component,
            Component::Prefix(_) | Component::RootDir | Component::ParentDir
        )
    });
    if escapes {
        return Err(ServiceError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

/// Recursively copies `source` to `target`, recreating symlinks as links.
///
/// `exclude` is left out of the copy; it matters when the output directory
/// lies inside the source tree.
fn copy_tree(source: &Path, target: &Path, exclude: &Path) -> Result<()> {
    let walker = WalkDir::new(source)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.path() != exclude);

    for entry_result in walker {
        let entry = entry_result?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let destination = target.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&destination)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &destination)?;
        } else {
            fs::copy(entry.path(), &destination)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, destination: &Path) -> Result<()> {
    let pointee = fs::read_link(link)?;
    std::os::unix::fs::symlink(pointee, destination)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, destination: &Path) -> Result<()> {
    fs::copy(link, destination)?;
    Ok(())
}
