//! Vendor archive creation and cleanup of the extracted source tree.
//!
//! The archive is always named `vendor.tar` plus the codec suffix and holds a
//! single top-level `vendor/` directory, so repeated runs with the same
//! flags overwrite the same artefact.

use crate::config::Compression;
use crate::error::Result;
use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use log::{error, info};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use xz2::write::XzEncoder;

/// Name of the top-level directory inside the vendor archive.
pub const ARCHIVE_ROOT: &str = "vendor";

/// xz preset used for vendor archives; matches the `xz` command default.
const XZ_PRESET: u32 = 6;

/// Packs `vendor_dir` into `<outdir>/vendor.<archive extension>`.
///
/// A missing `vendor_dir` is created empty first so the archive always holds
/// a `vendor/` entry.
///
/// # Errors
///
/// Returns [`crate::error::ServiceError::Io`] if the vendor directory cannot
/// be read or the archive cannot be written.
pub fn build_archive(vendor_dir: &Path, outdir: &Path, compression: Compression) -> Result<PathBuf> {
    fs::create_dir_all(vendor_dir)?;
    fs::create_dir_all(outdir)?;

    let archive_path = outdir.join(format!("vendor.{}", compression.archive_extension()));
    info!("creating {}", archive_path.display());

    let file = File::create(&archive_path)?;
    match compression {
        Compression::Tar => {
            let mut builder = tar::Builder::new(file);
            append_vendor_dir(&mut builder, vendor_dir)?;
            builder.into_inner()?.flush()?;
        }
        Compression::Gz => {
            let mut builder = tar::Builder::new(GzEncoder::new(file, flate2::Compression::default()));
            append_vendor_dir(&mut builder, vendor_dir)?;
            builder.into_inner()?.finish()?;
        }
        Compression::Xz => {
            let mut builder = tar::Builder::new(XzEncoder::new(file, XZ_PRESET));
            append_vendor_dir(&mut builder, vendor_dir)?;
            builder.into_inner()?.finish()?;
        }
        Compression::Zst => {
            let mut builder = tar::Builder::new(zstd::Encoder::new(file, 0)?);
            append_vendor_dir(&mut builder, vendor_dir)?;
            builder.into_inner()?.finish()?;
        }
        Compression::Bz2 => {
            let encoder = BzEncoder::new(file, bzip2::Compression::default());
            let mut builder = tar::Builder::new(encoder);
            append_vendor_dir(&mut builder, vendor_dir)?;
            builder.into_inner()?.finish()?;
        }
    }

    Ok(archive_path)
}

fn append_vendor_dir<W: Write>(builder: &mut tar::Builder<W>, vendor_dir: &Path) -> Result<()> {
    builder.follow_symlinks(false);
    builder.append_dir_all(ARCHIVE_ROOT, vendor_dir)?;
    builder.finish()?;
    Ok(())
}

/// Removes the extracted source tree from `outdir` after packing.
///
/// The tree is named after the file name of `source` with the archive
/// extension stripped; unpacked sources keep their directory name. Failure
/// is logged, never fatal. The return value reports whether the tree was
/// removed.
pub fn cleanup_source_tree(outdir: &Path, source: &Path, compression: Compression) -> bool {
    let Some(name) = source.file_name().map(|name| name.to_string_lossy()) else {
        error!("cannot derive extracted directory from {}", source.display());
        return false;
    };
    let extracted = outdir.join(compression.strip_extension(&name));

    match fs::remove_dir_all(&extracted) {
        Ok(()) => {
            info!("removed {}", extracted.display());
            true
        }
        Err(err) => {
            error!("failed to remove {}: {err}", extracted.display());
            false
        }
    }
}
