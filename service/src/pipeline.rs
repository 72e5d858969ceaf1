//! Source service pipeline orchestration.
//!
//! The run is strictly linear: locate the source, extract it into the output
//! directory, find the project root, vendor, then pack and clean up. Any stage
//! error ends the run; only the final cleanup is allowed to fail quietly.

use crate::config::{ServiceConfig, Strategy};
use crate::error::Result;
use crate::extraction::{Extraction, extract};
use crate::locator::{SourceRef, locate};
use crate::manifest::find_project_root;
use crate::packaging::{build_archive, cleanup_source_tree};
use crate::vendor::{CommandExecutor, usage_hint, vendor};
use log::{debug, info};
use std::fmt;
use std::path::PathBuf;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing has run yet.
    Start,
    /// The source archive or directory was selected.
    Located,
    /// The source was unpacked into the output directory.
    Extracted,
    /// The project root holding `Cargo.toml` was found.
    ManifestFound,
    /// `cargo vendor` completed.
    Vendored,
    /// The vendor archive was written.
    Archived,
    /// The extracted tree was cleaned up and the run finished.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Located => "located",
            Self::Extracted => "extracted",
            Self::ManifestFound => "manifest found",
            Self::Vendored => "vendored",
            Self::Archived => "archived",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// The source the locator selected.
    pub source: SourceRef,
    /// Directory `cargo vendor` ran in.
    pub project_root: PathBuf,
    /// The produced vendor archive.
    pub archive_path: PathBuf,
    /// The captured cargo configuration, when cargo printed one.
    pub cargo_config: Option<PathBuf>,
    /// Whether the extracted source tree was removed. A source directory
    /// used in place is never removed.
    pub cleaned_up: bool,
}

/// Runs the configured strategy.
///
/// # Errors
///
/// Returns the first stage error: discovery failures, a failed `cargo vendor`
/// run, or I/O errors while extracting or packing.
pub fn run(config: &ServiceConfig, executor: &dyn CommandExecutor) -> Result<PipelineReport> {
    match config.strategy {
        Strategy::Vendor => run_vendor(config, executor),
    }
}

fn run_vendor(config: &ServiceConfig, executor: &dyn CommandExecutor) -> Result<PipelineReport> {
    enter(Stage::Start);

    let source = locate(
        &config.workdir,
        config.archive.as_deref(),
        config.compression,
        Some(&config.outdir),
    )?;
    enter(Stage::Located);

    let source_path = config.workdir.join(source.path());
    let extraction = extract(&source_path, &config.outdir, config.compression)?;
    enter(Stage::Extracted);

    let search_root = match extraction {
        Extraction::InPlace => source_path.as_path(),
        Extraction::Unpacked | Extraction::Copied => config.outdir.as_path(),
    };
    let project_root = find_project_root(search_root)?;
    info!("project root is {}", project_root.display());
    enter(Stage::ManifestFound);

    let outcome =
        vendor(executor, &project_root, &config.outdir, config.update)?.into_result(&project_root)?;
    enter(Stage::Vendored);

    let archive_path = build_archive(&outcome.vendor_dir, &config.outdir, config.compression)?;
    enter(Stage::Archived);
    if outcome.cargo_config.is_some() {
        let archive_name = archive_path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        info!("{}", usage_hint(&archive_name));
    }

    let cleaned_up = extraction.is_owned()
        && cleanup_source_tree(&config.outdir, source.path(), config.compression);
    enter(Stage::Done);
    info!("vendored dependencies written to {}", archive_path.display());

    Ok(PipelineReport {
        source,
        project_root,
        archive_path,
        cargo_config: outcome.cargo_config,
        cleaned_up,
    })
}

fn enter(stage: Stage) {
    debug!("stage: {stage}");
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
