//! `cargo vendor` invocation.
//!
//! The vendoring command runs in the project root and writes the vendored
//! crates to `vendor/`. Whatever cargo prints on stdout is the source
//! replacement configuration the package build needs; it is kept verbatim as
//! `cargo_config` in the output directory.

use crate::error::{Result, ServiceError};
use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Name of the directory `cargo vendor` fills inside the project root.
pub const VENDOR_DIR: &str = "vendor";

/// Abstraction for running external commands.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor {
    /// Runs `cmd` with `args` in `cwd` and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use obs_service_cargo_vendor::vendor::{CommandExecutor, SystemCommandExecutor};
    /// use std::path::Path;
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("cargo", &["--version".to_owned()], Path::new("."))?;
    /// assert!(output.status.success());
    /// # Ok::<(), obs_service_cargo_vendor::error::ServiceError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[String], cwd: &Path) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[String], cwd: &Path) -> Result<Output> {
        Command::new(cmd)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(ServiceError::from)
    }
}

/// Outcome of one vendoring attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorOutcome {
    /// `<project root>/vendor`, returned whether or not cargo succeeded.
    pub vendor_dir: PathBuf,
    /// Whether `cargo vendor` exited successfully.
    pub succeeded: bool,
    /// Path of the written `cargo_config`, if cargo printed anything.
    pub cargo_config: Option<PathBuf>,
    /// Captured stderr (or stdout) of a failed run.
    pub failure_output: Option<String>,
}

impl VendorOutcome {
    /// Converts a failed outcome into [`ServiceError::VendorFailed`].
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::VendorFailed`] when cargo did not succeed.
    pub fn into_result(self, project_root: &Path) -> Result<Self> {
        if self.succeeded {
            return Ok(self);
        }
        Err(ServiceError::VendorFailed {
            project_root: project_root.to_path_buf(),
            reason: self
                .failure_output
                .unwrap_or_else(|| "cargo vendor exited unsuccessfully".to_owned()),
        })
    }
}

/// Returns the spec file example shown after `cargo_config` is written.
///
/// `archive_name` is the file name of the produced vendor archive.
///
/// # Examples
///
/// ```
/// use obs_service_cargo_vendor::vendor::usage_hint;
///
/// assert!(usage_hint("vendor.tar.zst").contains("Source1:    vendor.tar.zst"));
/// ```
#[must_use]
pub fn usage_hint(archive_name: &str) -> String {
    format!(
        "\
Your spec file should be modified per the following example:

---BEGIN---
%global rustflags '-Clink-arg=-Wl,-z,relro,-z,now'

Source1:    {archive_name}
Source2:    cargo_config

%prep
%setup -qa1
mkdir .cargo
cp %{{SOURCE2}} .cargo/config

%build
RUSTFLAGS=%{{rustflags}} cargo build --release

%install
RUSTFLAGS=%{{rustflags}} cargo install --root=%{{buildroot}}%{{_prefix}} --path .
---END---

WARNING: To avoid cargo install rebuilding the binary in the install stage
all environment variables must be the same as in the build stage."
    )
}

/// Runs the vendoring command in `project_root`.
///
/// When `update` is set, `cargo update` runs first; its failure is only
/// logged. A non-zero exit from `cargo vendor` is reported through
/// [`VendorOutcome::succeeded`], leaving the caller to decide how fatal it is.
///
/// # Errors
///
/// Returns [`ServiceError::Io`] if cargo cannot be spawned or `cargo_config`
/// cannot be written.
pub fn vendor(
    executor: &dyn CommandExecutor,
    project_root: &Path,
    outdir: &Path,
    update: bool,
) -> Result<VendorOutcome> {
    if update {
        run_update(executor, project_root)?;
    }

    info!("running cargo vendor in {}", project_root.display());
    let output = executor.run("cargo", &cargo_args(&["vendor", VENDOR_DIR]), project_root)?;
    let vendor_dir = project_root.join(VENDOR_DIR);

    if !output.status.success() {
        let captured = captured_failure(&output);
        match &captured {
            Some(text) => error!("cargo vendor failed: {text}"),
            None => error!("cargo vendor failed with {}", output.status),
        }
        return Ok(VendorOutcome {
            vendor_dir,
            succeeded: false,
            cargo_config: None,
            failure_output: captured,
        });
    }

    let cargo_config = persist_cargo_config(&output.stdout, outdir)?;

    Ok(VendorOutcome {
        vendor_dir,
        succeeded: true,
        cargo_config,
        failure_output: None,
    })
}

fn run_update(executor: &dyn CommandExecutor, project_root: &Path) -> Result<()> {
    info!("running cargo update in {}", project_root.display());
    let output = executor.run("cargo", &cargo_args(&["update"]), project_root)?;
    if !output.status.success() {
        let detail = captured_failure(&output).unwrap_or_else(|| output.status.to_string());
        warn!("cargo update failed, vendoring the locked versions: {detail}");
    }
    Ok(())
}

/// Writes non-empty `stdout` to `<outdir>/cargo_config`, replacing any
/// earlier file. Empty output leaves an existing file untouched.
fn persist_cargo_config(stdout: &[u8], outdir: &Path) -> Result<Option<PathBuf>> {
    if stdout.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    fs::create_dir_all(outdir)?;
    let path = outdir.join(crate::config::CARGO_CONFIG_FILE);
    fs::write(&path, stdout)?;
    info!("wrote {}", path.display());
    Ok(Some(path))
}

fn cargo_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|&arg| arg.to_owned()).collect()
}

fn captured_failure(output: &Output) -> Option<String> {
    [&output.stderr, &output.stdout]
        .into_iter()
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_owned())
        .find(|text| !text.is_empty())
}
