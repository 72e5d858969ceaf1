//! Shared test utilities for the service crate.

use crate::error::{Result, ServiceError};
use crate::vendor::CommandExecutor;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a successful command `Output` printing `stdout`.
#[must_use]
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "cargo").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<&'static str>,
    /// Files to create relative to the working directory before returning,
    /// as `(relative path, contents)` pairs.
    pub creates: Vec<(&'static str, &'static str)>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expects `cargo vendor vendor` and answers with `result`.
    #[must_use]
    pub fn cargo_vendor(result: Result<Output>) -> Self {
        Self {
            cmd: "cargo",
            args: vec!["vendor", "vendor"],
            creates: Vec::new(),
            result,
        }
    }

    /// Expects `cargo update` and answers with `result`.
    #[must_use]
    pub fn cargo_update(result: Result<Output>) -> Self {
        Self {
            cmd: "cargo",
            args: vec!["update"],
            creates: Vec::new(),
            result,
        }
    }

    /// Adds a file the stub writes into the working directory when invoked.
    #[must_use]
    pub fn creating(mut self, relative: &'static str, contents: &'static str) -> Self {
        self.creates.push((relative, contents));
        self
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects beyond
/// the files each call is scripted to create.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    working_dirs: RefCell<Vec<PathBuf>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            working_dirs: RefCell::new(Vec::new()),
        }
    }

    /// Returns the working directories of all calls received so far.
    #[must_use]
    pub fn working_dirs(&self) -> Vec<PathBuf> {
        self.working_dirs.borrow().clone()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[String], cwd: &Path) -> Result<Output> {
        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ServiceError::StubMismatch {
                message: format!("unexpected invocation: {cmd} {}", args.join(" ")),
            })?;

        if call.cmd != cmd || call.args.as_slice() != args {
            return Err(ServiceError::StubMismatch {
                message: format!(
                    "expected {} {}, got {cmd} {}",
                    call.cmd,
                    call.args.join(" "),
                    args.join(" ")
                ),
            });
        }

        self.working_dirs.borrow_mut().push(cwd.to_path_buf());
        for (relative, contents) in &call.creates {
            let path = cwd.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)?;
        }

        call.result
    }
}
