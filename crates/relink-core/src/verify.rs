//! Post-rewrite checks: running the project's tests and locating new modules.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Result of one test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    /// Whether the runner exited successfully
    pub success: bool,
    /// Captured stdout followed by stderr, or the launch error
    pub output: String,
}

/// Something that can verify the project after imports were rewritten.
pub trait TestRunner {
    fn run(&self) -> TestOutcome;
}

/// Runs an external test command and waits for it to finish.
#[derive(Debug, Clone)]
pub struct CommandTestRunner {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl CommandTestRunner {
    /// Runner for `program` with no extra arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run inside `dir`.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl TestRunner for CommandTestRunner {
    fn run(&self) -> TestOutcome {
        info!(program = %self.program, args = ?self.args, "Running tests");

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }

        match command.output() {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));

                let success = output.status.success();
                if !success {
                    warn!(status = ?output.status.code(), "Test run failed");
                }

                TestOutcome {
                    success,
                    output: text,
                }
            }
            Err(e) => {
                warn!(program = %self.program, error = %e, "Failed to launch test runner");
                TestOutcome {
                    success: false,
                    output: format!("Failed to launch {}: {}", self.program, e),
                }
            }
        }
    }
}

/// Whether `module_path` resolves to a `.py` file under `source_dir`.
pub fn verify_module_location(source_dir: &Path, module_path: &str) -> bool {
    let mut path = source_dir.to_path_buf();
    for part in module_path.split('.') {
        path.push(part);
    }
    path.set_extension("py");
    path.is_file()
}
