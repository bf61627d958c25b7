//! Synchronous execution of external programs.
//!
//! The runner never returns an error: spawn failures and non-zero exits both
//! come back as [`CommandOutcome::Failed`], and callers decide what is fatal.

use std::path::Path;
use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult, Stage};
use crate::traits::{CommandExecutor, Output};

/// Captured streams of a finished command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A command that could not be started or exited non-zero
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailure {
    /// Rendered command line
    pub command: String,
    /// `None` when the program never ran or was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    /// Stderr of the program, or the spawn error message
    pub stderr: String,
}

/// Result of running one external command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Succeeded(CapturedOutput),
    Failed(CommandFailure),
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        matches!(self, CommandOutcome::Succeeded(_))
    }

    pub fn stdout(&self) -> &str {
        match self {
            CommandOutcome::Succeeded(output) => &output.stdout,
            CommandOutcome::Failed(failure) => &failure.stdout,
        }
    }

    pub fn stderr(&self) -> &str {
        match self {
            CommandOutcome::Succeeded(output) => &output.stderr,
            CommandOutcome::Failed(failure) => &failure.stderr,
        }
    }

    /// Turn a failure into a pipeline error attributed to `stage`
    pub fn into_stage(self, stage: Stage) -> PipelineResult<CapturedOutput> {
        match self {
            CommandOutcome::Succeeded(output) => Ok(output),
            CommandOutcome::Failed(failure) => Err(PipelineError::CommandFailed {
                stage,
                command: failure.command,
                message: failure.stderr.trim().to_string(),
                exit_code: failure.exit_code,
            }),
        }
    }
}

/// Whether captured streams are echoed to the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    /// Print stdout and stderr after the command exits
    Show,
    /// Keep output for the caller only
    Capture,
}

/// Runs external programs through the injected [`CommandExecutor`]
pub struct CommandRunner {
    executor: Arc<dyn CommandExecutor>,
    output: Arc<dyn Output>,
}

impl CommandRunner {
    pub fn new(executor: Arc<dyn CommandExecutor>, output: Arc<dyn Output>) -> Self {
        Self { executor, output }
    }

    /// Run a command and echo its output
    pub fn run(&self, program: &str, args: &[&str], working_dir: Option<&Path>) -> CommandOutcome {
        self.run_with(program, args, working_dir, Echo::Show)
    }

    /// Run a command without printing its output
    pub fn run_captured(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
    ) -> CommandOutcome {
        self.run_with(program, args, working_dir, Echo::Capture)
    }

    pub fn run_with(
        &self,
        program: &str,
        args: &[&str],
        working_dir: Option<&Path>,
        echo: Echo,
    ) -> CommandOutcome {
        let command = render_command(program, args);
        let working_dir = working_dir.unwrap_or_else(|| Path::new("."));

        tracing::info!("Running command: {}", command);

        let output = match self.executor.execute(program, args, working_dir) {
            Ok(output) => output,
            Err(err) => {
                let message = format!("{:#}", err);
                tracing::error!("Error running command {}: {}", command, message);
                return CommandOutcome::Failed(CommandFailure {
                    command,
                    exit_code: None,
                    stdout: String::new(),
                    stderr: message,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if echo == Echo::Show {
            if !stdout.trim().is_empty() {
                self.output.dimmed(stdout.trim_end());
            }
            if !stderr.trim().is_empty() {
                self.output.warning(stderr.trim_end());
            }
        }

        if !output.status.success() {
            match output.status.code() {
                Some(code) => tracing::error!("Command failed with exit code {}", code),
                None => tracing::error!("Command terminated by signal"),
            }
            if !stderr.trim().is_empty() {
                tracing::error!("Error: {}", stderr.trim());
            }

            return CommandOutcome::Failed(CommandFailure {
                command,
                exit_code: output.status.code(),
                stdout,
                stderr,
            });
        }

        tracing::debug!("Command succeeded: {}", command);
        CommandOutcome::Succeeded(CapturedOutput { stdout, stderr })
    }
}

/// Render a command line for logs and diagnostics
pub fn render_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
