use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Output};

/// Trait for spawning external programs, allowing for mocking in tests
pub trait CommandExecutor: Send + Sync {
    /// Execute a program with arguments and wait for it to exit
    ///
    /// Returns an error only when the program could not be started.
    fn execute(&self, program: &str, args: &[&str], working_dir: &Path) -> Result<Output>;
}

/// Real command executor using std::process::Command
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn execute(&self, program: &str, args: &[&str], working_dir: &Path) -> Result<Output> {
        Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .output()
            .with_context(|| format!("Failed to start '{}'", program))
    }
}

/// Mock command executor for testing
#[cfg(test)]
pub struct MockCommandExecutor {
    /// Pre-configured outputs for commands, consumed in order per program
    outputs: std::sync::Mutex<Vec<MockCommandResult>>,
    /// Every invocation as (program, args, working_dir)
    calls: std::sync::Mutex<Vec<(String, Vec<String>, std::path::PathBuf)>>,
}

#[cfg(test)]
#[derive(Clone, Debug)]
pub struct MockCommandResult {
    pub command: String,
    /// When set, only matches invocations whose first argument is this value
    pub first_arg: Option<String>,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Simulates a program that cannot be started
    pub spawn_error: Option<String>,
}

#[cfg(test)]
impl MockCommandResult {
    pub fn ok(command: &str, stdout: &str) -> Self {
        Self {
            command: command.to_string(),
            first_arg: None,
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
            spawn_error: None,
        }
    }

    pub fn failed(command: &str, exit_code: i32, stderr: &str) -> Self {
        Self {
            command: command.to_string(),
            first_arg: None,
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
            spawn_error: None,
        }
    }

    pub fn not_found(command: &str) -> Self {
        Self {
            command: command.to_string(),
            first_arg: None,
            exit_code: -1,
            stdout: String::new(),
            stderr: String::new(),
            spawn_error: Some(format!("No such file or directory: {}", command)),
        }
    }

    pub fn when_first_arg(mut self, arg: &str) -> Self {
        self.first_arg = Some(arg.to_string());
        self
    }

    fn matches(&self, command: &str, args: &[&str]) -> bool {
        self.command == command
            && self
                .first_arg
                .as_deref()
                .is_none_or(|expected| args.first() == Some(&expected))
    }
}

#[cfg(test)]
impl MockCommandExecutor {
    pub fn new() -> Self {
        Self {
            outputs: std::sync::Mutex::new(Vec::new()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn with_outputs(outputs: Vec<MockCommandResult>) -> Self {
        Self {
            outputs: std::sync::Mutex::new(outputs),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn add_output(&self, output: MockCommandResult) {
        let mut outputs = self.outputs.lock().unwrap();
        outputs.push(output);
    }

    /// All recorded invocations, in order
    pub fn calls(&self) -> Vec<(String, Vec<String>, std::path::PathBuf)> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded argument lists for one program
    pub fn calls_for(&self, program: &str) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _, _)| p == program)
            .map(|(_, args, _)| args.clone())
            .collect()
    }
}

#[cfg(test)]
impl Default for MockCommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl CommandExecutor for MockCommandExecutor {
    fn execute(&self, program: &str, args: &[&str], working_dir: &Path) -> Result<Output> {
        self.calls.lock().unwrap().push((
            program.to_string(),
            args.iter().map(|a| a.to_string()).collect(),
            working_dir.to_path_buf(),
        ));

        let mut outputs = self.outputs.lock().unwrap();

        if let Some(index) = outputs.iter().position(|r| r.matches(program, args)) {
            let mock_result = outputs.remove(index);

            if let Some(message) = mock_result.spawn_error {
                anyhow::bail!(message);
            }

            return Ok(Output {
                status: create_exit_status(mock_result.exit_code),
                stdout: mock_result.stdout.into_bytes(),
                stderr: mock_result.stderr.into_bytes(),
            });
        }

        // Default: successful empty output
        Ok(Output {
            status: create_exit_status(0),
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }
}

#[cfg(test)]
fn create_exit_status(code: i32) -> std::process::ExitStatus {
    // ExitStatus can't be constructed directly; the raw unix wait status keeps
    // the exit code in the second byte
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        std::process::ExitStatus::from_raw((code & 0xff) << 8)
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(code as u32)
    }
}
