use std::fmt;

/// Pipeline stage a failure originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    Preflight,
    Install,
    Credentials,
    Invocation,
    Listing,
    Reconciliation,
    Directives,
    Initialization,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::Preflight => "preflight",
            Stage::Install => "install",
            Stage::Credentials => "credentials",
            Stage::Invocation => "import",
            Stage::Listing => "listing",
            Stage::Reconciliation => "reconciliation",
            Stage::Directives => "directive generation",
            Stage::Initialization => "initialization",
        };
        f.write_str(name)
    }
}

/// Error types for the import pipeline
#[derive(Debug)]
pub enum PipelineError {
    /// The import tool is missing and installation was not requested
    ToolNotInstalled { tool: String },

    /// Host OS/architecture has no published release artifact
    UnsupportedPlatform { os: String, arch: String },

    /// Download or placement of the import tool failed
    InstallFailed(String),

    /// Required credential variables are unset or empty
    MissingCredentials(Vec<String>),

    /// The identity check against the cloud provider failed
    CredentialCheck(String),

    /// An external command exited non-zero or could not be started
    CommandFailed {
        stage: Stage,
        command: String,
        message: String,
        exit_code: Option<i32>,
    },

    /// File system operation failed
    FileSystem { stage: Stage, message: String },

    /// Invalid configuration or argument
    InvalidConfig(String),
}

impl PipelineError {
    /// Stage the failure originated from
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::ToolNotInstalled { .. } => Stage::Preflight,
            PipelineError::UnsupportedPlatform { .. } | PipelineError::InstallFailed(_) => {
                Stage::Install
            }
            PipelineError::MissingCredentials(_) | PipelineError::CredentialCheck(_) => {
                Stage::Credentials
            }
            PipelineError::CommandFailed { stage, .. } | PipelineError::FileSystem { stage, .. } => {
                *stage
            }
            PipelineError::InvalidConfig(_) => Stage::Configuration,
        }
    }

    /// Wrap a filesystem error, keeping the full context chain
    pub fn filesystem(stage: Stage, err: anyhow::Error) -> Self {
        PipelineError::FileSystem {
            stage,
            message: format!("{:#}", err),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::ToolNotInstalled { tool } => {
                write!(f, "{} is not installed or not in PATH", tool)
            }
            PipelineError::UnsupportedPlatform { os, arch } => {
                write!(f, "Unsupported platform: {}/{}", os, arch)
            }
            PipelineError::InstallFailed(msg) => {
                write!(f, "Installation failed: {}", msg)
            }
            PipelineError::MissingCredentials(vars) => {
                write!(f, "Missing AWS environment variables: {}", vars.join(", "))
            }
            PipelineError::CredentialCheck(msg) => {
                write!(f, "Failed to verify AWS credentials: {}", msg)
            }
            PipelineError::CommandFailed {
                stage,
                command,
                message,
                exit_code,
            } => {
                write!(f, "Command '{}' failed during {}", command, stage)?;

                if let Some(code) = exit_code {
                    write!(f, " (exit code {})", code)?;
                }

                if message.is_empty() {
                    Ok(())
                } else {
                    write!(f, ": {}", message)
                }
            }
            PipelineError::FileSystem { stage, message } => {
                write!(f, "File system error during {}: {}", stage, message)
            }
            PipelineError::InvalidConfig(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<serde_yaml::Error> for PipelineError {
    fn from(err: serde_yaml::Error) -> Self {
        PipelineError::InvalidConfig(err.to_string())
    }
}

impl From<regex::Error> for PipelineError {
    fn from(err: regex::Error) -> Self {
        PipelineError::InvalidConfig(err.to_string())
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_message_lists_variables() {
        let err = PipelineError::MissingCredentials(vec![
            "AWS_ACCESS_KEY_ID".to_string(),
            "AWS_REGION".to_string(),
        ]);

        assert_eq!(
            err.to_string(),
            "Missing AWS environment variables: AWS_ACCESS_KEY_ID, AWS_REGION"
        );
        assert_eq!(err.stage(), Stage::Credentials);
    }

    #[test]
    fn test_command_failed_message() {
        let err = PipelineError::CommandFailed {
            stage: Stage::Invocation,
            command: "terraformer import aws".to_string(),
            message: "boom".to_string(),
            exit_code: Some(2),
        };

        assert_eq!(
            err.to_string(),
            "Command 'terraformer import aws' failed during import (exit code 2): boom"
        );
        assert_eq!(err.stage(), Stage::Invocation);
    }

    #[test]
    fn test_filesystem_error_keeps_context() {
        let source = anyhow::anyhow!("permission denied").context("Failed to copy a to b");
        let err = PipelineError::filesystem(Stage::Reconciliation, source);

        assert_eq!(
            err.to_string(),
            "File system error during reconciliation: Failed to copy a to b: permission denied"
        );
    }
}
