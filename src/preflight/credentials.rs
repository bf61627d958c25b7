use serde::Deserialize;

use crate::config::{REQUIRED_CREDENTIAL_VARS, ToolConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::runner::CommandRunner;
use crate::traits::{Environment, Output};

/// Subset of `aws sts get-caller-identity` we rely on
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallerIdentity {
    pub account: String,
    #[serde(default)]
    pub arn: Option<String>,
}

/// Names of required credential variables that are unset or empty, in order
pub fn missing_credential_vars(env: &dyn Environment) -> Vec<String> {
    REQUIRED_CREDENTIAL_VARS
        .iter()
        .filter(|name| env.var(name).is_none_or(|value| value.is_empty()))
        .map(|name| name.to_string())
        .collect()
}

/// Parse the caller-identity JSON; a missing account is malformed
pub fn parse_caller_identity(json: &str) -> PipelineResult<CallerIdentity> {
    let identity: CallerIdentity = serde_json::from_str(json).map_err(|e| {
        PipelineError::CredentialCheck(format!("Failed to parse AWS identity response: {}", e))
    })?;

    if identity.account.trim().is_empty() {
        return Err(PipelineError::CredentialCheck(
            "AWS identity response has an empty Account".to_string(),
        ));
    }

    Ok(identity)
}

/// Checks credential variables and performs an identity call
pub struct CredentialCheck<'a> {
    runner: &'a CommandRunner,
    output: &'a dyn Output,
    env: &'a dyn Environment,
    config: &'a ToolConfig,
}

impl<'a> CredentialCheck<'a> {
    pub fn new(
        runner: &'a CommandRunner,
        output: &'a dyn Output,
        env: &'a dyn Environment,
        config: &'a ToolConfig,
    ) -> Self {
        Self {
            runner,
            output,
            env,
            config,
        }
    }

    /// Verify credentials, returning the caller identity on success
    pub fn verify_credentials(&self) -> PipelineResult<CallerIdentity> {
        let missing = missing_credential_vars(self.env);

        if !missing.is_empty() {
            self.output.warning("Please set the following environment variables:");
            for var in &missing {
                self.output
                    .dimmed(&format!("  export {}=your_{}", var, var.to_lowercase()));
            }
            return Err(PipelineError::MissingCredentials(missing));
        }

        self.output.info("Verifying AWS credentials...");

        let outcome = self.runner.run_captured(
            &self.config.aws_bin,
            &["sts", "get-caller-identity", "--output", "json"],
            None,
        );

        if !outcome.success() {
            let reason = outcome.stderr().trim();
            return Err(PipelineError::CredentialCheck(if reason.is_empty() {
                "identity call failed".to_string()
            } else {
                reason.to_string()
            }));
        }

        let identity = parse_caller_identity(outcome.stdout())?;

        self.output.success(&format!(
            "AWS credentials verified. Using account: {}",
            identity.account
        ));
        if let Some(arn) = &identity.arn {
            tracing::debug!("Caller ARN: {}", arn);
        }

        Ok(identity)
    }
}
