//! Tool configuration.
//!
//! Defaults target the AWS build of Terraformer. A YAML file can override
//! binary names (e.g. `tofu` instead of `terraform`), the pinned release and
//! whether the tool check also performs a no-op listing call:
//!
//! ```yaml
//! terraformer_bin: /opt/bin/terraformer
//! terraform_bin: tofu
//! terraformer_version: "0.8.24"
//! strict_tool_check: true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::traits::FileSystem;

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = ".terraformer-import.yaml";

/// Extension of configuration files emitted by the import tool
pub const CONFIG_EXTENSION: &str = ".tf";

/// Extension of state files emitted by the import tool
pub const STATE_EXTENSION: &str = ".tfstate";

/// Subdirectory of the target directory receiving copied configuration
pub const IMPORTED_DIR: &str = "imported";

/// Generated directive file, relative to the target directory
pub const DIRECTIVE_FILE: &str = "import.tf";

/// Credential variables that must be present and non-empty
pub const REQUIRED_CREDENTIAL_VARS: [&str; 3] =
    ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_REGION"];

/// Variable consulted when no region is passed explicitly
pub const REGION_VAR: &str = "AWS_REGION";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Import tool binary
    pub terraformer_bin: String,
    /// Infrastructure CLI binary (terraform or tofu)
    pub terraform_bin: String,
    /// Cloud CLI binary
    pub aws_bin: String,
    /// Provider passed to `terraformer import`
    pub provider: String,
    /// Release installed by `--install`
    pub terraformer_version: String,
    /// Base URL for release downloads; `/<version>/<artifact>` is appended
    pub release_base_url: String,
    /// Also require a successful `import <provider> list` during preflight
    pub strict_tool_check: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            terraformer_bin: "terraformer".to_string(),
            terraform_bin: "terraform".to_string(),
            aws_bin: "aws".to_string(),
            provider: "aws".to_string(),
            terraformer_version: "0.8.24".to_string(),
            release_base_url:
                "https://github.com/GoogleCloudPlatform/terraformer/releases/download".to_string(),
            strict_tool_check: false,
        }
    }
}

impl ToolConfig {
    /// Load configuration from an explicit path, or from
    /// [`DEFAULT_CONFIG_FILE`] in `working_dir` when present
    pub fn load(
        fs: &dyn FileSystem,
        explicit: Option<&Path>,
        working_dir: &Path,
    ) -> PipelineResult<Self> {
        let path: PathBuf = match explicit {
            Some(path) => {
                if !fs.is_file(path) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => {
                let candidate = working_dir.join(DEFAULT_CONFIG_FILE);
                if !fs.is_file(&candidate) {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        tracing::debug!("Loading configuration from {}", path.display());

        let content = fs
            .read_to_string(&path)
            .map_err(|e| PipelineError::filesystem(crate::error::Stage::Configuration, e))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML; an empty document yields the defaults
    pub fn from_yaml(content: &str) -> PipelineResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: ToolConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> PipelineResult<()> {
        let required = [
            ("terraformer_bin", &self.terraformer_bin),
            ("terraform_bin", &self.terraform_bin),
            ("aws_bin", &self.aws_bin),
            ("provider", &self.provider),
            ("terraformer_version", &self.terraformer_version),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(PipelineError::InvalidConfig(format!(
                    "'{}' cannot be empty",
                    field
                )));
            }
        }

        Ok(())
    }
}
