use std::path::Path;

use crate::error::PipelineResult;

/// Trait for Infrastructure as Code executors (Terraform, OpenTofu)
pub trait IacExecutor {
    /// Check if the executor is installed and available
    /// Runs the version command; a failure is reported as an error
    fn check_installed(&self) -> PipelineResult<()>;

    /// Initialize the executor in the working directory
    /// For Terraform this runs 'terraform init' so the import blocks can be planned
    fn init(&self, working_dir: &Path) -> PipelineResult<()>;

    /// Get the name of this executor (e.g., "terraform", "tofu")
    fn get_name(&self) -> &str;
}
