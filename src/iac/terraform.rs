use super::executor::IacExecutor;
use crate::error::{PipelineResult, Stage};
use crate::runner::CommandRunner;
use std::path::Path;

/// Terraform-compatible executor driven through the command runner
///
/// The binary is configurable so OpenTofu (`tofu`) works the same way.
pub struct TerraformExecutor<'a> {
    runner: &'a CommandRunner,
    binary: &'a str,
}

impl<'a> TerraformExecutor<'a> {
    pub fn new(runner: &'a CommandRunner, binary: &'a str) -> Self {
        Self { runner, binary }
    }
}

impl IacExecutor for TerraformExecutor<'_> {
    fn check_installed(&self) -> PipelineResult<()> {
        self.runner
            .run_captured(self.binary, &["version"], None)
            .into_stage(Stage::Initialization)
            .map(|_| ())
    }

    fn init(&self, working_dir: &Path) -> PipelineResult<()> {
        self.runner
            .run(self.binary, &["init"], Some(working_dir))
            .into_stage(Stage::Initialization)
            .map(|_| ())
    }

    fn get_name(&self) -> &str {
        self.binary
    }
}
