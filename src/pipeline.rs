//! The import run: a strict linear sequence that stops at the first failure
//!
//! Preflight (with optional install), credentials, invocation, listing,
//! reconciliation, directive generation and optional initialization. Nothing
//! is retried and copied files are not rolled back; re-running is the
//! recovery path.

use crate::config::ToolConfig;
use crate::context::Context;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::iac::{IacExecutor, TerraformExecutor};
use crate::import::{DirectiveGenerator, ImportInvocation, ImportOptions, Reconciler};
use crate::preflight::{CredentialCheck, Installer, ToolCheck};
use crate::report::{ImportSummary, Reporter};
use crate::runner::CommandRunner;

/// Switches that change which stages run
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineSettings {
    /// Install the import tool when it is missing
    pub install: bool,
    pub skip_credential_check: bool,
    /// Run `terraform init` in the target directory afterwards
    pub init: bool,
}

pub struct ImportPipeline<'a> {
    ctx: &'a Context,
    config: &'a ToolConfig,
    runner: CommandRunner,
    settings: PipelineSettings,
}

impl<'a> ImportPipeline<'a> {
    pub fn new(ctx: &'a Context, config: &'a ToolConfig, settings: PipelineSettings) -> Self {
        Self {
            ctx,
            config,
            runner: CommandRunner::new(ctx.command.clone(), ctx.output.clone()),
            settings,
        }
    }

    pub fn run(&self, options: &ImportOptions) -> PipelineResult<ImportSummary> {
        let mut summary = ImportSummary {
            installed: self.preflight()?,
            ..Default::default()
        };

        if self.settings.skip_credential_check {
            self.ctx
                .output
                .warning("Skipping AWS credential verification");
        } else {
            CredentialCheck::new(
                &self.runner,
                self.ctx.output.as_ref(),
                self.ctx.env.as_ref(),
                self.config,
            )
            .verify_credentials()?;
        }

        ImportInvocation::new(self.ctx, &self.runner, self.config).run(options)?;

        let reporter = Reporter::new(self.ctx.fs.as_ref(), self.ctx.output.as_ref());
        summary.generated = reporter.list_generated_files(options)?;

        summary.reconcile =
            Reconciler::new(self.ctx.fs.as_ref(), self.ctx.output.as_ref()).reconcile(options)?;

        if summary.reconcile.copied_any() {
            summary.directives = Some(
                DirectiveGenerator::new(self.ctx.fs.as_ref(), self.ctx.output.as_ref())
                    .generate(options)?,
            );

            if self.settings.init {
                self.initialize(options)?;
                summary.initialized = true;
            }
        } else {
            tracing::info!("Nothing reconciled, skipping directive generation");
        }

        reporter.summary(options, &summary, &self.config.terraform_bin);
        Ok(summary)
    }

    /// Make sure the import tool answers, installing it first when asked
    fn preflight(&self) -> PipelineResult<Option<std::path::PathBuf>> {
        self.ctx.output.section("Checking environment");

        let installed = if self.settings.install {
            Installer::new(self.ctx, &self.runner, self.config).install_tool()?
        } else {
            None
        };

        let available =
            ToolCheck::new(&self.runner, self.ctx.output.as_ref(), self.config)
                .verify_tool_installed();

        if !available {
            return Err(PipelineError::ToolNotInstalled {
                tool: self.config.terraformer_bin.clone(),
            });
        }

        Ok(installed)
    }

    fn initialize(&self, options: &ImportOptions) -> PipelineResult<()> {
        self.ctx
            .fs
            .create_dir_all(&options.target_dir)
            .map_err(|e| PipelineError::filesystem(Stage::Initialization, e))?;

        let executor = TerraformExecutor::new(&self.runner, &self.config.terraform_bin);
        executor.check_installed()?;

        self.ctx.output.info(&format!(
            "Running {} init in {}",
            executor.get_name(),
            options.target_dir.display()
        ));
        executor.init(&options.target_dir)?;
        self.ctx.output.success("Initialization complete");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{StateBuilder, TestHarness, credentialed_env};
    use crate::traits::{FileSystem, MockArtifactFetcher, MockCommandResult, MockEnvironment};
    use std::path::{Path, PathBuf};

    const IDENTITY: &str = r#"{"Account":"123456789012","Arn":"arn:aws:iam::123456789012:user/ci"}"#;

    fn options() -> ImportOptions {
        ImportOptions::new("vpc,s3", Path::new("/out"), Path::new("/project")).unwrap()
    }

    fn harness() -> TestHarness {
        let harness = TestHarness::with_env(credentialed_env());
        harness
            .command
            .add_output(MockCommandResult::ok("aws", IDENTITY));
        harness
    }

    fn seed_output(harness: &TestHarness) {
        harness
            .file("/out/aws/vpc/vpc.tf", "resource \"aws_vpc\" \"main\" {}")
            .file(
                "/out/aws/vpc/terraform.tfstate",
                &StateBuilder::new()
                    .resource("aws_vpc", "main", &["vpc-1"])
                    .build(),
            )
            .file("/out/aws/s3/s3.tf", "resource \"aws_s3_bucket\" \"logs\" {}")
            .file(
                "/out/aws/s3/terraform.tfstate",
                &StateBuilder::new()
                    .resource("aws_s3_bucket", "logs", &["logs-bucket"])
                    .build(),
            );
    }

    #[test]
    fn test_happy_path_writes_imported_tree_and_directives() {
        let harness = harness();
        seed_output(&harness);
        let config = ToolConfig::default();

        let summary = ImportPipeline::new(&harness.ctx, &config, PipelineSettings::default())
            .run(&options())
            .unwrap();

        assert_eq!(summary.generated.len(), 2);
        assert_eq!(summary.reconcile.copied.len(), 2);
        assert!(harness.fs.has_file(Path::new("/project/imported/aws/vpc/vpc.tf")));

        let directives = harness
            .fs
            .get_file_contents(Path::new("/project/import.tf"))
            .unwrap();
        assert_eq!(
            directives.lines().skip(2).collect::<Vec<_>>(),
            vec![
                "import aws_s3_bucket.logs \"logs-bucket\"",
                "import aws_vpc.main \"vpc-1\"",
            ]
        );

        let programs: Vec<String> = harness
            .command
            .calls()
            .into_iter()
            .map(|(program, _, _)| program)
            .collect();
        assert_eq!(programs, vec!["terraformer", "aws", "terraformer"]);
    }

    #[test]
    fn test_missing_tool_without_install_stops_early() {
        let harness = harness();
        harness
            .command
            .add_output(MockCommandResult::not_found("terraformer").when_first_arg("version"));
        let config = ToolConfig::default();

        let err = ImportPipeline::new(&harness.ctx, &config, PipelineSettings::default())
            .run(&options())
            .unwrap_err();

        assert!(matches!(err, PipelineError::ToolNotInstalled { .. }));
        assert!(harness.command.calls_for("aws").is_empty());
        assert!(!harness.fs.is_dir(Path::new("/out")));
    }

    #[test]
    fn test_install_then_continue() {
        let env = credentialed_env().with_privileged(true);
        let fetcher = MockArtifactFetcher::new().with_body(
            "https://github.com/GoogleCloudPlatform/terraformer/releases/download/0.8.24/terraformer-aws-linux-amd64",
            b"binary",
        );
        let harness = TestHarness::with(env, fetcher);
        harness
            .command
            .add_output(MockCommandResult::failed("which", 1, ""));
        harness
            .command
            .add_output(MockCommandResult::ok("aws", IDENTITY));
        seed_output(&harness);
        let config = ToolConfig::default();
        let settings = PipelineSettings {
            install: true,
            ..Default::default()
        };

        let summary = ImportPipeline::new(&harness.ctx, &config, settings)
            .run(&options())
            .unwrap();

        assert_eq!(
            summary.installed,
            Some(PathBuf::from("/usr/local/bin/terraformer"))
        );
        assert!(harness.fs.is_executable(Path::new("/usr/local/bin/terraformer")));
    }

    #[test]
    fn test_missing_credentials_stop_before_import() {
        let harness = TestHarness::new();
        let config = ToolConfig::default();

        let err = ImportPipeline::new(&harness.ctx, &config, PipelineSettings::default())
            .run(&options())
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Credentials);
        assert_eq!(harness.command.calls_for("terraformer").len(), 1);
    }

    #[test]
    fn test_skip_credential_check() {
        let harness = TestHarness::with_env(MockEnvironment::new());
        seed_output(&harness);
        let config = ToolConfig::default();
        let settings = PipelineSettings {
            skip_credential_check: true,
            ..Default::default()
        };

        ImportPipeline::new(&harness.ctx, &config, settings)
            .run(&options())
            .unwrap();

        assert!(harness.command.calls_for("aws").is_empty());
        assert!(harness.fs.has_file(Path::new("/project/import.tf")));
    }

    #[test]
    fn test_zero_files_skips_directives() {
        let harness = harness();
        harness.file(
            "/out/aws/vpc/terraform.tfstate",
            &StateBuilder::new().resource("aws_vpc", "main", &["vpc-1"]).build(),
        );
        let config = ToolConfig::default();

        let summary = ImportPipeline::new(&harness.ctx, &config, PipelineSettings::default())
            .run(&options())
            .unwrap();

        assert!(summary.directives.is_none());
        assert!(!harness.fs.has_file(Path::new("/project/import.tf")));
    }

    #[test]
    fn test_import_failure_halts_before_reconciliation() {
        let harness = harness();
        seed_output(&harness);
        harness.command.add_output(
            MockCommandResult::failed("terraformer", 1, "UnauthorizedOperation")
                .when_first_arg("import"),
        );
        let config = ToolConfig::default();

        let err = ImportPipeline::new(&harness.ctx, &config, PipelineSettings::default())
            .run(&options())
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Invocation);
        assert!(!harness.fs.is_dir(Path::new("/project/imported")));
    }

    #[test]
    fn test_init_runs_terraform_in_target_dir() {
        let harness = harness();
        seed_output(&harness);
        let config = ToolConfig::default();
        let settings = PipelineSettings {
            init: true,
            ..Default::default()
        };

        let summary = ImportPipeline::new(&harness.ctx, &config, settings)
            .run(&options())
            .unwrap();

        assert!(summary.initialized);
        let init = harness
            .command
            .calls()
            .into_iter()
            .find(|(program, args, _)| program == "terraform" && args == &["init".to_string()])
            .unwrap();
        assert_eq!(init.2, PathBuf::from("/project"));
    }

    #[test]
    fn test_init_failure_is_fatal() {
        let harness = harness();
        seed_output(&harness);
        harness
            .command
            .add_output(MockCommandResult::failed("terraform", 1, "backend error").when_first_arg("init"));
        let config = ToolConfig::default();
        let settings = PipelineSettings {
            init: true,
            ..Default::default()
        };

        let err = ImportPipeline::new(&harness.ctx, &config, settings)
            .run(&options())
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Initialization);
        assert!(harness.fs.has_file(Path::new("/project/import.tf")));
    }
}
