use crate::config::{REGION_VAR, ToolConfig};
use crate::context::Context;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::import::options::ImportOptions;
use crate::runner::CommandRunner;
use crate::traits::Environment;

/// Layout the import tool writes: `<output>/<provider>/<service>/*.tf`
pub const PATH_PATTERN: &str = "{output}/{provider}/{service}";

/// Build the argument list for `terraformer import`
///
/// Flag order: resources, region, filters, profile, then the fixed
/// path-pattern/compact/output flags.
pub fn build_import_args(
    options: &ImportOptions,
    config: &ToolConfig,
    env: &dyn Environment,
) -> Vec<String> {
    let mut args = vec![
        "import".to_string(),
        config.provider.clone(),
        format!("--resources={}", options.resource_list()),
    ];

    let region = options
        .region
        .clone()
        .or_else(|| env.var(REGION_VAR).filter(|r| !r.is_empty()));
    if let Some(region) = region {
        args.push(format!("--regions={}", region));
    }

    for filter in &options.filters {
        args.push(format!("--filter={}", filter));
    }

    if let Some(profile) = &options.profile {
        args.push(format!("--profile={}", profile));
    }

    args.push(format!("--path-pattern={}", PATH_PATTERN));
    args.push("--compact".to_string());
    args.push(format!("--output={}", options.output_dir.display()));

    args
}

/// Runs the bulk import through the command runner
pub struct ImportInvocation<'a> {
    ctx: &'a Context,
    runner: &'a CommandRunner,
    config: &'a ToolConfig,
}

impl<'a> ImportInvocation<'a> {
    pub fn new(ctx: &'a Context, runner: &'a CommandRunner, config: &'a ToolConfig) -> Self {
        Self {
            ctx,
            runner,
            config,
        }
    }

    pub fn run(&self, options: &ImportOptions) -> PipelineResult<()> {
        self.ctx.output.info(&format!(
            "Importing AWS resources with Terraformer: {}",
            options.resource_list()
        ));

        self.ctx
            .fs
            .create_dir_all(&options.output_dir)
            .map_err(|e| PipelineError::filesystem(Stage::Invocation, e))?;

        let args = build_import_args(options, self.config, self.ctx.env.as_ref());
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        let result = self
            .runner
            .run(&self.config.terraformer_bin, &arg_refs, None)
            .into_stage(Stage::Invocation);

        match result {
            Ok(_) => {
                self.ctx.output.success(&format!(
                    "Successfully imported resources to {}",
                    options.output_dir.display()
                ));
                Ok(())
            }
            Err(err) => {
                self.ctx
                    .output
                    .error("Failed to import resources with Terraformer");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::TestHarness;
    use crate::traits::{FileSystem, MockCommandResult, MockEnvironment};
    use std::path::Path;

    fn options() -> ImportOptions {
        ImportOptions::new("vpc,subnet", Path::new("out"), Path::new("terraform")).unwrap()
    }

    #[test]
    fn test_minimal_command() {
        let args = build_import_args(&options(), &ToolConfig::default(), &MockEnvironment::new());

        assert_eq!(
            args,
            vec![
                "import",
                "aws",
                "--resources=vpc,subnet",
                "--path-pattern={output}/{provider}/{service}",
                "--compact",
                "--output=out",
            ]
        );
    }

    #[test]
    fn test_one_filter_flag_per_expression_in_order() {
        let filters = vec![
            "Name=tags.Environment;Value=staging".to_string(),
            "aws_vpc=vpc-123".to_string(),
            "Name=id;Value=subnet-1:subnet-2".to_string(),
        ];
        let options = options().with_filters(filters.clone());

        let args = build_import_args(&options, &ToolConfig::default(), &MockEnvironment::new());

        let filter_flags: Vec<&String> =
            args.iter().filter(|a| a.starts_with("--filter=")).collect();
        let expected: Vec<String> = filters.iter().map(|f| format!("--filter={}", f)).collect();
        assert_eq!(filter_flags, expected.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_explicit_region_wins_over_env() {
        let env = MockEnvironment::new().with_var("AWS_REGION", "us-east-1");
        let options = options().with_region(Some("eu-central-1".to_string()));

        let args = build_import_args(&options, &ToolConfig::default(), &env);

        assert!(args.contains(&"--regions=eu-central-1".to_string()));
        assert!(!args.contains(&"--regions=us-east-1".to_string()));
    }

    #[test]
    fn test_region_falls_back_to_env() {
        let env = MockEnvironment::new().with_var("AWS_REGION", "us-east-1");

        let args = build_import_args(&options(), &ToolConfig::default(), &env);

        assert_eq!(args[3], "--regions=us-east-1");
    }

    #[test]
    fn test_full_flag_order() {
        let env = MockEnvironment::new();
        let options = options()
            .with_region(Some("us-west-2".to_string()))
            .with_filters(vec!["f1".to_string()])
            .with_profile(Some("prod".to_string()));

        let args = build_import_args(&options, &ToolConfig::default(), &env);

        assert_eq!(
            args,
            vec![
                "import",
                "aws",
                "--resources=vpc,subnet",
                "--regions=us-west-2",
                "--filter=f1",
                "--profile=prod",
                "--path-pattern={output}/{provider}/{service}",
                "--compact",
                "--output=out",
            ]
        );
    }

    #[test]
    fn test_run_creates_output_dir_and_invokes_tool() {
        let harness = TestHarness::new();
        let runner = harness.runner();
        let config = ToolConfig::default();

        ImportInvocation::new(&harness.ctx, &runner, &config)
            .run(&options())
            .unwrap();

        assert!(harness.fs.is_dir(Path::new("out")));
        assert_eq!(harness.command.calls_for("terraformer").len(), 1);
    }

    #[test]
    fn test_run_failure_is_fatal() {
        let harness = TestHarness::new();
        harness.command.add_output(MockCommandResult::failed(
            "terraformer",
            1,
            "AccessDenied",
        ));
        let runner = harness.runner();
        let config = ToolConfig::default();

        let err = ImportInvocation::new(&harness.ctx, &runner, &config)
            .run(&options())
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Invocation);
        assert_eq!(
            harness.output.get_errors(),
            vec!["Failed to import resources with Terraformer".to_string()]
        );
    }
}
