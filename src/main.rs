mod config;
mod context;
mod error;
mod iac;
mod import;
mod output;
mod pipeline;
mod preflight;
mod report;
mod runner;
#[cfg(test)]
mod test_helpers;
mod traits;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use config::ToolConfig;
use context::Context;
use error::PipelineResult;
use import::ImportOptions;
use pipeline::{ImportPipeline, PipelineSettings};

#[derive(Parser)]
#[command(name = "terraformer-import")]
#[command(about = "Bulk-import existing AWS infrastructure with Terraformer and fold it into a Terraform project", long_about = None)]
#[command(version)]
struct Cli {
    /// Comma-separated resources to import (e.g. vpc,subnet,s3)
    #[arg(long)]
    resources: String,

    /// Directory Terraformer writes its output to
    #[arg(long, default_value = "terraformer-output")]
    output_dir: PathBuf,

    /// Terraform project receiving imported/ and import.tf
    #[arg(long, default_value = "terraform")]
    terraform_dir: PathBuf,

    /// AWS region (defaults to AWS_REGION)
    #[arg(long)]
    region: Option<String>,

    /// AWS profile
    #[arg(long)]
    profile: Option<String>,

    /// Terraformer filter expressions, passed through as --filter flags
    #[arg(long, num_args = 1..)]
    filters: Vec<String>,

    /// Only copy files whose content matches one of these regexes
    #[arg(long = "resource-filter", num_args = 1..)]
    resource_filter: Vec<String>,

    /// Install Terraformer if it is not found
    #[arg(long)]
    install: bool,

    /// Do not verify AWS credentials before importing
    #[arg(long)]
    skip_credential_check: bool,

    /// Run terraform init in the project directory afterwards
    #[arg(long)]
    init: bool,

    /// Tool configuration file (defaults to ./.terraformer-import.yaml)
    #[arg(long, env = "TERRAFORMER_IMPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "terraformer_import=debug"
    } else {
        "terraformer_import=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli, ctx: &Context) -> PipelineResult<()> {
    let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = ToolConfig::load(ctx.fs.as_ref(), cli.config.as_deref(), &working_dir)?;

    let options = ImportOptions::new(&cli.resources, &cli.output_dir, &cli.terraform_dir)?
        .with_region(cli.region)
        .with_profile(cli.profile)
        .with_filters(cli.filters)
        .with_resource_filters(&cli.resource_filter)?;

    let settings = PipelineSettings {
        install: cli.install,
        skip_credential_check: cli.skip_credential_check,
        init: cli.init,
    };

    ImportPipeline::new(ctx, &config, settings).run(&options)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = Context::new();

    match run(cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Import failed during {}: {}", err.stage(), err);
            ctx.output.error(&err.to_string());
            ctx.output
                .dimmed(&format!("Stopped during the {} stage", err.stage()));
            ExitCode::FAILURE
        }
    }
}
