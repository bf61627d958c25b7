//! Terminal reporting for the import run

use std::path::PathBuf;

use crate::config::CONFIG_EXTENSION;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::import::discovery::discover_files;
use crate::import::{DirectiveReport, ImportOptions, ReconcileReport};
use crate::traits::{FileSystem, Output};

/// Outcome of a completed run
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Configuration files found in the import output
    pub generated: Vec<PathBuf>,
    pub reconcile: ReconcileReport,
    /// `None` when nothing was reconciled and generation was skipped
    pub directives: Option<DirectiveReport>,
    /// Where `--install` placed the import tool
    pub installed: Option<PathBuf>,
    pub initialized: bool,
}

pub struct Reporter<'a> {
    fs: &'a dyn FileSystem,
    output: &'a dyn Output,
}

impl<'a> Reporter<'a> {
    pub fn new(fs: &'a dyn FileSystem, output: &'a dyn Output) -> Self {
        Self { fs, output }
    }

    /// List configuration files under the output directory, sorted by path
    pub fn list_generated_files(&self, options: &ImportOptions) -> PipelineResult<Vec<PathBuf>> {
        let mut files = discover_files(self.fs, &options.output_dir, CONFIG_EXTENSION)
            .map_err(|e| PipelineError::filesystem(Stage::Listing, e))?;
        files.sort();

        if files.is_empty() {
            self.output.warning(&format!(
                "No Terraform files found in {}",
                options.output_dir.display()
            ));
            return Ok(files);
        }

        self.output.section("Generated Terraform files");
        for file in &files {
            self.output.list_item(&file.display().to_string());
        }
        self.output
            .info(&format!("Total: {} Terraform files", files.len()));

        Ok(files)
    }

    /// Final summary and next steps
    pub fn summary(&self, options: &ImportOptions, summary: &ImportSummary, terraform_bin: &str) {
        self.output.section("Import summary");

        if let Some(path) = &summary.installed {
            self.output
                .key_value("Installed Terraformer", &path.display().to_string());
        }
        self.output
            .key_value("Generated files", &summary.generated.len().to_string());
        self.output.key_value(
            "Copied files",
            &format!(
                "{} to {}",
                summary.reconcile.copied.len(),
                options.imported_dir().display()
            ),
        );
        if !summary.reconcile.overwritten.is_empty() {
            self.output.key_value(
                "Overwritten files",
                &summary.reconcile.overwritten.len().to_string(),
            );
        }

        let Some(directives) = &summary.directives else {
            self.output
                .warning("No import statements were generated because no files were copied");
            return;
        };

        self.output
            .key_value("State files scanned", &directives.state_files.to_string());
        self.output.key_value(
            "Import statements",
            &format!(
                "{} in {}",
                directives.directives.len(),
                directives.file.display()
            ),
        );
        if directives.skipped > 0 {
            self.output.key_value(
                "Skipped instances",
                &format!("{} (missing type, name or id)", directives.skipped),
            );
        }
        for warning in &directives.warnings {
            self.output
                .warning(&format!("Unusable state file {}", warning));
        }

        let target = options.target_dir.display();
        let verify = if summary.initialized {
            format!("cd {} && {} plan", target, terraform_bin)
        } else {
            format!("cd {} && {} init && {} plan", target, terraform_bin, terraform_bin)
        };

        self.output.next_steps(&[
            format!(
                "Review the imported configuration in {}",
                options.imported_dir().display()
            ),
            format!("Verify the import statements: {}", verify),
            "Adapt the imported code to your module structure and naming".to_string(),
        ]);
    }
}
