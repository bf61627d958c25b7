use std::fmt;
use std::path::PathBuf;

use crate::config::STATE_EXTENSION;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::import::discovery::discover_files;
use crate::import::options::ImportOptions;
use crate::import::state_parser::{StateFileRecord, StateParser};
use crate::traits::{FileSystem, Output};

/// Comment lines written at the top of the directive file
pub const DIRECTIVE_HEADER: [&str; 2] = [
    "# Import statements for Terraformer-imported resources",
    "# Run: terraform init && terraform plan to verify imports",
];

/// One `import` line binding a configuration address to a live resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDirective {
    pub resource_type: String,
    pub resource_name: String,
    pub resource_id: String,
}

impl fmt::Display for ImportDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "import {}.{} \"{}\"",
            self.resource_type, self.resource_name, self.resource_id
        )
    }
}

/// A state file that could not be used
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveWarning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for DirectiveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectiveReport {
    pub file: PathBuf,
    pub state_files: usize,
    pub directives: Vec<ImportDirective>,
    /// Instances dropped for a missing or empty type, name or id
    pub skipped: usize,
    pub warnings: Vec<DirectiveWarning>,
}

/// Directives for every usable instance, in resource then instance order
///
/// Returns the directives and the number of instances skipped.
pub fn collect_directives(record: &StateFileRecord) -> (Vec<ImportDirective>, usize) {
    let mut directives = Vec::new();
    let mut skipped = 0;

    for resource in &record.resources {
        for instance in &resource.instances {
            match (
                non_empty(resource.resource_type.as_deref()),
                non_empty(resource.name.as_deref()),
                non_empty(instance.id.as_deref()),
            ) {
                (Some(resource_type), Some(resource_name), Some(resource_id)) => {
                    directives.push(ImportDirective {
                        resource_type: resource_type.to_string(),
                        resource_name: resource_name.to_string(),
                        resource_id: resource_id.to_string(),
                    })
                }
                _ => skipped += 1,
            }
        }
    }

    (directives, skipped)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Header plus one line per directive, newline-terminated
pub fn render_directives(directives: &[ImportDirective]) -> String {
    let mut content = String::new();
    for line in DIRECTIVE_HEADER {
        content.push_str(line);
        content.push('\n');
    }
    for directive in directives {
        content.push_str(&directive.to_string());
        content.push('\n');
    }
    content
}

/// Scans state files in the import output and writes the directive file
pub struct DirectiveGenerator<'a> {
    fs: &'a dyn FileSystem,
    output: &'a dyn Output,
}

impl<'a> DirectiveGenerator<'a> {
    pub fn new(fs: &'a dyn FileSystem, output: &'a dyn Output) -> Self {
        Self { fs, output }
    }

    /// Write `<target>/import.tf`, replacing any previous copy
    ///
    /// Unreadable or malformed state files become warnings; only a failure
    /// to discover files or write the result is an error.
    pub fn generate(&self, options: &ImportOptions) -> PipelineResult<DirectiveReport> {
        self.output.info("Generating import statements...");

        let state_files = discover_files(self.fs, &options.output_dir, STATE_EXTENSION)
            .map_err(|e| PipelineError::filesystem(Stage::Directives, e))?;

        let mut report = DirectiveReport {
            file: options.directive_file(),
            state_files: state_files.len(),
            ..Default::default()
        };

        for path in state_files {
            let record = match self
                .fs
                .read_to_string(&path)
                .and_then(|content| StateParser::parse(&content))
            {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Skipping state file {}: {:#}", path.display(), e);
                    report.warnings.push(DirectiveWarning {
                        path,
                        message: format!("{:#}", e),
                    });
                    continue;
                }
            };

            let (directives, skipped) = collect_directives(&record);
            tracing::debug!(
                "{}: {} directives, {} skipped",
                path.display(),
                directives.len(),
                skipped
            );
            report.directives.extend(directives);
            report.skipped += skipped;
        }

        self.fs
            .create_dir_all(&options.target_dir)
            .and_then(|_| {
                self.fs
                    .write(&report.file, &render_directives(&report.directives))
            })
            .map_err(|e| PipelineError::filesystem(Stage::Directives, e))?;

        self.output.success(&format!(
            "Generated {} import statements in {}",
            report.directives.len(),
            report.file.display()
        ));

        Ok(report)
    }
}
