use std::path::PathBuf;

use crate::config::CONFIG_EXTENSION;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::import::discovery::discover_files;
use crate::import::options::ImportOptions;
use crate::traits::{FileSystem, Output};

/// What the copy into `<target>/imported` did
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconcileReport {
    /// Copied files, relative to the output directory
    pub copied: Vec<PathBuf>,
    /// Subset of `copied` that replaced an existing destination file
    pub overwritten: Vec<PathBuf>,
    /// Files excluded because no resource filter matched their content
    pub filtered_out: Vec<PathBuf>,
}

impl ReconcileReport {
    pub fn copied_any(&self) -> bool {
        !self.copied.is_empty()
    }
}

/// Mirrors configuration files from the import output into the project
pub struct Reconciler<'a> {
    fs: &'a dyn FileSystem,
    output: &'a dyn Output,
}

impl<'a> Reconciler<'a> {
    pub fn new(fs: &'a dyn FileSystem, output: &'a dyn Output) -> Self {
        Self { fs, output }
    }

    /// Copy every configuration file to `<target>/imported/<relative path>`
    ///
    /// Sources are left untouched. Existing destination files are replaced
    /// and reported as warnings.
    pub fn reconcile(&self, options: &ImportOptions) -> PipelineResult<ReconcileReport> {
        let imported_dir = options.imported_dir();
        self.output.info(&format!(
            "Copying resources from {} to {}...",
            options.output_dir.display(),
            imported_dir.display()
        ));

        let files = discover_files(self.fs, &options.output_dir, CONFIG_EXTENSION)
            .map_err(|e| PipelineError::filesystem(Stage::Reconciliation, e))?;

        let mut report = ReconcileReport::default();

        for source in files {
            let relative = source
                .strip_prefix(&options.output_dir)
                .map(|p| p.to_path_buf())
                .map_err(|_| PipelineError::FileSystem {
                    stage: Stage::Reconciliation,
                    message: format!(
                        "{} is outside {}",
                        source.display(),
                        options.output_dir.display()
                    ),
                })?;

            if !options.resource_filters.is_empty() {
                let content = self
                    .fs
                    .read_to_string(&source)
                    .map_err(|e| PipelineError::filesystem(Stage::Reconciliation, e))?;

                if !options
                    .resource_filters
                    .iter()
                    .any(|pattern| pattern.is_match(&content))
                {
                    tracing::debug!("Skipping {} (no resource filter matched)", source.display());
                    report.filtered_out.push(relative);
                    continue;
                }
            }

            let destination = imported_dir.join(&relative);
            if let Some(parent) = destination.parent() {
                self.fs
                    .create_dir_all(parent)
                    .map_err(|e| PipelineError::filesystem(Stage::Reconciliation, e))?;
            }

            if self.fs.exists(&destination) {
                self.output.warning(&format!(
                    "Overwriting existing file {}",
                    destination.display()
                ));
                report.overwritten.push(relative.clone());
            }

            self.fs
                .copy_file(&source, &destination)
                .map_err(|e| PipelineError::filesystem(Stage::Reconciliation, e))?;
            tracing::info!("Copied {} to {}", source.display(), destination.display());

            report.copied.push(relative);
        }

        if report.copied_any() {
            self.output.success(&format!(
                "Copied {} Terraform files to {}",
                report.copied.len(),
                imported_dir.display()
            ));
        } else {
            self.output.warning(&format!(
                "No Terraform files were copied from {}",
                options.output_dir.display()
            ));
        }

        if !report.filtered_out.is_empty() {
            self.output.info(&format!(
                "{} files did not match any resource filter",
                report.filtered_out.len()
            ));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockFileSystem, MockOutput};
    use std::path::Path;

    fn options() -> ImportOptions {
        ImportOptions::new("vpc", Path::new("/out"), Path::new("/project")).unwrap()
    }

    #[test]
    fn test_preserves_relative_structure_at_depth() {
        let fs = MockFileSystem::new();
        fs.write(Path::new("/out/aws/vpc/vpc.tf"), "resource \"aws_vpc\" \"a\" {}").unwrap();
        fs.write(Path::new("/out/aws/vpc/provider.tf"), "provider \"aws\" {}").unwrap();
        fs.write(Path::new("/out/aws/s3/eu/bucket.tf"), "resource \"aws_s3_bucket\" \"b\" {}")
            .unwrap();
        fs.write(Path::new("/out/aws/vpc/terraform.tfstate"), "{}").unwrap();
        let output = MockOutput::new();

        let report = Reconciler::new(&fs, &output).reconcile(&options()).unwrap();

        assert_eq!(
            report.copied,
            vec![
                PathBuf::from("aws/s3/eu/bucket.tf"),
                PathBuf::from("aws/vpc/provider.tf"),
                PathBuf::from("aws/vpc/vpc.tf"),
            ]
        );
        assert_eq!(
            fs.get_file_contents(Path::new("/project/imported/aws/s3/eu/bucket.tf"))
                .as_deref(),
            Some("resource \"aws_s3_bucket\" \"b\" {}")
        );
        assert!(fs.has_file(Path::new("/project/imported/aws/vpc/vpc.tf")));
        assert!(!fs.has_file(Path::new("/project/imported/aws/vpc/terraform.tfstate")));
        // sources untouched
        assert!(fs.has_file(Path::new("/out/aws/vpc/vpc.tf")));
    }

    #[test]
    fn test_nothing_to_copy_warns() {
        let fs = MockFileSystem::new();
        fs.write(Path::new("/out/aws/vpc/terraform.tfstate"), "{}").unwrap();
        let output = MockOutput::new();

        let report = Reconciler::new(&fs, &output).reconcile(&options()).unwrap();

        assert!(!report.copied_any());
        assert_eq!(output.get_warnings().len(), 1);
        assert!(!fs.is_dir(Path::new("/project/imported")));
    }

    #[test]
    fn test_overwrite_is_reported() {
        let fs = MockFileSystem::new();
        fs.write(Path::new("/out/aws/vpc/vpc.tf"), "new").unwrap();
        fs.write(Path::new("/project/imported/aws/vpc/vpc.tf"), "old").unwrap();
        let output = MockOutput::new();

        let report = Reconciler::new(&fs, &output).reconcile(&options()).unwrap();

        assert_eq!(report.overwritten, vec![PathBuf::from("aws/vpc/vpc.tf")]);
        assert_eq!(
            fs.get_file_contents(Path::new("/project/imported/aws/vpc/vpc.tf"))
                .as_deref(),
            Some("new")
        );
        assert!(output.get_warnings()[0].contains("Overwriting"));
    }

    #[test]
    fn test_resource_filters_select_by_content() {
        let fs = MockFileSystem::new();
        fs.write(Path::new("/out/aws/vpc/vpc.tf"), "resource \"aws_vpc\" \"staging\" {}").unwrap();
        fs.write(Path::new("/out/aws/s3/s3.tf"), "resource \"aws_s3_bucket\" \"logs\" {}")
            .unwrap();
        let output = MockOutput::new();
        let options = options()
            .with_resource_filters(&["aws_vpc\\b".to_string(), "nomatch".to_string()])
            .unwrap();

        let report = Reconciler::new(&fs, &output).reconcile(&options).unwrap();

        assert_eq!(report.copied, vec![PathBuf::from("aws/vpc/vpc.tf")]);
        assert_eq!(report.filtered_out, vec![PathBuf::from("aws/s3/s3.tf")]);
        assert!(!fs.has_file(Path::new("/project/imported/aws/s3/s3.tf")));
    }

    #[test]
    fn test_real_filesystem_tree() {
        use crate::traits::RealFileSystem;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let project = dir.path().join("project");
        std::fs::create_dir_all(out.join("aws/route53/zone")).unwrap();
        std::fs::write(out.join("aws/route53/zone/records.tf"), "records").unwrap();

        let options = ImportOptions::new("route53", &out, &project).unwrap();
        let output = MockOutput::new();

        let report = Reconciler::new(&RealFileSystem, &output)
            .reconcile(&options)
            .unwrap();

        assert_eq!(report.copied.len(), 1);
        assert_eq!(
            std::fs::read_to_string(project.join("imported/aws/route53/zone/records.tf")).unwrap(),
            "records"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_sources_reconcile_on_rerun() {
        use crate::traits::RealFileSystem;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let project = dir.path().join("project");
        let source = out.join("aws/vpc/vpc.tf");
        std::fs::create_dir_all(source.parent().unwrap()).unwrap();
        std::fs::write(&source, "resource \"aws_vpc\" \"main\" {}").unwrap();
        std::fs::set_permissions(&source, std::fs::Permissions::from_mode(0o444)).unwrap();

        let options = ImportOptions::new("vpc", &out, &project).unwrap();
        let output = MockOutput::new();
        let reconciler = Reconciler::new(&RealFileSystem, &output);

        let first = reconciler.reconcile(&options).unwrap();
        let second = reconciler.reconcile(&options).unwrap();

        assert_eq!(first.copied, vec![PathBuf::from("aws/vpc/vpc.tf")]);
        assert_eq!(second.overwritten, vec![PathBuf::from("aws/vpc/vpc.tf")]);
        let copied = project.join("imported/aws/vpc/vpc.tf");
        assert_eq!(
            std::fs::metadata(&copied).unwrap().permissions().mode() & 0o777,
            0o444
        );
    }
}
