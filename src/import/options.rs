use regex::Regex;
use std::path::{Path, PathBuf};

use crate::config::{DIRECTIVE_FILE, IMPORTED_DIR};
use crate::error::{PipelineError, PipelineResult};

/// Everything one import run needs, fixed once arguments are parsed
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Resource identifiers, de-duplicated, in first-seen order
    pub resources: Vec<String>,
    /// Where the import tool writes its tree
    pub output_dir: PathBuf,
    /// Project directory receiving `imported/` and the directive file
    pub target_dir: PathBuf,
    pub region: Option<String>,
    pub profile: Option<String>,
    /// Import-tool filter expressions, in the order given
    pub filters: Vec<String>,
    /// Content patterns selecting which configuration files are copied
    pub resource_filters: Vec<Regex>,
}

impl ImportOptions {
    /// Parse a comma-separated resource list; blank entries are dropped
    pub fn new(resources: &str, output_dir: &Path, target_dir: &Path) -> PipelineResult<Self> {
        let mut parsed: Vec<String> = Vec::new();
        for resource in resources.split(',').map(str::trim) {
            if !resource.is_empty() && !parsed.iter().any(|r| r == resource) {
                parsed.push(resource.to_string());
            }
        }

        if parsed.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "at least one resource must be given with --resources".to_string(),
            ));
        }

        Ok(Self {
            resources: parsed,
            output_dir: output_dir.to_path_buf(),
            target_dir: target_dir.to_path_buf(),
            region: None,
            profile: None,
            filters: Vec::new(),
            resource_filters: Vec::new(),
        })
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region.filter(|r| !r.trim().is_empty());
        self
    }

    pub fn with_profile(mut self, profile: Option<String>) -> Self {
        self.profile = profile.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_filters(mut self, filters: Vec<String>) -> Self {
        self.filters = filters;
        self
    }

    /// Compile resource-filter patterns; an invalid pattern is a config error
    pub fn with_resource_filters(mut self, patterns: &[String]) -> PipelineResult<Self> {
        self.resource_filters = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    PipelineError::InvalidConfig(format!(
                        "invalid --resource-filter '{}': {}",
                        pattern, e
                    ))
                })
            })
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(self)
    }

    /// Comma-joined resource list as passed to the import tool
    pub fn resource_list(&self) -> String {
        self.resources.join(",")
    }

    /// `<target>/imported`
    pub fn imported_dir(&self) -> PathBuf {
        self.target_dir.join(IMPORTED_DIR)
    }

    /// `<target>/import.tf`
    pub fn directive_file(&self) -> PathBuf {
        self.target_dir.join(DIRECTIVE_FILE)
    }
}
