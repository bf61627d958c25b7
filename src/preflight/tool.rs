use crate::config::ToolConfig;
use crate::runner::CommandRunner;
use crate::traits::Output;

/// Documentation link shown when the import tool is missing
pub const INSTALL_DOCS_URL: &str =
    "https://github.com/GoogleCloudPlatform/terraformer#installation";

/// Checks that the import tool is on PATH and responds
pub struct ToolCheck<'a> {
    runner: &'a CommandRunner,
    output: &'a dyn Output,
    config: &'a ToolConfig,
}

impl<'a> ToolCheck<'a> {
    pub fn new(runner: &'a CommandRunner, output: &'a dyn Output, config: &'a ToolConfig) -> Self {
        Self {
            runner,
            output,
            config,
        }
    }

    /// Run the version check (and the listing call in strict mode)
    ///
    /// Never fails: reports the problem and returns `false`, leaving the
    /// install-or-abort decision to the caller.
    pub fn verify_tool_installed(&self) -> bool {
        let bin = &self.config.terraformer_bin;
        let version = self.runner.run_captured(bin, &["version"], None);

        if !version.success() {
            self.report_missing();
            return false;
        }

        if self.config.strict_tool_check {
            let listing =
                self.runner
                    .run_captured(bin, &["import", self.config.provider.as_str(), "list"], None);

            if !listing.success() {
                self.output.error(&format!(
                    "{} responded to 'version' but 'import {} list' failed",
                    bin, self.config.provider
                ));
                if !listing.stderr().trim().is_empty() {
                    self.output.dimmed(listing.stderr().trim());
                }
                return false;
            }
        }

        self.output
            .success(&format!("Terraformer version: {}", version.stdout().trim()));
        true
    }

    fn report_missing(&self) {
        self.output
            .error("Terraformer is not installed or not in PATH");
        self.output.warning("Please install Terraformer first:");
        self.output.dimmed(INSTALL_DOCS_URL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MockCommandExecutor, MockCommandResult, MockOutput};
    use std::sync::Arc;

    fn check(results: Vec<MockCommandResult>, strict: bool) -> (bool, Arc<MockCommandExecutor>, Arc<MockOutput>) {
        let executor = Arc::new(MockCommandExecutor::with_outputs(results));
        let output = Arc::new(MockOutput::new());
        let runner = CommandRunner::new(executor.clone(), output.clone());
        let config = ToolConfig {
            strict_tool_check: strict,
            ..ToolConfig::default()
        };

        let installed = ToolCheck::new(&runner, output.as_ref(), &config).verify_tool_installed();
        (installed, executor, output)
    }

    #[test]
    fn test_installed() {
        let (installed, executor, output) =
            check(vec![MockCommandResult::ok("terraformer", "Terraformer v0.8.24\n")], false);

        assert!(installed);
        assert_eq!(executor.calls_for("terraformer"), vec![vec!["version".to_string()]]);
        assert!(output.to_text().contains("Terraformer v0.8.24"));
    }

    #[test]
    fn test_missing_reports_docs_link() {
        let (installed, _, output) = check(vec![MockCommandResult::not_found("terraformer")], false);

        assert!(!installed);
        assert_eq!(output.get_errors().len(), 1);
        assert!(output.to_text().contains(INSTALL_DOCS_URL));
    }

    #[test]
    fn test_strict_requires_listing() {
        let (installed, executor, _) = check(
            vec![
                MockCommandResult::ok("terraformer", "v0.8.24").when_first_arg("version"),
                MockCommandResult::failed("terraformer", 1, "provider plugin missing")
                    .when_first_arg("import"),
            ],
            true,
        );

        assert!(!installed);
        assert_eq!(
            executor.calls_for("terraformer")[1],
            vec!["import".to_string(), "aws".to_string(), "list".to_string()]
        );
    }

    #[test]
    fn test_strict_passes_when_listing_succeeds() {
        let (installed, executor, _) =
            check(vec![MockCommandResult::ok("terraformer", "v0.8.24")], true);

        assert!(installed);
        assert_eq!(executor.calls_for("terraformer").len(), 2);
    }
}
