//! Test helpers for wiring mock contexts and import-tool output trees

#![cfg(test)]

use crate::context::Context;
use crate::runner::CommandRunner;
use crate::traits::{
    FileSystem, MockArtifactFetcher, MockCommandExecutor, MockEnvironment, MockFileSystem,
    MockOutput,
};
use std::path::Path;
use std::sync::Arc;

/// A [`Context`] built from mocks, keeping typed handles for assertions
pub struct TestHarness {
    pub ctx: Context,
    pub fs: Arc<MockFileSystem>,
    pub command: Arc<MockCommandExecutor>,
    pub output: Arc<MockOutput>,
    pub env: Arc<MockEnvironment>,
    pub fetcher: Arc<MockArtifactFetcher>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with(MockEnvironment::new(), MockArtifactFetcher::new())
    }

    pub fn with_env(env: MockEnvironment) -> Self {
        Self::with(env, MockArtifactFetcher::new())
    }

    pub fn with(env: MockEnvironment, fetcher: MockArtifactFetcher) -> Self {
        let fs = Arc::new(MockFileSystem::new());
        let command = Arc::new(MockCommandExecutor::new());
        let output = Arc::new(MockOutput::new());
        let env = Arc::new(env);
        let fetcher = Arc::new(fetcher);

        let ctx = Context::test_with(
            fs.clone(),
            output.clone(),
            command.clone(),
            env.clone(),
            fetcher.clone(),
        );

        Self {
            ctx,
            fs,
            command,
            output,
            env,
            fetcher,
        }
    }

    pub fn runner(&self) -> CommandRunner {
        CommandRunner::new(self.command.clone(), self.output.clone())
    }

    /// Write a file into the mock filesystem
    pub fn file(&self, path: &str, contents: &str) -> &Self {
        self.fs.write(Path::new(path), contents).unwrap();
        self
    }
}

/// Environment with all three credential variables set
pub fn credentialed_env() -> MockEnvironment {
    MockEnvironment::new()
        .with_var("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE")
        .with_var("AWS_SECRET_ACCESS_KEY", "secret")
        .with_var("AWS_REGION", "eu-west-1")
}

/// Builder for Terraform state JSON as emitted by the import tool
pub struct StateBuilder {
    resources: Vec<serde_json::Value>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
        }
    }

    /// Add a resource with one instance per id
    pub fn resource(mut self, resource_type: &str, name: &str, ids: &[&str]) -> Self {
        let instances: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| serde_json::json!({ "attributes": { "id": id } }))
            .collect();

        self.resources.push(serde_json::json!({
            "mode": "managed",
            "type": resource_type,
            "name": name,
            "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
            "instances": instances,
        }));
        self
    }

    /// Add a raw resource entry
    pub fn raw(mut self, resource: serde_json::Value) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn build(self) -> String {
        serde_json::to_string_pretty(&serde_json::json!({
            "version": 4,
            "terraform_version": "0.12.31",
            "resources": self.resources,
        }))
        .unwrap()
    }
}
