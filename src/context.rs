use crate::traits::{
    ArtifactFetcher, CommandExecutor, Environment, FileSystem, HttpArtifactFetcher, Output,
    RealCommandExecutor, RealEnvironment, RealFileSystem, TerminalOutput,
};
use std::sync::Arc;

/// Application context that holds all dependencies for dependency injection
pub struct Context {
    pub fs: Arc<dyn FileSystem>,
    pub output: Arc<dyn Output>,
    pub command: Arc<dyn CommandExecutor>,
    pub env: Arc<dyn Environment>,
    pub fetcher: Arc<dyn ArtifactFetcher>,
}

impl Context {
    /// Create a new context with real implementations (for production use)
    pub fn new() -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            output: Arc::new(TerminalOutput),
            command: Arc::new(RealCommandExecutor::new()),
            env: Arc::new(RealEnvironment),
            fetcher: Arc::new(HttpArtifactFetcher::new()),
        }
    }

    /// Create a test context with specific mock implementations
    #[cfg(test)]
    pub fn test_with(
        fs: Arc<dyn FileSystem>,
        output: Arc<dyn Output>,
        command: Arc<dyn CommandExecutor>,
        env: Arc<dyn Environment>,
        fetcher: Arc<dyn ArtifactFetcher>,
    ) -> Self {
        Self {
            fs,
            output,
            command,
            env,
            fetcher,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
