pub mod command;
pub mod environment;
pub mod fetcher;
pub mod filesystem;
pub mod output;

pub use command::{CommandExecutor, RealCommandExecutor};
pub use environment::{Environment, RealEnvironment};
pub use fetcher::{ArtifactFetcher, HttpArtifactFetcher};
pub use filesystem::{FileSystem, RealFileSystem};
pub use output::{Output, TerminalOutput};

#[cfg(test)]
pub use command::{MockCommandExecutor, MockCommandResult};
#[cfg(test)]
pub use environment::MockEnvironment;
#[cfg(test)]
pub use fetcher::MockArtifactFetcher;
#[cfg(test)]
pub use filesystem::MockFileSystem;
#[cfg(test)]
pub use output::{MockOutput, OutputMessage};
