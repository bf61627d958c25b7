//! Checks run before anything costly: tool presence, optional install,
//! and cloud credentials.

pub mod credentials;
pub mod install;
pub mod tool;

pub use credentials::CredentialCheck;
pub use install::Installer;
pub use tool::ToolCheck;
