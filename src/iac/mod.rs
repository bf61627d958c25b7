pub mod executor;
pub mod terraform;

pub use executor::IacExecutor;
pub use terraform::TerraformExecutor;
