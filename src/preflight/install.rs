use std::path::{Path, PathBuf};

use crate::config::ToolConfig;
use crate::context::Context;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::runner::CommandRunner;

/// Binary directory used when running as root
pub const SYSTEM_BIN_DIR: &str = "/usr/local/bin";

/// Release artifact coordinates for the running host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Platform {
    /// Map Rust's OS/arch names onto Terraformer release names
    pub fn resolve(os: &str, arch: &str) -> PipelineResult<Self> {
        let release_os = match os {
            "linux" => "linux",
            "macos" | "darwin" => "darwin",
            _ => return Err(unsupported(os, arch)),
        };

        let release_arch = match arch {
            "x86_64" | "amd64" => "amd64",
            "aarch64" | "arm64" => "arm64",
            _ => return Err(unsupported(os, arch)),
        };

        Ok(Self {
            os: release_os,
            arch: release_arch,
        })
    }

    /// e.g. `terraformer-aws-linux-amd64`
    pub fn artifact_name(&self, provider: &str) -> String {
        format!("terraformer-{}-{}-{}", provider, self.os, self.arch)
    }
}

fn unsupported(os: &str, arch: &str) -> PipelineError {
    PipelineError::UnsupportedPlatform {
        os: os.to_string(),
        arch: arch.to_string(),
    }
}

/// Downloads the import tool and places it on PATH
pub struct Installer<'a> {
    ctx: &'a Context,
    runner: &'a CommandRunner,
    config: &'a ToolConfig,
}

impl<'a> Installer<'a> {
    pub fn new(ctx: &'a Context, runner: &'a CommandRunner, config: &'a ToolConfig) -> Self {
        Self {
            ctx,
            runner,
            config,
        }
    }

    /// Install the import tool unless `which` already finds it
    ///
    /// Returns the path of the installed binary, or `None` when it was
    /// already present.
    pub fn install_tool(&self) -> PipelineResult<Option<PathBuf>> {
        let bin = &self.config.terraformer_bin;

        if self.runner.run_captured("which", &[bin.as_str()], None).success() {
            tracing::info!("Terraformer is already installed");
            return Ok(None);
        }

        tracing::info!("Installing Terraformer...");

        let platform = Platform::resolve(&self.ctx.env.os(), &self.ctx.env.arch())?;
        let artifact = platform.artifact_name(&self.config.provider);
        let url = format!(
            "{}/{}/{}",
            self.config.release_base_url.trim_end_matches('/'),
            self.config.terraformer_version,
            artifact
        );

        self.ctx.output.info(&format!("Downloading {}", url));
        let body = self
            .ctx
            .fetcher
            .fetch(&url)
            .map_err(|e| PipelineError::InstallFailed(format!("{:#}", e)))?;

        let staging = self.ctx.env.temp_dir().join(&artifact);
        self.ctx
            .fs
            .write_bytes(&staging, &body)
            .map_err(|e| PipelineError::filesystem(Stage::Install, e))?;
        self.ctx
            .fs
            .set_executable(&staging)
            .map_err(|e| PipelineError::filesystem(Stage::Install, e))?;

        let dest_dir = self.destination_dir()?;
        let binary_name = Path::new(bin)
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| PipelineError::InvalidConfig(format!("invalid binary name: {}", bin)))?;
        let dest = dest_dir.join(binary_name);

        self.ctx
            .fs
            .rename(&staging, &dest)
            .map_err(|e| PipelineError::InstallFailed(format!("{:#}", e)))?;

        tracing::info!("Terraformer installed to {}", dest.display());
        self.ctx
            .output
            .success(&format!("Terraformer installed to {}", dest.display()));

        Ok(Some(dest))
    }

    /// `/usr/local/bin` for root, `~/.local/bin` otherwise (added to PATH)
    fn destination_dir(&self) -> PipelineResult<PathBuf> {
        if self.ctx.env.is_privileged() {
            let dest_dir = PathBuf::from(SYSTEM_BIN_DIR);
            self.ctx
                .fs
                .create_dir_all(&dest_dir)
                .map_err(|e| PipelineError::filesystem(Stage::Install, e))?;
            return Ok(dest_dir);
        }

        let home = self.ctx.env.home_dir().ok_or_else(|| {
            PipelineError::InstallFailed("cannot determine home directory".to_string())
        })?;
        let dest_dir = home.join(".local").join("bin");

        self.ctx
            .fs
            .create_dir_all(&dest_dir)
            .map_err(|e| PipelineError::filesystem(Stage::Install, e))?;

        if !self.ctx.env.path_contains(&dest_dir) {
            self.ctx.output.warning(&format!(
                "Adding {} to PATH for this session",
                dest_dir.display()
            ));
            self.ctx.env.append_to_path(&dest_dir);
        }

        Ok(dest_dir)
    }
}
