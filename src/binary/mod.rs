//! Process-backed subsystem handlers driving an installed test runner binary.

mod error;
mod launcher;
mod platform;
mod state;

use std::path::PathBuf;

use async_trait::async_trait;

pub use error::BinaryError;
pub use launcher::{open_args, project_dir, run_args};
pub use platform::find_binary;
pub use state::{BinaryState, read_state_from, state_file_path, write_state_to};

use crate::config::ResolvedConfig;
use crate::dispatch::{Handlers, InstallOptions, VerifyOptions, Versions};
use crate::error::AppError;
use crate::options::NormalizedRequest;

/// Version of this package; also the cache subdirectory the binary lives in.
pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// [`Handlers`] that spawn the binary resolved from the configuration.
pub struct BinaryHandlers {
    config: ResolvedConfig,
}

impl BinaryHandlers {
    #[must_use]
    pub fn new(config: ResolvedConfig) -> Self {
        tracing::debug!(
            config_file = ?config.config_path,
            binary = ?config.binary_path,
            state_dir = ?config.state_dir,
            "resolved configuration"
        );
        Self { config }
    }

    fn binary(&self) -> Result<PathBuf, BinaryError> {
        let binary = find_binary(self.config.binary_path.as_deref(), PACKAGE_VERSION)?;
        tracing::debug!(binary = %binary.display(), "resolved binary");
        Ok(binary)
    }

    fn state_path(&self) -> Result<PathBuf, AppError> {
        Ok(state_file_path(self.config.require_state_dir()?))
    }
}

#[async_trait]
impl Handlers for BinaryHandlers {
    async fn version(&self) -> Versions {
        let binary = match self.binary() {
            Ok(path) => launcher::query_version(&path).await,
            Err(e) => {
                tracing::debug!("no binary version: {e}");
                None
            }
        };
        Versions {
            package: PACKAGE_VERSION.to_string(),
            binary,
        }
    }

    async fn run(&self, request: NormalizedRequest) -> Result<i32, AppError> {
        let binary = self.binary()?;
        let project = project_dir(&request)?;
        let args = run_args(&request, &project);
        Ok(launcher::spawn_and_wait(&binary, &args).await?)
    }

    async fn open(&self, request: NormalizedRequest) -> Result<(), AppError> {
        let binary = self.binary()?;
        let project = project_dir(&request)?;
        let args = open_args(&request, &project);

        if request.detached == Some(true) {
            let pid = launcher::spawn_detached(&binary, &args)?;
            tracing::info!(pid, "opened detached");
            return Ok(());
        }

        match launcher::spawn_and_wait(&binary, &args).await? {
            0 => Ok(()),
            code => Err(BinaryError::ExitedWithFailure(code).into()),
        }
    }

    async fn install(&self, options: InstallOptions) -> Result<(), AppError> {
        let binary = self.binary()?;
        let state_path = self.state_path()?;

        let previous = read_state_from(&state_path).ok().flatten();
        let same_binary = previous.as_ref().is_some_and(|s| s.binary == binary);
        if same_binary && !options.force {
            println!("Cypress binary already installed at {}", binary.display());
            return Ok(());
        }

        write_state_to(
            &state_path,
            &BinaryState {
                binary: binary.clone(),
                verified: false,
                version: None,
            },
        )?;
        println!("Cypress binary installed at {}", binary.display());
        Ok(())
    }

    async fn verify(&self, options: VerifyOptions) -> Result<(), AppError> {
        let binary = self.binary()?;
        let state_path = self.state_path()?;

        if !options.force && state::is_verified(&state_path, &binary) {
            tracing::info!(binary = %binary.display(), "binary already verified");
            return Ok(());
        }

        let ping = (uuid::Uuid::new_v4().as_u128() % 100_000_000).to_string();
        launcher::smoke_test(&binary, &ping).await?;

        let version = launcher::query_version(&binary).await;
        write_state_to(
            &state_path,
            &BinaryState {
                binary: binary.clone(),
                verified: true,
                version,
            },
        )?;

        println!("Verified Cypress binary at {}", binary.display());
        if options.welcome_message {
            println!("Opening Cypress...");
        }
        Ok(())
    }
}
