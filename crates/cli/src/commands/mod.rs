//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_capture;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::CaptureBlueprint;
use tracing::info;

use crate::error::CliError;

/// Load a blueprint from `path`, or the built-in defaults when no path is given
fn load_blueprint(path: Option<&Path>) -> Result<CaptureBlueprint> {
    let Some(path) = path else {
        info!("No configuration file given, using built-in defaults");
        return Ok(CaptureBlueprint::default());
    };

    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
