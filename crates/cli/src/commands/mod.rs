//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use std::path::PathBuf;

use config_loader::{ConfigLoader, LoadedConfig};
use tracing::info;

use crate::error::{CliError, Result};

/// Load, merge and validate every route file at `locations`
fn load_config(locations: &[PathBuf]) -> Result<LoadedConfig> {
    if let Some(missing) = locations.iter().find(|path| !path.exists()) {
        return Err(CliError::config_not_found(missing.display().to_string()));
    }

    let loaded = ConfigLoader::load_from_locations(locations)?;
    for source in &loaded.sources {
        info!(file = %source.display(), "Loaded route file");
    }
    Ok(loaded)
}
