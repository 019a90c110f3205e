use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Locate a crate's `config` directory whether the process runs from the
/// workspace root or from inside the crate directory.
pub fn configuration_directory(base_path: &Path, crate_dir: &str) -> PathBuf {
    if base_path.ends_with(crate_dir) {
        base_path.join("config")
    } else {
        base_path.join(crate_dir).join("config")
    }
}

/// Load layered settings: `<config dir>/base.yaml`, then `APP_*` environment
/// variables (`__` separates nested keys, e.g. `APP_SERVER__PORT`).
pub fn load_settings<T: DeserializeOwned>(crate_dir: &str) -> Result<T, AppError> {
    dotenvy::dotenv().ok();

    let base_path = std::env::current_dir()?;
    let configuration_directory = configuration_directory(&base_path, crate_dir);

    let settings = Cfg::builder()
        .add_source(File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<T>()?)
}
