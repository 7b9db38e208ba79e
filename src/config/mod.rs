mod loader;
mod schema;

pub use loader::{load_config, load_default, API_BASE_VAR, API_KEY_VAR};
pub use schema::*;

use anyhow::Result;
use std::path::Path;

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        loader::load_config(path)
    }

    /// `~/.guardrelay/config.yaml`, or a relative path when there is no home directory
    pub fn default_path() -> std::path::PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".guardrelay"))
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("config.yaml")
    }
}
