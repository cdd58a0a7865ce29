//! TOML configuration shared by the collector, trainer and dashboard.

use crate::app_dirs;

mod defaults;
mod load;
mod types;

#[cfg(test)]
mod save;
#[cfg(test)]
mod tests;

/// Default filename used to store the configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub use load::{config_path, load_from_path, load_or_default};
pub use types::{
    ClassSource, CollectorSettings, ConfigError, DashboardSettings, EnoseConfig, TrainerSettings,
};

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}
