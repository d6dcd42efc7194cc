use dirs::home_dir;
use std::{env, path::PathBuf};

const DEFAULT_DIR_NAME: &str = ".wello";
const RECORDS_DIR: &str = "records";
const CONFIG_FILE: &str = "config.json";

/// Returns the application-specific data directory, defaulting to `~/.wello`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("WELLO_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding exported onboarding records.
pub fn records_dir_in(base: &std::path::Path) -> PathBuf {
    base.join(RECORDS_DIR)
}

/// Path to the configuration file below `base`.
pub fn config_file_in(base: &std::path::Path) -> PathBuf {
    base.join(CONFIG_FILE)
}
