//! Default paths for staffdesk components
//!
//! Paths are user-writable by default:
//! - Config: `$XDG_CONFIG_HOME/staffdesk/config.toml` or `~/.config/staffdesk/config.toml`
//! - Data: `$XDG_DATA_HOME/staffdesk` or `~/.local/share/staffdesk`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const STAFFDESK_DATA_DIR_ENV: &str = "STAFFDESK_DATA_DIR";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Database filename within the data directory
const DATABASE_FILENAME: &str = "staffdesk.db";

/// Application subdirectory name
const APP_DIR: &str = "staffdesk";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/staffdesk/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/staffdesk/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$STAFFDESK_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/staffdesk` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/staffdesk` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(STAFFDESK_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking STAFFDESK_DATA_DIR env var.
/// Used for default values in configs where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Path of the session/audit database inside a data directory
pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(DATABASE_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_toml_under_app_dir() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("staffdesk"));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
    }

    #[test]
    fn data_dir_contains_staffdesk() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("staffdesk"));
    }

    #[test]
    fn database_lives_in_data_dir() {
        let dir = PathBuf::from("/var/lib/staffdesk");
        assert_eq!(database_path(&dir), dir.join("staffdesk.db"));
    }
}
