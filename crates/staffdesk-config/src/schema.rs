//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Global service settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Session inactivity settings
    #[serde(default)]
    pub session: RawSessionConfig,

    /// Leave request settings
    #[serde(default)]
    pub leave: RawLeaveConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the session store
    pub data_dir: Option<PathBuf>,
}

/// Session inactivity settings, all in milliseconds
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSessionConfig {
    /// Inactivity after which the session is ended
    pub timeout_ms: Option<u64>,

    /// Trailing portion of the timeout during which the user is warned
    pub warning_window_ms: Option<u64>,

    /// How often elapsed inactivity is recomputed
    pub poll_interval_ms: Option<u64>,

    /// Delay between the expiry notice and the forced logout
    pub expiry_grace_ms: Option<u64>,
}

/// Leave request settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLeaveConfig {
    /// Hours per working day, used when a permission has no explicit hours
    pub work_hours_per_day: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_schema() {
        let toml_str = r#"
            config_version = 1

            [service]
            data_dir = "/var/lib/staffdesk"

            [session]
            timeout_ms = 900000
            warning_window_ms = 120000

            [leave]
            work_hours_per_day = 8
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.service.data_dir, Some(PathBuf::from("/var/lib/staffdesk")));
        assert_eq!(config.session.timeout_ms, Some(900_000));
        assert_eq!(config.session.poll_interval_ms, None);
        assert_eq!(config.leave.work_hours_per_day, Some(8));
    }

    #[test]
    fn sections_are_optional() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert!(config.service.data_dir.is_none());
        assert!(config.session.timeout_ms.is_none());
        assert!(config.leave.work_hours_per_day.is_none());
    }
}
