use cadence_core::calendar::ViewType;
use cadence_core::recurrence::{EngineConfig, DEFAULT_MAX_ITERATIONS};
use cadence_core::timezone::LocalZone;
use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding all entries
    pub database_path: String,
    /// IANA name of the local calendar
    pub timezone: String,
    /// Cap on candidate days visited by a single occurrence walk
    pub max_iterations: usize,
    pub default_view: ViewType,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "cadence.db".to_string(),
            timezone: detect_system_timezone(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            default_view: ViewType::Week,
        }
    }
}

impl Config {
    /// Defaults, overridden by `cadence.toml` (or the file named by
    /// `CADENCE_CONFIG`), overridden by `CADENCE_*` variables.
    pub fn new() -> Result<Self, figment::Error> {
        let file = std::env::var("CADENCE_CONFIG").unwrap_or_else(|_| "cadence.toml".to_string());
        Figment::new()
            .merge(Toml::file(file))
            .merge(Env::prefixed("CADENCE_").ignore(&["config"]))
            .extract()
    }

    pub fn zone(&self) -> Result<LocalZone, cadence_core::error::ScheduleError> {
        LocalZone::parse(&self.timezone)
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            max_iterations: self.max_iterations,
        }
    }
}

/// Detects the system timezone, falling back to UTC if detection fails
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if Tz::from_str(&tz).is_ok() {
            return tz;
        }
    }
    if let Ok(tz) = iana_time_zone::get_timezone() {
        if Tz::from_str(&tz).is_ok() {
            return tz;
        }
    }
    "UTC".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.database_path, "cadence.db");
        assert_eq!(config.default_view, ViewType::Week);
        assert!(config.zone().is_ok());
        assert_eq!(config.engine().max_iterations, DEFAULT_MAX_ITERATIONS);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config: Config = Figment::new()
            .merge(Toml::string(
                r#"
                timezone = "Asia/Tokyo"
                default_view = "3days"
                max_iterations = 500
                "#,
            ))
            .extract()
            .unwrap();
        assert_eq!(config.timezone, "Asia/Tokyo");
        assert_eq!(config.default_view, ViewType::ThreeDays);
        assert_eq!(config.max_iterations, 500);
        assert_eq!(config.database_path, "cadence.db");
    }
}
