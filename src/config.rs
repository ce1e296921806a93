//! Runtime settings sourced from environment variables
//!
//! All knobs the launcher can set without flags: database path, driver
//! preference, idle timeout, prune schedule and the target display
//! resolution hints used before the first GTK layout pass.

use std::env;
use std::path::PathBuf;

use log::warn;

use crate::sensor::DriverPreference;

pub const ENV_DB: &str = "PI_TEMP_DB";
pub const ENV_DRIVER: &str = "PI_TEMP_DHT_DRIVER";
pub const ENV_CLOCK_IDLE: &str = "PI_TEMP_CLOCK_IDLE";
pub const ENV_PRUNE_ENABLED: &str = "PI_TEMP_PRUNE_ENABLED";
pub const ENV_PRUNE_MONTHS: &str = "PI_TEMP_PRUNE_MONTHS";
pub const ENV_TARGET_W: &str = "PI_TEMP_TARGET_W";
pub const ENV_TARGET_H: &str = "PI_TEMP_TARGET_H";

const DEFAULT_IDLE_SECS: u64 = 60;
const DEFAULT_PRUNE_MONTHS: u32 = 3;
const DEFAULT_TARGET_W: i32 = 800;
const DEFAULT_TARGET_H: i32 = 480;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Database file for readings.
    pub db_path: PathBuf,
    /// Sensor driver selection override.
    pub driver: DriverPreference,
    /// Seconds of inactivity before the display switches to the clock.
    pub idle_secs: u64,
    /// Whether the daily prune runs at all.
    pub prune_enabled: bool,
    /// Retention window in months (30 days each). 0 disables pruning.
    pub prune_months: u32,
    /// Target display resolution hints for pre-layout font scaling.
    pub target_width: i32,
    pub target_height: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            driver: DriverPreference::Auto,
            idle_secs: DEFAULT_IDLE_SECS,
            prune_enabled: true,
            prune_months: DEFAULT_PRUNE_MONTHS,
            target_width: DEFAULT_TARGET_W,
            target_height: DEFAULT_TARGET_H,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup. Unset or unparseable
    /// values fall back to defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Settings::default();

        let db_path = lookup(ENV_DB)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let driver = lookup(ENV_DRIVER)
            .map(|v| DriverPreference::parse(&v))
            .unwrap_or(defaults.driver);

        let idle_secs = lookup(ENV_CLOCK_IDLE)
            .and_then(|v| parse_or_warn::<u64>(ENV_CLOCK_IDLE, &v))
            .map(|v| v.max(1))
            .unwrap_or(defaults.idle_secs);

        let prune_enabled = lookup(ENV_PRUNE_ENABLED)
            .map(|v| truthy(&v))
            .unwrap_or(defaults.prune_enabled);

        let prune_months = lookup(ENV_PRUNE_MONTHS)
            .and_then(|v| parse_or_warn::<u32>(ENV_PRUNE_MONTHS, &v))
            .unwrap_or(defaults.prune_months);

        let target_width = lookup(ENV_TARGET_W)
            .and_then(|v| parse_or_warn::<i32>(ENV_TARGET_W, &v))
            .filter(|&v| v > 0)
            .unwrap_or(defaults.target_width);

        let target_height = lookup(ENV_TARGET_H)
            .and_then(|v| parse_or_warn::<i32>(ENV_TARGET_H, &v))
            .filter(|&v| v > 0)
            .unwrap_or(defaults.target_height);

        Settings {
            db_path,
            driver,
            idle_secs,
            prune_enabled,
            prune_months,
            target_width,
            target_height,
        }
    }

    /// Pruning runs only when enabled with a nonzero retention.
    pub fn prune_active(&self) -> bool {
        self.prune_enabled && self.prune_months > 0
    }
}

/// Default database location: the platform data directory when it can be
/// determined, otherwise `readings.db` in the working directory.
pub fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("com", "github", "pi-temp-humid")
        .map(|dirs| dirs.data_dir().join("readings.db"))
        .unwrap_or_else(|| PathBuf::from("readings.db"))
}

fn truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off" | ""
    )
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring unparseable {key}={value:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let s = settings_from(&[]);
        assert_eq!(s.idle_secs, 60);
        assert!(s.prune_enabled);
        assert_eq!(s.prune_months, 3);
        assert_eq!((s.target_width, s.target_height), (800, 480));
        assert_eq!(s.driver, DriverPreference::Auto);
    }

    #[test]
    fn truthy_parsing_of_prune_enabled() {
        for off in ["0", "false", "no", "off", "", "FALSE", " Off "] {
            assert!(!settings_from(&[(ENV_PRUNE_ENABLED, off)]).prune_enabled, "{off:?}");
        }
        for on in ["1", "true", "yes", "anything"] {
            assert!(settings_from(&[(ENV_PRUNE_ENABLED, on)]).prune_enabled, "{on:?}");
        }
    }

    #[test]
    fn zero_months_disables_pruning() {
        let s = settings_from(&[(ENV_PRUNE_MONTHS, "0")]);
        assert!(s.prune_enabled);
        assert!(!s.prune_active());
    }

    #[test]
    fn garbage_values_fall_back_to_defaults() {
        let s = settings_from(&[
            (ENV_CLOCK_IDLE, "soon"),
            (ENV_PRUNE_MONTHS, "-2"),
            (ENV_TARGET_W, "0"),
        ]);
        assert_eq!(s.idle_secs, 60);
        assert_eq!(s.prune_months, 3);
        assert_eq!(s.target_width, 800);
    }

    #[test]
    fn idle_seconds_has_a_floor_of_one() {
        assert_eq!(settings_from(&[(ENV_CLOCK_IDLE, "0")]).idle_secs, 1);
        assert_eq!(settings_from(&[(ENV_CLOCK_IDLE, "90")]).idle_secs, 90);
    }

    #[test]
    fn driver_override_applies() {
        let s = settings_from(&[(ENV_DRIVER, "legacy")]);
        assert_eq!(s.driver, DriverPreference::Legacy);
    }

    #[test]
    fn db_path_override_applies() {
        let s = settings_from(&[(ENV_DB, "/tmp/t.db")]);
        assert_eq!(s.db_path, PathBuf::from("/tmp/t.db"));
    }

    #[test]
    fn default_db_path_is_a_readings_db_file() {
        // Platform data dir or working directory, either way the file
        // itself is always readings.db.
        let path = default_db_path();
        assert_eq!(path.file_name().unwrap(), "readings.db");
        let s = settings_from(&[]);
        assert_eq!(s.db_path, path);
    }
}
