use std::env;
use std::str::FromStr;

use crate::constants::{DEFAULT_LESSONS_BATCH_SIZE, DEFAULT_LESSONS_PER_DAY};
use crate::logging::LogConfig;
use crate::srs::TimingVariant;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub deck_defaults: DeckDefaults,
}

/// Settings applied to imported decks that do not specify their own.
#[derive(Debug, Clone)]
pub struct DeckDefaults {
    pub lessons_per_day: u32,
    pub lessons_batch_size: u32,
    pub srs_timings_type: TimingVariant,
}

impl Default for DeckDefaults {
    fn default() -> Self {
        Self {
            lessons_per_day: DEFAULT_LESSONS_PER_DAY,
            lessons_batch_size: DEFAULT_LESSONS_BATCH_SIZE,
            srs_timings_type: TimingVariant::Default,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "warn"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/flashcards.sled"),
            deck_defaults: DeckDefaults {
                lessons_per_day: env_or_parse("DEFAULT_LESSONS_PER_DAY", DEFAULT_LESSONS_PER_DAY),
                lessons_batch_size: env_or_parse(
                    "DEFAULT_LESSONS_BATCH_SIZE",
                    DEFAULT_LESSONS_BATCH_SIZE,
                ),
                srs_timings_type: env_or_parse("DEFAULT_SRS_TIMINGS", TimingVariant::Default),
            },
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            log_level: self.log_level.clone(),
            enable_file_logs: self.enable_file_logs,
            log_dir: self.log_dir.clone(),
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn managed_keys() -> &'static [&'static str] {
        &[
            "RUST_LOG",
            "ENABLE_FILE_LOGS",
            "SLED_PATH",
            "DEFAULT_LESSONS_PER_DAY",
            "DEFAULT_LESSONS_BATCH_SIZE",
            "DEFAULT_SRS_TIMINGS",
        ]
    }

    fn clear_keys(keys: &[&str]) {
        for key in keys {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_when_missing() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        let cfg = Config::from_env();
        assert_eq!(cfg.log_level, "warn");
        assert!(!cfg.enable_file_logs);
        assert_eq!(cfg.deck_defaults.lessons_per_day, 15);
        assert_eq!(cfg.deck_defaults.lessons_batch_size, 5);
        assert_eq!(cfg.deck_defaults.srs_timings_type, TimingVariant::Default);
    }

    #[test]
    fn parses_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("DEFAULT_LESSONS_PER_DAY", "30");
        env::set_var("DEFAULT_SRS_TIMINGS", "demo");
        env::set_var("ENABLE_FILE_LOGS", "yes");
        env::set_var("SLED_PATH", "/tmp/cards.sled");

        let cfg = Config::from_env();
        assert_eq!(cfg.deck_defaults.lessons_per_day, 30);
        assert_eq!(cfg.deck_defaults.srs_timings_type, TimingVariant::Demo);
        assert!(cfg.enable_file_logs);
        assert_eq!(cfg.sled_path, "/tmp/cards.sled");
        clear_keys(managed_keys());
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("DEFAULT_LESSONS_BATCH_SIZE", "many");
        env::set_var("DEFAULT_SRS_TIMINGS", "hourly");

        let cfg = Config::from_env();
        assert_eq!(cfg.deck_defaults.lessons_batch_size, 5);
        assert_eq!(cfg.deck_defaults.srs_timings_type, TimingVariant::Default);
        clear_keys(managed_keys());
    }
}
