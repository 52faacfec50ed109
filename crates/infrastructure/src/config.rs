use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROOT: &str = "/sys/class/leds";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LedctlConfig {
    /// Directory holding one sub-directory per LED
    #[serde(default = "default_root")]
    pub root: String,
    /// Blink speed multiplier applied to blinks without their own rate
    #[serde(default = "default_rate")]
    pub rate: f64,
    /// `tracing` filter directive, overridden by `RUST_LOG`
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_root() -> String {
    DEFAULT_ROOT.to_string()
}

fn default_rate() -> f64 {
    1.0
}

impl Default for LedctlConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            rate: default_rate(),
            log_filter: None,
        }
    }
}

impl LedctlConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("root", DEFAULT_ROOT)?
            .set_default("rate", 1.0)?
            // Local config file, e.g. config/default.toml
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Per run mode overrides, e.g. config/production.toml
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Environment variables (e.g. LEDCTL__ROOT=/tmp/leds)
            .add_source(Environment::with_prefix("LEDCTL").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_files() {
        let dir = std::env::temp_dir().join(format!("ledctl_config_{}", uuid::Uuid::new_v4()));
        let config = LedctlConfig::load(dir.to_str().unwrap()).unwrap();
        assert_eq!(config.root, DEFAULT_ROOT);
        assert_eq!(config.rate, 1.0);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = std::env::temp_dir().join(format!("ledctl_config_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("default.toml"),
            "root = \"/tmp/fakeleds\"\nrate = 2.5\nlog_filter = \"debug\"\n",
        )
        .unwrap();

        let config = LedctlConfig::load(dir.to_str().unwrap()).unwrap();
        assert_eq!(config.root, "/tmp/fakeleds");
        assert_eq!(config.rate, 2.5);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));

        std::fs::remove_dir_all(dir).ok();
    }
}
