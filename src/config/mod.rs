//! Engine configuration.
//!
//! TOML-backed, organized into sections: [`StoryConfig`] for the narrative
//! framing (name, epoch, start locations), [`ServerConfig`] for the tick
//! driver, and [`LoggingConfig`]. Every field has a sensible default so a
//! missing file still produces a runnable engine; `validate` catches the
//! combinations that would misbehave at runtime.
//!
//! ```toml
//! [story]
//! name = "Demo Story"
//! author = "someone"
//! gametime_ratio = 5.0
//! start_location = "town.square"
//! wizard_start_location = "wizardtower.hall"
//!
//! [server]
//! tick_method = "timer"
//! tick_seconds = 1.0
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::scheduler::TickMethod;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryConfig {
    pub name: String,
    pub author: String,
    /// Start date/time of the game clock.
    #[serde(default = "default_epoch")]
    pub epoch: DateTime<Utc>,
    /// Game time runs this many times faster than real time.
    #[serde(default = "default_gametime_ratio")]
    pub gametime_ratio: f64,
    /// Catalog path where new players appear.
    #[serde(default = "default_start_location")]
    pub start_location: String,
    /// Catalog path where wizards appear.
    #[serde(default = "default_wizard_start_location")]
    pub wizard_start_location: String,
    /// Finale text for the story-complete callback.
    #[serde(default = "default_completion_message")]
    pub completion_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `command` ticks once per accepted command; `timer` ticks on a fixed
    /// wall-clock interval.
    #[serde(default = "default_tick_method")]
    pub tick_method: TickMethod,
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,
    /// Fixed seed for the behavior dice; unset means seeded from entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
    /// Snapshot file used by the `save` flow.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub story: StoryConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

fn default_epoch() -> DateTime<Utc> {
    // The demo story opens on a spring afternoon.
    Utc.with_ymd_and_hms(2012, 4, 19, 14, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn default_gametime_ratio() -> f64 {
    5.0
}

fn default_start_location() -> String {
    crate::world::seed::START_LOCATION_PATH.to_string()
}

fn default_wizard_start_location() -> String {
    crate::world::seed::WIZARD_START_LOCATION_PATH.to_string()
}

fn default_completion_message() -> String {
    "Congratulations! You've finished the game!".to_string()
}

fn default_tick_method() -> TickMethod {
    TickMethod::Timer
}

fn default_tick_seconds() -> f64 {
    1.0
}

fn default_snapshot_path() -> String {
    "data/world.snapshot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            story: StoryConfig {
                name: "Demo Story".to_string(),
                author: "Anonymous".to_string(),
                epoch: default_epoch(),
                gametime_ratio: default_gametime_ratio(),
                start_location: default_start_location(),
                wizard_start_location: default_wizard_start_location(),
                completion_message: default_completion_message(),
            },
            server: ServerConfig {
                tick_method: default_tick_method(),
                tick_seconds: default_tick_seconds(),
                rng_seed: None,
                snapshot_path: default_snapshot_path(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
            },
        }
    }
}

impl Config {
    /// Load and validate a configuration file.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("failed to read config file '{}': {}", path, e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| anyhow!("failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Write a default configuration to `path`.
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)?;
        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("failed to write config file '{}': {}", path, e))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.story.name.trim().is_empty() {
            return Err(anyhow!("story.name must not be empty"));
        }
        if self.story.gametime_ratio <= 0.0 {
            return Err(anyhow!("story.gametime_ratio must be positive"));
        }
        if self.server.tick_seconds <= 0.0 {
            return Err(anyhow!("server.tick_seconds must be positive"));
        }
        if self.story.start_location.trim().is_empty()
            || self.story.wizard_start_location.trim().is_empty()
        {
            return Err(anyhow!("start locations must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().expect("default config valid");
    }

    #[test]
    fn rejects_nonpositive_tick() {
        let mut config = Config::default();
        config.server.tick_seconds = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [story]
            name = "Test"
            author = "tester"

            [server]
            tick_method = "command"

            [logging]
            "#,
        )
        .expect("parse");
        assert_eq!(config.server.tick_method, TickMethod::Command);
        assert_eq!(config.story.gametime_ratio, 5.0);
        assert_eq!(config.story.start_location, "town.square");
    }
}
