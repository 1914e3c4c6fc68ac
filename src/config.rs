//! User-tunable settings, read from `config.toml` in the platform config dir.
//!
//! ```toml
//! [timeline]
//! lead_margin_days = 3
//! trailing_margin_days = 14
//! pixels_per_day = 18.0
//!
//! [persistence]
//! date_debounce_ms = 1200
//! assignee_debounce_ms = 400
//! commit_latency_ms = 0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::PixelScale;
use crate::persistence::DebounceDelays;
use crate::timeline::TimelineMargins;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub timeline: TimelineSettings,
    pub persistence: PersistenceSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    /// Days shown before today.
    pub lead_margin_days: u32,
    /// Days shown after the later of today and the last item end. At least 1.
    pub trailing_margin_days: u32,
    pub pixels_per_day: f32,
    pub min_pixels_per_day: f32,
    pub max_pixels_per_day: f32,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        let margins = TimelineMargins::default();
        Self {
            lead_margin_days: margins.lead_days,
            trailing_margin_days: margins.trailing_days,
            pixels_per_day: 18.0,
            min_pixels_per_day: 2.0,
            max_pixels_per_day: 80.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub date_debounce_ms: u64,
    pub assignee_debounce_ms: u64,
    /// Artificial delay added to every file write. 0 disables it.
    pub commit_latency_ms: u64,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        let delays = DebounceDelays::default();
        Self {
            date_debounce_ms: delays.dates.as_millis() as u64,
            assignee_debounce_ms: delays.assignee.as_millis() as u64,
            commit_latency_ms: 0,
        }
    }
}

impl TimelineConfig {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load from the platform config dir; missing or broken files fall back to defaults.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            log::debug!("no platform config directory; using default settings");
            return Self::default();
        };
        if !path.exists() {
            log::debug!("{} not found; using default settings", path.display());
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => {
                log::info!("loaded settings from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!("{err}; using default settings");
                Self::default()
            }
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "gantt-timeline", "gantt-timeline")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timeline;
        if t.trailing_margin_days == 0 {
            return Err(ConfigError::Invalid {
                field: "timeline.trailing_margin_days",
                reason: "must be at least 1".to_string(),
            });
        }
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(t.min_pixels_per_day) || !positive(t.max_pixels_per_day) {
            return Err(ConfigError::Invalid {
                field: "timeline.min_pixels_per_day",
                reason: "zoom bounds must be positive".to_string(),
            });
        }
        if t.min_pixels_per_day > t.max_pixels_per_day {
            return Err(ConfigError::Invalid {
                field: "timeline.max_pixels_per_day",
                reason: format!(
                    "{} is below the minimum {}",
                    t.max_pixels_per_day, t.min_pixels_per_day
                ),
            });
        }
        if !positive(t.pixels_per_day) {
            return Err(ConfigError::Invalid {
                field: "timeline.pixels_per_day",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn margins(&self) -> TimelineMargins {
        TimelineMargins {
            lead_days: self.timeline.lead_margin_days,
            trailing_days: self.timeline.trailing_margin_days,
        }
    }

    pub fn scale(&self) -> PixelScale {
        PixelScale::new(
            self.timeline.pixels_per_day,
            self.timeline.min_pixels_per_day,
            self.timeline.max_pixels_per_day,
        )
    }

    pub fn delays(&self) -> DebounceDelays {
        DebounceDelays {
            dates: Duration::from_millis(self.persistence.date_debounce_ms),
            assignee: Duration::from_millis(self.persistence.assignee_debounce_ms),
        }
    }

    pub fn commit_latency(&self) -> Option<Duration> {
        match self.persistence.commit_latency_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
