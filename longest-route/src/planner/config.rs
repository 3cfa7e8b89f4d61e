//! Search configuration for the longest-route planner.
//!
//! [`EngineConfig`] holds the rules of the competition day (when it starts,
//! how long it lasts, waiting limits, the mandatory waypoint). It can be
//! read from a JSON file. [`SearchOptions`] holds the per-run choices made on
//! the command line.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::{Clock, Station};

/// Station every current-rules route must visit.
const DEFAULT_WAYPOINT: &str = "utrechtcentraal";

/// Errors in the run configuration. These are checked before any index
/// construction.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The fixed first station is not in the station list
    #[error("unknown first station: {0}")]
    UnknownFirstStation(String),

    /// The waypoint station is not in the station list
    #[error("unknown waypoint station: {0}")]
    UnknownWaypoint(String),

    /// A time option is malformed
    #[error("unexpected start time argument value: {0}")]
    InvalidTime(#[from] crate::domain::TimeError),

    /// The config file could not be read
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid JSON for an engine config
    #[error("invalid config file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The mandatory waypoint visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaypointConfig {
    /// Station that must be visited.
    pub station: String,

    /// Start of the visit window.
    pub window_start: Clock,

    /// End of the visit window.
    pub window_end: Clock,

    /// Minimum stay at the station (minutes).
    pub min_dwell_mins: i64,
}

impl WaypointConfig {
    /// Returns the minimum stay as a Duration.
    pub fn min_dwell(&self) -> Duration {
        Duration::minutes(self.min_dwell_mins)
    }
}

/// The rules of the travel day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Canonical start of the day; routes begin at this time.
    pub day_start: Clock,

    /// Length of the travel day (minutes), counted from the first departure.
    pub day_length_mins: i64,

    /// Longest wait at a station before boarding (minutes).
    pub max_wait_mins: i64,

    /// Minimum wait before riding straight back to the previous station (minutes).
    pub min_return_wait_mins: i64,

    /// Minutes kept in reserve at the end of the day.
    pub reserve_mins: i64,

    /// Mandatory waypoint, if the rules have one.
    pub waypoint: Option<WaypointConfig>,
}

impl EngineConfig {
    /// The previous edition's rules: a full 24 hour day from midnight.
    pub fn legacy() -> Self {
        Self {
            day_start: Clock::from_minutes(0),
            day_length_mins: 24 * 60,
            max_wait_mins: 59,
            min_return_wait_mins: 3,
            reserve_mins: 1,
            waypoint: Some(WaypointConfig {
                station: DEFAULT_WAYPOINT.to_string(),
                window_start: Clock::from_minutes(10 * 60),
                window_end: Clock::from_minutes(14 * 60),
                min_dwell_mins: 5,
            }),
        }
    }

    /// Read a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns the day length as a Duration.
    pub fn day_length(&self) -> Duration {
        Duration::minutes(self.day_length_mins)
    }

    /// Returns the maximum wait as a Duration.
    pub fn max_wait(&self) -> Duration {
        Duration::minutes(self.max_wait_mins)
    }

    /// Returns the minimum return wait as a Duration.
    pub fn min_return_wait(&self) -> Duration {
        Duration::minutes(self.min_return_wait_mins)
    }

    /// Returns the end-of-day reserve as a Duration.
    pub fn reserve(&self) -> Duration {
        Duration::minutes(self.reserve_mins)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            day_start: Clock::from_minutes(6 * 60),
            day_length_mins: 18 * 60,
            max_wait_mins: 29,
            min_return_wait_mins: 2,
            reserve_mins: 0,
            waypoint: Some(WaypointConfig {
                station: DEFAULT_WAYPOINT.to_string(),
                window_start: Clock::from_minutes(11 * 60),
                window_end: Clock::from_minutes(15 * 60),
                min_dwell_mins: 5,
            }),
        }
    }
}

/// Per-run search choices.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Largest shortfall below the best known distance before a branch is
    /// abandoned. This makes the search approximate.
    pub beam_size: f64,

    /// Only start routes at this station.
    pub first_station: Option<Station>,

    /// Start the search at this time instead of the day start. Only start
    /// legs departing exactly at this time are tried.
    pub start_time: Option<Clock>,

    /// Ignore minimum transfer, return and reserve times and the waypoint.
    pub ignore_transfer_safety: bool,

    /// Discard the persisted bound table before starting.
    pub reset_bounds: bool,

    /// Resume from a previously printed route.
    pub history: Option<PathBuf>,
}

impl SearchOptions {
    /// The time routes are anchored at: the explicit start time, or the day start.
    pub fn origin_time(&self, engine: &EngineConfig) -> Clock {
        self.start_time.unwrap_or(engine.day_start)
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            beam_size: 20.0,
            first_station: None,
            start_time: None,
            ignore_transfer_safety: false,
            reset_bounds: false,
            history: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.day_start.to_string(), "06:00");
        assert_eq!(config.day_length_mins, 18 * 60);
        assert_eq!(config.max_wait_mins, 29);
        assert_eq!(config.min_return_wait_mins, 2);
        assert_eq!(config.reserve_mins, 0);
        let waypoint = config.waypoint.unwrap();
        assert_eq!(waypoint.station, "utrechtcentraal");
        assert_eq!(waypoint.window_start.to_string(), "11:00");
        assert_eq!(waypoint.window_end.to_string(), "15:00");
    }

    #[test]
    fn legacy_config() {
        let config = EngineConfig::legacy();

        assert_eq!(config.day_start.to_string(), "00:00");
        assert_eq!(config.day_length(), Duration::hours(24));
        assert_eq!(config.max_wait(), Duration::minutes(59));
        assert_eq!(config.min_return_wait(), Duration::minutes(3));
        assert_eq!(config.reserve(), Duration::minutes(1));
        assert_eq!(config.waypoint.unwrap().window_start.to_string(), "10:00");
    }

    #[test]
    fn duration_methods() {
        let config = EngineConfig::default();

        assert_eq!(config.day_length(), Duration::hours(18));
        assert_eq!(config.max_wait(), Duration::minutes(29));
        assert_eq!(config.min_return_wait(), Duration::minutes(2));
        assert_eq!(config.reserve(), Duration::zero());
        assert_eq!(config.waypoint.unwrap().min_dwell(), Duration::minutes(5));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"day_start": "08:00", "waypoint": null}"#).unwrap();

        assert_eq!(config.day_start.to_string(), "08:00");
        assert_eq!(config.max_wait_mins, 29);
        assert!(config.waypoint.is_none());
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, serde_json::to_string(&EngineConfig::legacy()).unwrap()).unwrap();

        assert_eq!(EngineConfig::from_json_file(&path).unwrap(), EngineConfig::legacy());
    }

    #[test]
    fn invalid_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"day_start": "6am"}"#).unwrap();

        let err = EngineConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn origin_time_prefers_explicit_start() {
        let engine = EngineConfig::default();
        let mut options = SearchOptions::default();
        assert_eq!(options.origin_time(&engine), engine.day_start);

        options.start_time = Some(Clock::from_minutes(8 * 60));
        assert_eq!(options.origin_time(&engine).to_string(), "08:00");
        assert_eq!(options.beam_size, 20.0);
    }
}
