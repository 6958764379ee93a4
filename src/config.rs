use serde::Deserialize;
use std::{fs, io, path::Path};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chebyshev distance in chunks within which players see entities.
    pub view_distance: u8,
    pub tick_millis: u64,
    /// How long the harness runs before exiting.
    pub run_ticks: u32,
    /// Ticks between volleys in the harness.
    pub volley_interval: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            view_distance: 2,
            tick_millis: 50,
            run_ticks: 200,
            volley_interval: 20,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> io::Result<Self> {
        serde_json::from_str(json).map_err(io::Error::from)
    }
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = Config::from_json(r#"{ "view_distance": 6 }"#).unwrap();
        assert_eq!(config.view_distance, 6);
        assert_eq!(config.tick_millis, 50);
        assert_eq!(config, Config { view_distance: 6, ..Config::default() });
    }

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn bad_json_is_invalid_data() {
        let err = Config::from_json(r#"{ "view_distance": -1 }"#).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn unreadable_path_is_not_found() {
        let err = Config::from_path("/definitely/not/here.json").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
