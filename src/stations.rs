//! Stations polled each cycle.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::parser::LastData;

/// A weather station on the public feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Station {
    pub name: String,
    /// Opaque public slug identifying the device on the feed.
    pub slug: String,
}

impl Station {
    pub fn new(name: &str, slug: &str) -> Self {
        Self {
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    /// Lower-cased name used as the element id prefix.
    pub fn id(&self) -> String {
        self.name.to_lowercase()
    }
}

/// What one station reported this cycle. `data` is `None` when the fetch or
/// parse failed.
#[derive(Debug, Clone)]
pub struct StationSnapshot {
    pub station: Station,
    pub data: Option<LastData>,
}

/// Ordered list of stations.
///
/// Stored on disk as a JSON array:
/// ```json
/// [
///   { "name": "Philippe", "slug": "216ccd7e9663b597d059694c2b68cd60" },
///   { "name": "Ken", "slug": "e0e95053fed772de0e60444fc4ff88c8" }
/// ]
/// ```
#[derive(Debug, Clone)]
pub struct StationConfig {
    stations: Vec<Station>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            stations: vec![
                Station::new("Philippe", "216ccd7e9663b597d059694c2b68cd60"),
                Station::new("Ken", "e0e95053fed772de0e60444fc4ff88c8"),
                Station::new("Brian", "fbbe2845876465d1a954e5e49d757bfa"),
            ],
        }
    }
}

impl StationConfig {
    /// Builds a config, rejecting empty lists and duplicate names.
    pub fn new(stations: Vec<Station>) -> Result<Self> {
        if stations.is_empty() {
            bail!("at least one station must be configured");
        }
        let mut seen = HashSet::new();
        for station in &stations {
            if !seen.insert(station.id()) {
                bail!("duplicate station name '{}'", station.name);
            }
        }
        Ok(Self { stations })
    }

    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read station config '{path}'"))?;
        let stations: Vec<Station> = serde_json::from_str(&content)
            .with_context(|| format!("invalid station config '{path}'"))?;
        Self::new(stations)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_default_has_three_stations() {
        let config = StationConfig::default();
        let names: Vec<_> = config.stations().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Philippe", "Ken", "Brian"]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = StationConfig::new(vec![Station::new("Ken", "a"), Station::new("ken", "b")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(StationConfig::new(vec![]).is_err());
    }

    #[test]
    fn test_load_keeps_order() {
        let path = temp_path("station_leaderboard_test_stations.json");
        fs::write(
            &path,
            r#"[{"name":"Zed","slug":"z1"},{"name":"Amy","slug":"a1"}]"#,
        )
        .unwrap();

        let config = StationConfig::load(&path).unwrap();
        assert_eq!(config.stations()[0], Station::new("Zed", "z1"));
        assert_eq!(config.stations()[1].id(), "amy");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        assert!(StationConfig::load("/nonexistent/stations.json").is_err());
    }
}
