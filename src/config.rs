use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        let config: Config =
            serde_yaml::from_str(&contents).with_context(|| format!("parsing config {}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Compass;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
detector:
  speed_threshold_kmh: 60.0
zones:
  expected_direction: north
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.detector.speed_threshold_kmh, 60.0);
        assert_eq!(config.detector.speed_multiplier, 1.5); // default
        assert_eq!(config.zones.expected_direction, Compass::North);
        assert!(!config.zones.monitored.is_empty()); // default polygon
        assert_eq!(config.cooldowns.illegal_parking_secs, 8.0);
    }

    #[test]
    fn test_empty_yaml_is_all_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.detector.speed_threshold_kmh, 20.0);
        assert_eq!(config.zones.expected_direction, Compass::South);
        assert_eq!(config.logging.level, "info");
    }
}
