use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::profile::DEFAULT_WEEKLY_GOAL;

/// Configuration for tracking and statistics.
///
/// Stored as `config.toml` at the root of the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The weekly goal given to newly created profiles.
    default_weekly_goal: f64,

    /// Money saved each time a non-alcoholic drink is chosen.
    ///
    /// Used for the illustrative savings estimate only.
    savings_per_alternative: f64,

    /// The period over which non-alcoholic drinks are counted for savings.
    pub savings_window: SavingsWindow,
}

/// The period over which savings are estimated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsWindow {
    /// The current Sunday to Saturday week.
    Week,
    /// The current calendar month.
    #[default]
    Month,
    /// Every event in the log.
    All,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_weekly_goal: DEFAULT_WEEKLY_GOAL,
            savings_per_alternative: default_savings_per_alternative(),
            savings_window: SavingsWindow::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// The weekly goal given to new profiles. Never negative.
    #[must_use]
    pub const fn default_weekly_goal(&self) -> f64 {
        self.default_weekly_goal
    }

    /// Savings attributed to each non-alcoholic drink. Never negative.
    #[must_use]
    pub const fn savings_per_alternative(&self) -> f64 {
        self.savings_per_alternative
    }

    /// Sets the weekly goal given to new profiles.
    pub const fn set_default_weekly_goal(&mut self, units: f64) {
        self.default_weekly_goal = non_negative(units, DEFAULT_WEEKLY_GOAL);
    }

    /// Sets the per-drink savings rate.
    pub const fn set_savings_per_alternative(&mut self, rate: f64) {
        self.savings_per_alternative = non_negative(rate, 0.0);
    }
}

const fn default_savings_per_alternative() -> f64 {
    2.5
}

const fn default_weekly_goal() -> f64 {
    DEFAULT_WEEKLY_GOAL
}

/// Coerce a configured number to a finite, non-negative value.
const fn non_negative(value: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        fallback
    } else if value < 0.0 {
        0.0
    } else {
        value
    }
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_weekly_goal")]
        default_weekly_goal: f64,

        #[serde(default = "default_savings_per_alternative")]
        savings_per_alternative: f64,

        #[serde(default)]
        savings_window: SavingsWindow,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                default_weekly_goal,
                savings_per_alternative,
                savings_window,
            } => Self {
                default_weekly_goal: non_negative(default_weekly_goal, DEFAULT_WEEKLY_GOAL),
                savings_per_alternative: non_negative(savings_per_alternative, 0.0),
                savings_window,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            default_weekly_goal: config.default_weekly_goal,
            savings_per_alternative: config.savings_per_alternative,
            savings_window: config.savings_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\ndefault_weekly_goal = 14.0\nsavings_per_alternative = 4.0\nsavings_window = \"week\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert!((config.default_weekly_goal() - 14.0).abs() < f64::EPSILON);
        assert!((config.savings_per_alternative() - 4.0).abs() < f64::EPSILON);
        assert_eq!(config.savings_window, SavingsWindow::Week);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\ndefault_weekly_goal = \"ten\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn negative_values_are_clamped_on_load() {
        let config: Config = toml::from_str(
            "_version = \"1\"\ndefault_weekly_goal = -1.0\nsavings_per_alternative = -2.0\n",
        )
        .unwrap();
        assert!(config.default_weekly_goal().abs() < f64::EPSILON);
        assert!(config.savings_per_alternative().abs() < f64::EPSILON);
    }

    #[test]
    fn save_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        let mut config = Config::default();
        config.set_savings_per_alternative(3.0);
        config.savings_window = SavingsWindow::All;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
