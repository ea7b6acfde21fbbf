use serde::Deserialize;
use std::path::Path;

/// Tuning and housekeeping for the decision engine, loaded from TOML.
///
/// The thresholds are game-balance values from play testing; they are kept
/// as-is rather than derived from each other.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_target_hits")]
    pub max_target_hits: usize,
    #[serde(default = "default_danger_radius")]
    pub danger_radius: u32,
    #[serde(default = "default_stuck_turns")]
    pub stuck_turns: u32,
    #[serde(default = "default_acid_avoid_until_turn")]
    pub acid_avoid_until_turn: u32,
    #[serde(default = "default_home_block_max_units")]
    pub home_block_max_units: usize,
    #[serde(default = "default_fighter_zone_max_units")]
    pub fighter_zone_max_units: usize,
    #[serde(default = "default_contested_food_radius")]
    pub contested_food_radius: u32,
    #[serde(default = "default_contested_food_min_enemies")]
    pub contested_food_min_enemies: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_slow_unit_warn_ms")]
    pub slow_unit_warn_ms: u64,
    #[serde(default = "default_state_directory")]
    pub state_directory: String,
    #[serde(default = "default_max_snapshots")]
    pub max_snapshots: u32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_target_hits() -> usize {
    10
}
fn default_danger_radius() -> u32 {
    4
}
fn default_stuck_turns() -> u32 {
    5
}
fn default_acid_avoid_until_turn() -> u32 {
    200
}
fn default_home_block_max_units() -> usize {
    100
}
fn default_fighter_zone_max_units() -> usize {
    70
}
fn default_contested_food_radius() -> u32 {
    3
}
fn default_contested_food_min_enemies() -> usize {
    3
}
fn default_slow_unit_warn_ms() -> u64 {
    100
}
fn default_state_directory() -> String {
    "./state".to_string()
}
fn default_max_snapshots() -> u32 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_target_hits: default_max_target_hits(),
            danger_radius: default_danger_radius(),
            stuck_turns: default_stuck_turns(),
            acid_avoid_until_turn: default_acid_avoid_until_turn(),
            home_block_max_units: default_home_block_max_units(),
            fighter_zone_max_units: default_fighter_zone_max_units(),
            contested_food_radius: default_contested_food_radius(),
            contested_food_min_enemies: default_contested_food_min_enemies(),
            seed: 0,
            slow_unit_warn_ms: default_slow_unit_warn_ms(),
            state_directory: default_state_directory(),
            max_snapshots: default_max_snapshots(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    /// Like `from_file`, but a missing file yields the defaults.
    pub fn from_file_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        if self.max_target_hits == 0 {
            errors.push(format!(
                "max_target_hits must be > 0, got {}. Example: max_target_hits = 10",
                self.max_target_hits
            ));
        }

        if self.danger_radius == 0 {
            errors.push(format!(
                "danger_radius must be > 0, got {}. Example: danger_radius = 4",
                self.danger_radius
            ));
        }

        if self.contested_food_min_enemies == 0 {
            errors.push(format!(
                "contested_food_min_enemies must be > 0, got {}. Example: contested_food_min_enemies = 3",
                self.contested_food_min_enemies
            ));
        }

        if self.max_snapshots == 0 {
            errors.push(format!(
                "max_snapshots must be > 0, got {}. Example: max_snapshots = 10",
                self.max_snapshots
            ));
        }

        if self.state_directory.trim().is_empty() {
            errors.push(
                "state_directory must not be empty. Example: state_directory = \"./state\""
                    .to_string(),
            );
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
