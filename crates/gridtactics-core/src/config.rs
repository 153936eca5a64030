//! Orchestrator configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```
//! use gridtactics_core::config::ManagerConfig;
//!
//! let config = ManagerConfig::from_json(r#"{ "max_recursion_depth": 5 }"#).unwrap();
//! assert_eq!(config.max_recursion_depth, 5);
//! assert!((config.wall_crash_damage - 10.0).abs() < f32::EPSILON);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{DisplacementError, DisplacementResult};
use crate::request::{DEFAULT_CHAIN_DECAY, DEFAULT_DASH_DURATION, DEFAULT_KNOCKBACK_DURATION};

/// Default bound on knockback chain generations.
pub const DEFAULT_MAX_RECURSION_DEPTH: u32 = 3;

/// Default damage dealt when a knockback slams an actor into a wall.
pub const DEFAULT_WALL_CRASH_DAMAGE: f32 = 10.0;

/// Default animation time for a teleport, in seconds.
pub const DEFAULT_TELEPORT_DURATION: f32 = 0.1;

/// Tunables for [`GridManager`](crate::manager::GridManager).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Maximum number of knockback generations processed per pipeline run
    pub max_recursion_depth: u32,
    /// Damage applied by a knockback that ends against a wall or the board edge
    pub wall_crash_damage: f32,
    /// Animation time of generated and requested knockbacks
    pub knockback_duration: f32,
    /// Animation time of requested dashes
    pub dash_duration: f32,
    /// Animation time of requested teleports
    pub teleport_duration: f32,
    /// Default chain decay for requests that enable chain knockback
    pub chain_decay: f32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            wall_crash_damage: DEFAULT_WALL_CRASH_DAMAGE,
            knockback_duration: DEFAULT_KNOCKBACK_DURATION,
            dash_duration: DEFAULT_DASH_DURATION,
            teleport_duration: DEFAULT_TELEPORT_DURATION,
            chain_decay: DEFAULT_CHAIN_DECAY,
        }
    }
}

impl ManagerConfig {
    /// Parses and validates a JSON config.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::Parse`] for malformed JSON and
    /// [`DisplacementError::InvalidConfig`] for out-of-range values.
    pub fn from_json(json: &str) -> DisplacementResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> DisplacementResult<()> {
        if self.wall_crash_damage.is_nan() || self.wall_crash_damage < 0.0 {
            return Err(DisplacementError::InvalidConfig(format!(
                "wall_crash_damage must be >= 0, got {}",
                self.wall_crash_damage
            )));
        }
        for (name, value) in [
            ("knockback_duration", self.knockback_duration),
            ("dash_duration", self.dash_duration),
            ("teleport_duration", self.teleport_duration),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(DisplacementError::InvalidConfig(format!(
                    "{name} must be >= 0, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.chain_decay) {
            return Err(DisplacementError::InvalidConfig(format!(
                "chain_decay must be in [0, 1], got {}",
                self.chain_decay
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.max_recursion_depth, 3);
        assert!((config.wall_crash_damage - 10.0).abs() < f32::EPSILON);
        assert!((config.knockback_duration - 0.2).abs() < f32::EPSILON);
        assert!((config.dash_duration - 0.3).abs() < f32::EPSILON);
        assert!((config.chain_decay - 0.5).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(ManagerConfig::from_json("{}").unwrap(), ManagerConfig::default());
    }

    #[test]
    fn json_round_trip() {
        let config = ManagerConfig {
            max_recursion_depth: 1,
            wall_crash_damage: 4.5,
            ..ManagerConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ManagerConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn rejects_out_of_range_values() {
        for json in [
            r#"{ "wall_crash_damage": -1.0 }"#,
            r#"{ "dash_duration": -0.1 }"#,
            r#"{ "chain_decay": 1.5 }"#,
        ] {
            assert!(matches!(
                ManagerConfig::from_json(json),
                Err(DisplacementError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            ManagerConfig::from_json("{ not json"),
            Err(DisplacementError::Parse(_))
        ));
    }
}
