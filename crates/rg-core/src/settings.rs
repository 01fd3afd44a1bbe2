//! Tuning parameters for layout generation and collectable distribution

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::layout::RoomId;

/// Placement engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Rebases allowed in one run before it gives up
    ///
    /// This is a single budget for the whole run, shared by every chain.
    /// Each resume of an earlier decision point spends one rebase; decision
    /// points with no candidates left are dropped without cost. The default
    /// of 100 is enough for small cyclic graphs, but long rings (around 16
    /// rooms) exhaust it on most seeds, so raise it for large cycles.
    pub max_rebases: usize,

    /// Split chains longer than this many edges (None = no splitting)
    pub max_branch_length: Option<usize>,

    /// Upper bound on the candidates drawn for a single placement step
    pub max_candidates_per_step: usize,

    /// Let edges with a room chance materialize as their own rooms
    pub allow_edge_rooms: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            max_rebases: 100,
            max_branch_length: None,
            max_candidates_per_step: 512,
            allow_edge_rooms: true,
        }
    }
}

impl GeneratorSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_rebases == 0 {
            return Err(LayoutError::InvalidSettings(
                "max_rebases must be at least 1".to_string(),
            ));
        }
        if self.max_branch_length == Some(0) {
            return Err(LayoutError::InvalidSettings(
                "max_branch_length must be at least 1".to_string(),
            ));
        }
        if self.max_candidates_per_step == 0 {
            return Err(LayoutError::InvalidSettings(
                "max_candidates_per_step must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Collectable distributor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectableSettings {
    /// Spot weight is multiplied by (distance + 1) raised to this power
    pub distance_exponent: f64,

    /// Room distances are measured from; defaults to the first room by id
    pub initial_distance_room: Option<RoomId>,
}

impl Default for CollectableSettings {
    fn default() -> Self {
        Self {
            distance_exponent: 1.0,
            initial_distance_room: None,
        }
    }
}

impl CollectableSettings {
    pub fn validate(&self) -> Result<()> {
        if !self.distance_exponent.is_finite() || self.distance_exponent < 0.0 {
            return Err(LayoutError::InvalidSettings(format!(
                "distance_exponent must be a non-negative number, got {}",
                self.distance_exponent
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(GeneratorSettings::default().max_rebases, 100);
        assert!(GeneratorSettings::default().validate().is_ok());
        assert!(CollectableSettings::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_limits() {
        let settings = GeneratorSettings {
            max_rebases: 0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(LayoutError::InvalidSettings(_))
        ));

        let settings = GeneratorSettings {
            max_branch_length: Some(0),
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = CollectableSettings {
            distance_exponent: f64::NAN,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: GeneratorSettings =
            serde_json::from_str(r#"{ "max_branch_length": 4 }"#).unwrap();
        assert_eq!(settings.max_branch_length, Some(4));
        assert_eq!(settings.max_rebases, 100);
    }
}
