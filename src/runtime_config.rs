// =============================================================================
// Runtime Configuration — form limits and service settings with atomic save
// =============================================================================
//
// Holds every tunable the planner service exposes: how many purchase entries
// the form accepts, the slider defaults the form renders, and how much plan
// history the service retains.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields never
// breaks loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_max_purchases() -> usize {
    10
}

fn default_max_recent_plans() -> usize {
    100
}

fn default_multiplier() -> u32 {
    3
}

fn default_stages() -> u32 {
    3
}

fn default_price_step() -> f64 {
    0.01
}

fn default_amount_step() -> f64 {
    1e-9
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the Borealis exit planner.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly. Multiplier and stage-count bounds are not
/// here: they are fixed constants in the validation module, tied to the stage
/// fraction tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Form limits ----------------------------------------------------------

    /// Maximum number of purchase entries per submission.
    #[serde(default = "default_max_purchases")]
    pub max_purchases: usize,

    // --- Form defaults (what the input collector pre-selects) ------------------

    /// Multiplier the form pre-selects.
    #[serde(default = "default_multiplier")]
    pub default_multiplier: u32,

    /// Stage count the form pre-selects.
    #[serde(default = "default_stages")]
    pub default_stages: u32,

    /// Smallest price increment the form should offer.
    #[serde(default = "default_price_step")]
    pub price_step: f64,

    /// Smallest token-amount increment the form should offer. Amounts need at
    /// least 9 decimal digits of precision.
    #[serde(default = "default_amount_step")]
    pub amount_step: f64,

    // --- Service settings -------------------------------------------------------

    /// Maximum number of computed plans kept in the in-memory history.
    #[serde(default = "default_max_recent_plans")]
    pub max_recent_plans: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_purchases: default_max_purchases(),
            default_multiplier: default_multiplier(),
            default_stages: default_stages(),
            price_step: default_price_step(),
            amount_step: default_amount_step(),
            max_recent_plans: default_max_recent_plans(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            max_purchases = config.max_purchases,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    ///
    /// This prevents corruption if the process crashes mid-write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        // Atomic write: write to a temporary sibling file, then rename.
        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.max_purchases, 10);
        assert_eq!(cfg.default_multiplier, 3);
        assert_eq!(cfg.default_stages, 3);
        assert!((cfg.price_step - 0.01).abs() < f64::EPSILON);
        assert!((cfg.amount_step - 1e-9).abs() < f64::EPSILON);
        assert_eq!(cfg.max_recent_plans, 100);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RuntimeConfig::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "max_purchases": 5, "default_stages": 2 }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.max_purchases, 5);
        assert_eq!(cfg.default_stages, 2);
        assert_eq!(cfg.default_multiplier, 3);
        assert_eq!(cfg.max_recent_plans, 100);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = RuntimeConfig {
            max_purchases: 7,
            default_multiplier: 2,
            default_stages: 4,
            price_step: 0.001,
            amount_step: 1e-8,
            max_recent_plans: 25,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, cfg2);
    }
}
