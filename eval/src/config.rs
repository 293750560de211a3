//! Evaluation configuration (`eval.toml`).
//!
//! Every field has a default matching the Metrc California sandbox, so the
//! file is optional. Missing sections fall back to their defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "eval.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvalConfig {
    /// Metrc deployment; also the prefix of every recorded request.
    pub base_url: String,

    /// License every call is scoped to.
    pub license_number: String,

    /// Location type name used for the created location.
    pub location_type: String,

    /// What to do with the created location/strain once rows are recorded.
    pub cleanup: CleanupPolicy,

    pub correlation: CorrelationConfig,

    pub item_profile: ItemProfile,

    pub strain_profile: StrainProfile,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sandbox-api-ca.metrc.com".to_string(),
            license_number: "C12-1000006-LIC".to_string(),
            location_type: "Default Location type".to_string(),
            cleanup: CleanupPolicy::default(),
            correlation: CorrelationConfig::default(),
            item_profile: ItemProfile::default(),
            strain_profile: StrainProfile::default(),
        }
    }
}

/// Cleanup behaviour after a locations or strains cycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Delete; a failed delete fails the whole cycle.
    #[default]
    Propagate,
    /// Delete; a failed delete is logged and the bundle is still returned.
    Warn,
    /// Keep the created records.
    Skip,
}

/// How a freshly created record is looked up in the active listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Listings fetched before giving up. `1` is a single immediate re-fetch.
    pub attempts: u32,
    /// Pause before the second listing; doubled after every further miss.
    pub backoff_ms: u64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff_ms: 500,
        }
    }
}

impl CorrelationConfig {
    /// Delay before listing attempt `attempt` (0-based). The first is immediate.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u64 << (attempt - 1).min(16);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ItemProfile {
    pub category: String,
    pub strain: String,
    pub unit_of_measure: String,
    /// Unit of measure submitted by the update step.
    pub updated_unit_of_measure: String,
    pub unit_thc_content: f64,
    pub unit_thc_content_unit_of_measure: String,
    pub unit_thc_content_dose: f64,
    pub unit_thc_content_dose_unit_of_measure: String,
    pub unit_weight: f64,
    pub unit_weight_unit_of_measure: String,
    pub number_of_doses: u32,
}

impl Default for ItemProfile {
    fn default() -> Self {
        Self {
            category: "Capsule (weight)".to_string(),
            strain: "Spring Hill Kush".to_string(),
            unit_of_measure: "Ounces".to_string(),
            updated_unit_of_measure: "Milligrams".to_string(),
            unit_thc_content: 10.0,
            unit_thc_content_unit_of_measure: "Milligrams".to_string(),
            unit_thc_content_dose: 5.0,
            unit_thc_content_dose_unit_of_measure: "Milligrams".to_string(),
            unit_weight: 100.0,
            unit_weight_unit_of_measure: "Milligrams".to_string(),
            number_of_doses: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StrainProfile {
    pub testing_status: String,
    pub thc_level: f64,
    pub cbd_level: f64,
    pub indica_percentage: f64,
    pub sativa_percentage: f64,
}

impl Default for StrainProfile {
    fn default() -> Self {
        Self {
            testing_status: "None".to_string(),
            thc_level: 0.185,
            cbd_level: 0.275,
            indica_percentage: 25.0,
            sativa_percentage: 75.0,
        }
    }
}

impl EvalConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            bail!("base_url must be an http(s) URL, got {:?}", self.base_url);
        }
        if self.license_number.trim().is_empty() {
            bail!("license_number must be non-empty");
        }
        if self.location_type.trim().is_empty() {
            bail!("location_type must be non-empty");
        }
        if self.correlation.attempts == 0 {
            bail!("correlation.attempts must be > 0");
        }
        let item = &self.item_profile;
        if item.category.trim().is_empty() || item.strain.trim().is_empty() {
            bail!("item_profile.category and item_profile.strain must be non-empty");
        }
        if item.unit_of_measure == item.updated_unit_of_measure {
            bail!("item_profile.updated_unit_of_measure must differ from unit_of_measure");
        }
        let strain = &self.strain_profile;
        if strain.indica_percentage + strain.sativa_percentage > 100.0 {
            bail!("strain_profile indica + sativa percentages must not exceed 100");
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize config toml")
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EvalConfig::default()`.
pub fn load_config(path: &Path) -> Result<EvalConfig> {
    if !path.exists() {
        let cfg = EvalConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EvalConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, EvalConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("eval.toml");
        fs::write(
            &path,
            "license_number = \"C12-0000001-LIC\"\ncleanup = \"warn\"\n\n[correlation]\nattempts = 3\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.license_number, "C12-0000001-LIC");
        assert_eq!(cfg.cleanup, CleanupPolicy::Warn);
        assert_eq!(cfg.correlation.attempts, 3);
        assert_eq!(cfg.correlation.backoff_ms, 500);
        assert_eq!(cfg.base_url, EvalConfig::default().base_url);
    }

    #[test]
    fn serialized_default_parses_back() {
        let cfg = EvalConfig::default();
        let text = cfg.to_toml().expect("toml");
        let parsed: EvalConfig = toml::from_str(&text).expect("parse");
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn rejects_zero_attempts() {
        let mut cfg = EvalConfig::default();
        cfg.correlation.attempts = 0;
        let err = cfg.validate().expect_err("invalid");
        assert!(err.to_string().contains("correlation.attempts"));
    }

    #[test]
    fn rejects_update_that_changes_nothing() {
        let mut cfg = EvalConfig::default();
        cfg.item_profile.updated_unit_of_measure = cfg.item_profile.unit_of_measure.clone();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let cfg = EvalConfig {
            base_url: "sandbox-api-ca.metrc.com".to_string(),
            ..EvalConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn backoff_doubles_after_first_retry() {
        let correlation = CorrelationConfig {
            attempts: 4,
            backoff_ms: 100,
        };
        assert_eq!(correlation.delay_before(0), Duration::ZERO);
        assert_eq!(correlation.delay_before(1), Duration::from_millis(100));
        assert_eq!(correlation.delay_before(2), Duration::from_millis(200));
        assert_eq!(correlation.delay_before(3), Duration::from_millis(400));
    }
}
