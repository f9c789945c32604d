use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SproError;

/// Coverage needed before a region counts as fully detected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaturationRule {
    pub saturation_threshold: f64,
    pub relative_saturation: bool,
}

impl SaturationRule {
    pub fn absolute(pixels: f64) -> Self {
        Self {
            saturation_threshold: pixels,
            relative_saturation: false,
        }
    }

    pub fn relative(fraction: f64) -> Self {
        Self {
            saturation_threshold: fraction,
            relative_saturation: true,
        }
    }

    pub fn validate(&self, region_id: u32) -> Result<(), SproError> {
        let t = self.saturation_threshold;
        if !t.is_finite() || t <= 0.0 {
            return Err(SproError::InvalidConfig(format!(
                "region {region_id}: saturation_threshold must be a positive finite number, got {t}"
            )));
        }
        if self.relative_saturation && t > 1.0 {
            return Err(SproError::InvalidConfig(format!(
                "region {region_id}: relative saturation_threshold must be in (0, 1], got {t}"
            )));
        }
        Ok(())
    }

    /// Requirement for a region of `area` pixels; always in (0, area] for a
    /// validated rule and a non-empty region.
    pub fn requirement(&self, area: u64) -> f64 {
        let area = area as f64;
        if self.relative_saturation {
            self.saturation_threshold * area
        } else {
            self.saturation_threshold.min(area)
        }
    }
}

/// One entry of a defect list, as found in `defects_config.json` files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaturationEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defect_name: Option<String>,
    pub pixel_value: u32,
    pub saturation_threshold: f64,
    pub relative_saturation: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SaturationConfigRepr {
    Map(BTreeMap<String, SaturationRule>),
    List(Vec<SaturationEntry>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SaturationConfigRepr", into = "BTreeMap<u32, SaturationRule>")]
pub struct SaturationConfig {
    rules: BTreeMap<u32, SaturationRule>,
    names: BTreeMap<u32, String>,
}

impl SaturationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(
        rules: impl IntoIterator<Item = (u32, SaturationRule)>,
    ) -> Result<Self, SproError> {
        let mut config = Self::new();
        for (region_id, rule) in rules {
            config.insert(region_id, rule)?;
        }
        Ok(config)
    }

    pub fn from_entries(entries: Vec<SaturationEntry>) -> Result<Self, SproError> {
        let mut config = Self::new();
        for entry in entries {
            let rule = SaturationRule {
                saturation_threshold: entry.saturation_threshold,
                relative_saturation: entry.relative_saturation,
            };
            if config.rules.contains_key(&entry.pixel_value) {
                return Err(SproError::InvalidConfig(format!(
                    "duplicate entry for pixel_value {}",
                    entry.pixel_value
                )));
            }
            config.insert(entry.pixel_value, rule)?;
            if let Some(name) = entry.defect_name {
                config.names.insert(entry.pixel_value, name);
            }
        }
        Ok(config)
    }

    /// Adds or replaces the rule for `region_id`.
    pub fn insert(&mut self, region_id: u32, rule: SaturationRule) -> Result<(), SproError> {
        if region_id == 0 {
            return Err(SproError::InvalidConfig(
                "region id 0 is background and cannot carry a saturation rule".to_string(),
            ));
        }
        rule.validate(region_id)?;
        self.rules.insert(region_id, rule);
        Ok(())
    }

    pub fn get(&self, region_id: u32) -> Option<&SaturationRule> {
        self.rules.get(&region_id)
    }

    pub fn defect_name(&self, region_id: u32) -> Option<&str> {
        self.names.get(&region_id).map(String::as_str)
    }

    pub fn region_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.rules.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Full area for ids without a rule.
    pub fn requirement(&self, region_id: u32, area: u64) -> f64 {
        match self.rules.get(&region_id) {
            Some(rule) => rule.requirement(area),
            None => area as f64,
        }
    }
}

impl TryFrom<SaturationConfigRepr> for SaturationConfig {
    type Error = SproError;

    fn try_from(repr: SaturationConfigRepr) -> Result<Self, Self::Error> {
        match repr {
            SaturationConfigRepr::List(entries) => Self::from_entries(entries),
            SaturationConfigRepr::Map(map) => {
                let mut rules = Vec::with_capacity(map.len());
                for (key, rule) in map {
                    let region_id = key.trim().parse::<u32>().map_err(|_| {
                        SproError::InvalidConfig(format!("region id {key:?} is not an integer"))
                    })?;
                    rules.push((region_id, rule));
                }
                let mut config = Self::new();
                for (region_id, rule) in rules {
                    if config.rules.contains_key(&region_id) {
                        return Err(SproError::InvalidConfig(format!(
                            "duplicate entry for region id {region_id}"
                        )));
                    }
                    config.insert(region_id, rule)?;
                }
                Ok(config)
            }
        }
    }
}

impl From<SaturationConfig> for BTreeMap<u32, SaturationRule> {
    fn from(config: SaturationConfig) -> Self {
        config.rules
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/saturation.rs"]
mod tests;
