//! Configuration
//!
//! Project configuration loading and defaults. Read from `.ppm-finder.json`
//! (or a YAML file passed explicitly); every field has a default so an empty
//! object is a valid config.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::finder::filter::FilterMode;
use crate::finder::loader::is_yaml;
use crate::finder::scoring::ScoringOptions;
use crate::finder::selection::DEFAULT_COMPARISON_LIMIT;
use crate::finder::types::{
    WeightVector, MAX_RATING, MAX_WEIGHT, MIN_RATING, MIN_WEIGHT, NEUTRAL_RATING,
};

/// Default config file name in the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".ppm-finder.json";

fn default_comparison_limit() -> usize {
    DEFAULT_COMPARISON_LIMIT
}

fn default_score_precision() -> u32 {
    1
}

fn default_neutral_rating() -> u8 {
    NEUTRAL_RATING
}

/// Main finder configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinderConfig {
    /// Project catalog merged over the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,

    /// Question table replacing the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<PathBuf>,

    /// Maximum number of tools compared side by side
    #[serde(default = "default_comparison_limit")]
    pub comparison_limit: usize,

    /// Decimal places kept in match scores
    #[serde(default = "default_score_precision")]
    pub score_precision: u32,

    /// Rating assumed for criteria a tool has no rating for
    #[serde(default = "default_neutral_rating")]
    pub neutral_rating: u8,

    /// Initial filter combination mode
    #[serde(default)]
    pub filter_mode: FilterMode,

    /// Project weight presets, shadowing built-ins of the same name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub presets: BTreeMap<String, WeightVector>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            questions: None,
            comparison_limit: default_comparison_limit(),
            score_precision: default_score_precision(),
            neutral_rating: default_neutral_rating(),
            filter_mode: FilterMode::default(),
            presets: BTreeMap::new(),
        }
    }
}

impl FinderConfig {
    /// Load config from a JSON or YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Save config to a file (always JSON)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load a config file, or defaults if there is none. A file that
    /// exists but fails to parse or validate is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.neutral_rating) {
            return Err(crate::FinderError::config(format!(
                "neutralRating {} is outside [{}, {}]",
                self.neutral_rating, MIN_RATING, MAX_RATING
            )));
        }
        if self.comparison_limit == 0 {
            return Err(crate::FinderError::config("comparisonLimit must be at least 1"));
        }
        if self.score_precision > 6 {
            return Err(crate::FinderError::config("scorePrecision must be at most 6"));
        }
        for (name, weights) in &self.presets {
            if let Some((criterion, weight)) = weights
                .iter()
                .find(|(_, w)| !(MIN_WEIGHT..=MAX_WEIGHT).contains(w))
            {
                return Err(crate::FinderError::config(format!(
                    "preset '{}' weight {} for '{}' is outside [{}, {}]",
                    name, weight, criterion, MIN_WEIGHT, MAX_WEIGHT
                )));
            }
        }
        Ok(())
    }

    pub fn scoring_options(&self) -> ScoringOptions {
        ScoringOptions {
            neutral_rating: self.neutral_rating,
            precision: self.score_precision,
        }
    }
}
