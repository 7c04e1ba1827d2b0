//! Weight Presets
//!
//! Named weight vectors for the built-in criteria. Projects can add or
//! shadow presets through the `presets` map in the config file.

use std::collections::BTreeMap;

use crate::error::{EntityKind, FinderError, Result};

use super::types::WeightVector;

/// A named weight vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub weights: WeightVector,
}

fn builtin(name: &str, description: &str, pairs: &[(&str, u8)]) -> Preset {
    let mut weights = WeightVector::new();
    for (id, weight) in pairs {
        weights.insert(*id, *weight);
    }
    Preset {
        name: name.to_string(),
        description: description.to_string(),
        weights,
    }
}

/// Built-in presets keyed to the default catalog's criteria
pub fn builtin_presets() -> Vec<Preset> {
    vec![
        builtin(
            "balanced",
            "Every criterion weighted equally",
            &[
                ("scalability", 3),
                ("integrations", 3),
                ("easeOfUse", 3),
                ("flexibility", 3),
                ("portfolioManagement", 3),
                ("reporting", 3),
                ("security", 3),
            ],
        ),
        builtin(
            "enterprise",
            "Large organisations running portfolios under governance",
            &[
                ("scalability", 5),
                ("integrations", 4),
                ("easeOfUse", 2),
                ("flexibility", 3),
                ("portfolioManagement", 5),
                ("reporting", 4),
                ("security", 5),
            ],
        ),
        builtin(
            "agile-team",
            "Delivery teams that value speed and adaptability",
            &[
                ("scalability", 2),
                ("integrations", 4),
                ("easeOfUse", 5),
                ("flexibility", 5),
                ("portfolioManagement", 2),
                ("reporting", 3),
                ("security", 2),
            ],
        ),
        builtin(
            "small-business",
            "Small teams that need something running this week",
            &[
                ("scalability", 1),
                ("integrations", 3),
                ("easeOfUse", 5),
                ("flexibility", 3),
                ("portfolioManagement", 1),
                ("reporting", 2),
                ("security", 2),
            ],
        ),
    ]
}

/// Look up a preset; config-defined presets shadow built-ins of the same name.
pub fn resolve_preset(name: &str, custom: &BTreeMap<String, WeightVector>) -> Result<WeightVector> {
    if let Some(weights) = custom.get(name) {
        return Ok(weights.clone());
    }
    builtin_presets()
        .into_iter()
        .find(|p| p.name == name)
        .map(|p| p.weights)
        .ok_or_else(|| FinderError::not_found(EntityKind::Preset, name))
}

/// All presets available with the given custom set, built-ins first
pub fn list_presets(custom: &BTreeMap<String, WeightVector>) -> Vec<Preset> {
    let mut presets: Vec<Preset> = builtin_presets()
        .into_iter()
        .filter(|p| !custom.contains_key(&p.name))
        .collect();
    for (name, weights) in custom {
        presets.push(Preset {
            name: name.clone(),
            description: "Project preset".to_string(),
            weights: weights.clone(),
        });
    }
    presets
}
