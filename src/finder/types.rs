//! Finder Types
//!
//! Plain records for the catalog (criteria and tools) and the weight vector.
//! Field names follow the catalog JSON format (camelCase).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{FinderError, Result};

/// Lowest weight a user can assign to a criterion
pub const MIN_WEIGHT: u8 = 1;
/// Highest weight a user can assign to a criterion
pub const MAX_WEIGHT: u8 = 5;
/// Weight of a criterion nobody has touched
pub const DEFAULT_WEIGHT: u8 = 3;

pub const MIN_RATING: u8 = 1;
/// Best attainable curator rating, used as the score denominator
pub const MAX_RATING: u8 = 5;
/// Rating assumed when a tool has no rating for a criterion
pub const NEUTRAL_RATING: u8 = 3;

fn default_weight() -> u8 {
    DEFAULT_WEIGHT
}

/// A weighted evaluation dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current weight; in a catalog file this is the default weight
    #[serde(default = "default_weight")]
    pub weight: u8,
}

impl Criterion {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            weight: DEFAULT_WEIGHT,
        }
    }

    pub fn with_weight(mut self, weight: u8) -> Self {
        self.weight = weight;
        self
    }
}

/// A tag attached to a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,

    pub name: String,

    /// Semantic category, e.g. "Methodology"; general tags use "tag"
    #[serde(rename = "type", default = "default_tag_type")]
    pub tag_type: String,
}

fn default_tag_type() -> String {
    "tag".to_string()
}

impl Tag {
    pub fn new(id: impl Into<String>, name: impl Into<String>, tag_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tag_type: tag_type.into(),
        }
    }

    /// Case-insensitive match on either the tag id or its display name
    pub fn matches(&self, selector: &str) -> bool {
        self.id.eq_ignore_ascii_case(selector) || self.name.eq_ignore_ascii_case(selector)
    }
}

/// A candidate project/portfolio management tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    /// Curator ratings keyed by criterion id, each in [1,5]
    #[serde(default)]
    pub criteria_ratings: BTreeMap<String, u8>,
}

impl Tool {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            tags: Vec::new(),
            criteria_ratings: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_rating(mut self, criterion_id: impl Into<String>, rating: u8) -> Self {
        self.criteria_ratings.insert(criterion_id.into(), rating);
        self
    }

    /// Explicit curator rating, if any
    pub fn rating(&self, criterion_id: &str) -> Option<u8> {
        self.criteria_ratings.get(criterion_id).copied()
    }

    pub fn has_tag(&self, selector: &str) -> bool {
        self.tags.iter().any(|t| t.matches(selector))
    }

    /// Tags of a given semantic type (e.g. all methodologies)
    pub fn tags_of_type<'a>(&'a self, tag_type: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags
            .iter()
            .filter(move |t| t.tag_type.eq_ignore_ascii_case(tag_type))
    }
}

/// Read-only session snapshot of criteria and tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub criteria: Vec<Criterion>,

    #[serde(default)]
    pub tools: Vec<Tool>,
}

impl Catalog {
    pub fn new(criteria: Vec<Criterion>, tools: Vec<Tool>) -> Self {
        Self {
            version: None,
            criteria,
            tools,
        }
    }

    /// Check ids are unique and every weight and rating is in range.
    ///
    /// Ratings for criteria outside the catalog are left in place and only
    /// reported; scoring never looks them up.
    pub fn validate(&self) -> Result<()> {
        let mut criterion_ids = HashSet::new();
        for criterion in &self.criteria {
            if criterion.id.trim().is_empty() {
                return Err(FinderError::config("criterion with an empty id"));
            }
            if !criterion_ids.insert(criterion.id.as_str()) {
                return Err(FinderError::config(format!(
                    "duplicate criterion id '{}'",
                    criterion.id
                )));
            }
            if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&criterion.weight) {
                return Err(FinderError::config(format!(
                    "criterion '{}' has default weight {} outside [{}, {}]",
                    criterion.id, criterion.weight, MIN_WEIGHT, MAX_WEIGHT
                )));
            }
        }

        let mut tool_ids = HashSet::new();
        for tool in &self.tools {
            if tool.id.trim().is_empty() {
                return Err(FinderError::config("tool with an empty id"));
            }
            if !tool_ids.insert(tool.id.as_str()) {
                return Err(FinderError::config(format!("duplicate tool id '{}'", tool.id)));
            }
            for (criterion_id, rating) in &tool.criteria_ratings {
                if !(MIN_RATING..=MAX_RATING).contains(rating) {
                    return Err(FinderError::config(format!(
                        "tool '{}' rates '{}' as {} outside [{}, {}]",
                        tool.id, criterion_id, rating, MIN_RATING, MAX_RATING
                    )));
                }
                if !criterion_ids.contains(criterion_id.as_str()) {
                    tracing::warn!(
                        "Tool '{}' rates unknown criterion '{}'; rating ignored",
                        tool.id,
                        criterion_id
                    );
                }
            }
        }

        Ok(())
    }

    pub fn tool(&self, id: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.id == id)
    }

    pub fn contains_tool(&self, id: &str) -> bool {
        self.tool(id).is_some()
    }

    /// Catalog order of a tool, used as the last tie-break
    pub fn position(&self, id: &str) -> Option<usize> {
        self.tools.iter().position(|t| t.id == id)
    }

    pub fn criterion(&self, id: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.id == id)
    }

    /// Every distinct tag in the catalog, in first-seen order
    pub fn all_tags(&self) -> Vec<&Tag> {
        let mut seen = HashSet::new();
        self.tools
            .iter()
            .flat_map(|t| t.tags.iter())
            .filter(|t| seen.insert(t.id.as_str()))
            .collect()
    }
}

/// Criterion id → weight. Ordered so that sums never depend on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector(BTreeMap<String, u8>);

impl WeightVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit pairs. A weight of 0 is accepted and means the
    /// criterion takes no part in scoring.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u8)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (id, weight) in pairs {
            let id = id.into();
            if weight > MAX_WEIGHT {
                return Err(FinderError::validation(format!(
                    "weight {} for '{}' exceeds {}",
                    weight, id, MAX_WEIGHT
                )));
            }
            map.insert(id, weight);
        }
        Ok(Self(map))
    }

    pub fn get(&self, criterion_id: &str) -> Option<u8> {
        self.0.get(criterion_id).copied()
    }

    pub(crate) fn insert(&mut self, criterion_id: impl Into<String>, weight: u8) {
        self.0.insert(criterion_id.into(), weight);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Σ w_i
    pub fn total(&self) -> u32 {
        self.0.values().map(|w| *w as u32).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
