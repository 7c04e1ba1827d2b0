//! Filter Engine
//!
//! Tag-based inclusion over the tool catalog. A condition matches a tool when
//! the tool carries at least one of the condition's tags; conditions are then
//! combined with AND or OR.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{EntityKind, FinderError, Result};

use super::types::Tool;

/// Accepted shape of a single tag selector entry
static SELECTOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w][\w .&/+#()-]*$").unwrap());

/// How conditions combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Tool must match every condition
    And,
    /// Tool must match any condition
    #[default]
    Or,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::And => "and",
            FilterMode::Or => "or",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            FilterMode::And => FilterMode::Or,
            FilterMode::Or => FilterMode::And,
        }
    }
}

impl std::str::FromStr for FilterMode {
    type Err = FinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "and" | "all" => Ok(FilterMode::And),
            "or" | "any" => Ok(FilterMode::Or),
            _ => Err(FinderError::validation(format!("unknown filter mode '{}'", s))),
        }
    }
}

/// A tag-based predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawFilterCondition")]
pub struct FilterCondition {
    pub id: String,

    /// Tag ids or names; one hit is enough
    pub tag_selector: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilterCondition {
    id: String,
    #[serde(default)]
    tag_selector: Vec<String>,
}

impl TryFrom<RawFilterCondition> for FilterCondition {
    type Error = FinderError;

    fn try_from(raw: RawFilterCondition) -> Result<Self> {
        FilterCondition::new(raw.id, raw.tag_selector)
    }
}

impl FilterCondition {
    /// Build a condition, trimming and de-duplicating the selector.
    pub fn new<I, S>(id: impl Into<String>, tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selector: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.as_ref().trim();
            if !selector.iter().any(|s| s.eq_ignore_ascii_case(tag)) {
                selector.push(tag.to_string());
            }
        }

        let condition = Self {
            id: id.into(),
            tag_selector: selector,
        };
        condition.validate()?;
        Ok(condition)
    }

    /// Check a condition that may have been assembled field by field
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(FinderError::validation("filter condition id must not be empty"));
        }
        if self.tag_selector.is_empty() {
            return Err(FinderError::validation(format!(
                "condition '{}' has an empty tag selector",
                self.id
            )));
        }
        if let Some(bad) = self.tag_selector.iter().find(|t| !SELECTOR_PATTERN.is_match(t)) {
            return Err(FinderError::validation(format!(
                "malformed tag selector '{}' in condition '{}'",
                bad, self.id
            )));
        }
        Ok(())
    }

    pub fn matches(&self, tool: &Tool) -> bool {
        self.tag_selector.iter().any(|s| tool.has_tag(s))
    }
}

/// Ordered condition list plus combination mode.
///
/// All edits return a new set; the receiver is never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    #[serde(default)]
    pub conditions: Vec<FilterCondition>,

    #[serde(default)]
    pub mode: FilterMode,
}

impl FilterSet {
    pub fn new(mode: FilterMode) -> Self {
        Self {
            conditions: Vec::new(),
            mode,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&FilterCondition> {
        self.conditions.iter().find(|c| c.id == id)
    }

    pub fn with_added(&self, condition: FilterCondition) -> Result<Self> {
        condition.validate()?;
        if self.get(&condition.id).is_some() {
            return Err(FinderError::validation(format!(
                "filter condition '{}' already exists",
                condition.id
            )));
        }
        let mut next = self.clone();
        next.conditions.push(condition);
        Ok(next)
    }

    pub fn with_removed(&self, id: &str) -> Result<Self> {
        if self.get(id).is_none() {
            return Err(FinderError::not_found(EntityKind::Condition, id));
        }
        let mut next = self.clone();
        next.conditions.retain(|c| c.id != id);
        Ok(next)
    }

    /// Replace the condition with the same id, keeping its position
    pub fn with_updated(&self, condition: FilterCondition) -> Result<Self> {
        condition.validate()?;
        let index = self
            .conditions
            .iter()
            .position(|c| c.id == condition.id)
            .ok_or_else(|| FinderError::not_found(EntityKind::Condition, &condition.id))?;
        let mut next = self.clone();
        next.conditions[index] = condition;
        Ok(next)
    }

    pub fn with_mode(&self, mode: FilterMode) -> Self {
        Self {
            conditions: self.conditions.clone(),
            mode,
        }
    }

    pub fn cleared(&self) -> Self {
        Self::new(self.mode)
    }

    pub fn matches(&self, tool: &Tool) -> bool {
        matches_all(tool, &self.conditions, self.mode)
    }

    pub fn apply<'a>(&self, tools: &'a [Tool]) -> Vec<&'a Tool> {
        filter_tools(tools, &self.conditions, self.mode)
    }
}

fn matches_all(tool: &Tool, conditions: &[FilterCondition], mode: FilterMode) -> bool {
    if conditions.is_empty() {
        return true;
    }
    match mode {
        FilterMode::And => conditions.iter().all(|c| c.matches(tool)),
        FilterMode::Or => conditions.iter().any(|c| c.matches(tool)),
    }
}

/// Filter a tool slice, keeping catalog order
pub fn filter_tools<'a>(
    tools: &'a [Tool],
    conditions: &[FilterCondition],
    mode: FilterMode,
) -> Vec<&'a Tool> {
    tools
        .iter()
        .filter(|t| matches_all(t, conditions, mode))
        .collect()
}
