//! Scoring & Ranking Engine
//!
//! Match score of a tool against a weight vector:
//!
//! ```text
//! score = 100 * Σ (w_i * r_i) / Σ (w_i * 5)
//! ```
//!
//! Missing ratings count as neutral. Sums are integer and iterate an ordered
//! map, so the result never depends on criterion order. A zero denominator
//! yields 0 rather than NaN.

use serde::Serialize;
use std::cmp::Ordering;

use crate::error::{EntityKind, FinderError, Result};

use super::types::{Catalog, Tool, WeightVector, MAX_RATING, NEUTRAL_RATING};

/// Knobs that shape scoring and ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringOptions {
    /// Rating used when a tool has none for a criterion
    pub neutral_rating: u8,
    /// Decimal places kept before scores are compared
    pub precision: u32,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            neutral_rating: NEUTRAL_RATING,
            precision: 1,
        }
    }
}

/// Weighted contribution of one criterion to a tool's score
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionContribution {
    pub criterion_id: String,
    pub weight: u8,
    pub rating: u8,
    /// False when the neutral default stood in for a missing rating
    pub rated: bool,
    pub points: u32,
    pub max_points: u32,
}

/// Unrounded match score in [0, 100]
pub fn match_score(tool: &Tool, weights: &WeightVector, options: &ScoringOptions) -> f64 {
    let (earned, possible) = weighted_totals(tool, weights, options);
    if possible == 0 {
        return 0.0;
    }
    100.0 * earned as f64 / possible as f64
}

/// Per-criterion breakdown, skipping zero-weight criteria
pub fn score_breakdown(
    tool: &Tool,
    weights: &WeightVector,
    options: &ScoringOptions,
) -> Vec<CriterionContribution> {
    weights
        .iter()
        .filter(|(_, w)| *w > 0)
        .map(|(id, weight)| {
            let explicit = tool.rating(id);
            let rating = effective_rating(explicit, options);
            CriterionContribution {
                criterion_id: id.to_string(),
                weight,
                rating,
                rated: explicit.is_some(),
                points: weight as u32 * rating as u32,
                max_points: weight as u32 * MAX_RATING as u32,
            }
        })
        .collect()
}

fn weighted_totals(tool: &Tool, weights: &WeightVector, options: &ScoringOptions) -> (u32, u32) {
    weights
        .iter()
        .fold((0u32, 0u32), |(earned, possible), (id, weight)| {
            let rating = effective_rating(tool.rating(id), options);
            (
                earned + weight as u32 * rating as u32,
                possible + weight as u32 * MAX_RATING as u32,
            )
        })
}

fn effective_rating(explicit: Option<u8>, options: &ScoringOptions) -> u8 {
    explicit.unwrap_or(options.neutral_rating).min(MAX_RATING)
}

/// Score rounded to `precision` decimal places
pub fn round_score(score: f64, precision: u32) -> f64 {
    scaled_score(score, precision) as f64 / 10f64.powi(precision as i32)
}

/// Integer form of the rounded score; equality on this is exact
fn scaled_score(score: f64, precision: u32) -> i64 {
    (score * 10f64.powi(precision as i32)).round() as i64
}

/// Score a catalog tool by id
pub fn score_tool(
    catalog: &Catalog,
    tool_id: &str,
    weights: &WeightVector,
    options: &ScoringOptions,
) -> Result<f64> {
    let tool = catalog
        .tool(tool_id)
        .ok_or_else(|| FinderError::not_found(EntityKind::Tool, tool_id))?;
    Ok(round_score(match_score(tool, weights, options), options.precision))
}

/// One row of a ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTool {
    pub tool: Tool,
    /// Rounded match score
    pub score: f64,
    /// 1-based dense rank
    pub rank: usize,
    #[serde(skip)]
    scaled: i64,
    /// Input order, the last tie-break
    #[serde(skip)]
    input_index: usize,
}

/// Totally ordered scoring result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ranking {
    entries: Vec<RankedTool>,
}

impl Ranking {
    pub fn entries(&self) -> &[RankedTool] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedTool> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self) -> Option<&RankedTool> {
        self.entries.first()
    }

    pub fn get(&self, tool_id: &str) -> Option<&RankedTool> {
        self.entries.iter().find(|e| e.tool.id == tool_id)
    }

    pub fn tool_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.tool.id.as_str()).collect()
    }

    /// Re-apply the tie-break for a new selection order.
    ///
    /// Scores and ranks are kept as they are; only rows sharing a rank move.
    pub fn reorder(&mut self, selected: &[String]) {
        self.entries
            .sort_by(|a, b| compare_entries(a, b, selected));
    }
}

fn selection_position(selected: &[String], tool_id: &str) -> usize {
    selected
        .iter()
        .position(|id| id == tool_id)
        .unwrap_or(usize::MAX)
}

fn compare_entries(a: &RankedTool, b: &RankedTool, selected: &[String]) -> Ordering {
    b.scaled
        .cmp(&a.scaled)
        .then_with(|| {
            selection_position(selected, &a.tool.id).cmp(&selection_position(selected, &b.tool.id))
        })
        .then_with(|| a.input_index.cmp(&b.input_index))
}

/// Rank tools by match score.
///
/// Equal rounded scores are ordered by position in `selected` (earlier
/// first), then by input order. Ranks are dense: ties share a rank and the
/// next distinct score takes the following one.
pub fn rank_tools(
    tools: &[&Tool],
    weights: &WeightVector,
    selected: &[String],
    options: &ScoringOptions,
) -> Ranking {
    let mut entries: Vec<RankedTool> = tools
        .iter()
        .enumerate()
        .map(|(input_index, tool)| {
            let raw = match_score(tool, weights, options);
            let scaled = scaled_score(raw, options.precision);
            RankedTool {
                tool: (*tool).clone(),
                score: round_score(raw, options.precision),
                rank: 0,
                scaled,
                input_index,
            }
        })
        .collect();

    entries.sort_by(|a, b| compare_entries(a, b, selected));

    let mut rank = 0;
    let mut previous: Option<i64> = None;
    for entry in &mut entries {
        if previous != Some(entry.scaled) {
            rank += 1;
            previous = Some(entry.scaled);
        }
        entry.rank = rank;
    }

    tracing::debug!(tools = entries.len(), weight_total = weights.total(), "ranked tools");
    Ranking { entries }
}
