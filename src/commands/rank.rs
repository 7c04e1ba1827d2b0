//! `ppm-finder rank`: score and rank the catalog in one shot
//!
//! Steps run in a fixed order: preset, explicit weights, filters, removals,
//! selection, comparison. Any failure aborts before output.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use console::style;

use crate::finder::{
    render_comparison, render_ranking, AnalyticsSink, FilterCondition, FilterMode, FinderSession,
    OutputFormat,
};

use super::SourceOptions;

#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    pub source: SourceOptions,
    /// Preset applied before explicit weights
    pub preset: Option<String>,
    /// Explicit `criterion=weight` pairs
    pub weights: Vec<(String, u8)>,
    /// One tag list per filter condition
    pub filters: Vec<Vec<String>>,
    pub mode: Option<FilterMode>,
    pub remove: Vec<String>,
    /// Selection in priority order
    pub select: Vec<String>,
    pub compare: Vec<String>,
    pub format: OutputFormat,
    pub top: Option<usize>,
}

/// Parse `criterion=weight`
pub fn parse_weight(raw: &str) -> Result<(String, u8)> {
    let (id, weight) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected criterion=weight, got '{}'", raw))?;
    let weight: u8 = weight
        .trim()
        .parse()
        .with_context(|| format!("Invalid weight in '{}'", raw))?;
    Ok((id.trim().to_string(), weight))
}

/// Apply every rank option to a fresh session
pub fn build_session(options: &RankOptions, sink: Arc<dyn AnalyticsSink>) -> Result<FinderSession> {
    let mut session = options.source.open_session(sink)?;

    if let Some(preset) = &options.preset {
        session.apply_preset(preset)?;
    }
    for (id, weight) in &options.weights {
        session
            .set_weight(id, *weight)
            .with_context(|| format!("Cannot set weight for '{}'", id))?;
    }

    for (i, tags) in options.filters.iter().enumerate() {
        let condition = FilterCondition::new(format!("filter-{}", i + 1), tags)?;
        session.add_filter(condition)?;
    }
    if let Some(mode) = options.mode {
        session.set_filter_mode(mode);
    }

    for id in &options.remove {
        session.remove_tool(id)?;
    }
    for id in &options.select {
        session.select_tool(id)?;
    }
    for id in &options.compare {
        if !session.selection().is_selected(id) {
            session.select_tool(id)?;
        }
        session.compare_tool(id)?;
    }

    Ok(session)
}

pub fn execute_rank(options: RankOptions, sink: Arc<dyn AnalyticsSink>) -> Result<()> {
    let session = build_session(&options, sink)?;
    let snapshot = session.submit_ranking();

    if options.format != OutputFormat::Json {
        let filters = &snapshot.filters;
        println!(
            "{} {} tools ranked{}\n",
            style("✓").green(),
            snapshot.ranking.len(),
            if filters.is_empty() {
                String::new()
            } else {
                format!(
                    " ({} filters, {})",
                    filters.conditions.len(),
                    filters.mode.as_str().to_uppercase()
                )
            }
        );
    }

    println!("{}", render_ranking(&snapshot.ranking, options.format, options.top)?);

    let rows = session.comparison();
    if !rows.is_empty() {
        if options.format != OutputFormat::Json {
            println!("\n{}\n", style("Comparison").bold());
        }
        println!("{}", render_comparison(&rows, session.criteria(), options.format)?);
    }
    Ok(())
}
