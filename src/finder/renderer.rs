//! Ranking Renderer
//!
//! Plain text, Markdown and JSON views of a ranking and of the comparison
//! table. Terminal colouring is left to the commands.

use anyhow::{anyhow, Result};
use serde::Serialize;

use super::scoring::{Ranking, RankedTool};
use super::session::ComparisonRow;
use super::types::Criterion;

/// Output format for rankings and comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown output format: {}", s)),
        }
    }
}

/// Render the first `top` rows of a ranking (all rows when `None`)
pub fn render_ranking(ranking: &Ranking, format: OutputFormat, top: Option<usize>) -> Result<String> {
    let rows: Vec<&RankedTool> = ranking.iter().take(top.unwrap_or(usize::MAX)).collect();

    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&rows)?);
    }
    if rows.is_empty() {
        return Ok("No tools match the current filters.".to_string());
    }

    let mut output = String::new();
    match format {
        OutputFormat::Markdown => {
            output.push_str("| Rank | Tool | Match | Tags |\n");
            output.push_str("|---:|---|---:|---|\n");
            for row in rows {
                output.push_str(&format!(
                    "| {} | {} | {:.1}% | {} |\n",
                    row.rank,
                    row.tool.name,
                    row.score,
                    tag_list(row)
                ));
            }
        }
        _ => {
            let width = rows.iter().map(|r| r.tool.name.len()).max().unwrap_or(0);
            for row in rows {
                output.push_str(&format!(
                    "{:>3}. {:<width$}  {:>5.1}%  {}\n",
                    row.rank,
                    row.tool.name,
                    row.score,
                    tag_list(row),
                    width = width
                ));
            }
        }
    }

    Ok(output.trim_end().to_string())
}

fn tag_list(row: &RankedTool) -> String {
    row.tool
        .tags
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ComparisonView<'a> {
    criteria: Vec<&'a str>,
    tools: &'a [ComparisonRow],
}

/// Side-by-side table: one column per compared tool, one row per criterion.
/// Cells show `rating (weight)`; unrated cells are marked with `*`.
pub fn render_comparison(
    rows: &[ComparisonRow],
    criteria: &[Criterion],
    format: OutputFormat,
) -> Result<String> {
    if format == OutputFormat::Json {
        let view = ComparisonView {
            criteria: criteria.iter().map(|c| c.id.as_str()).collect(),
            tools: rows,
        };
        return Ok(serde_json::to_string_pretty(&view)?);
    }
    if rows.is_empty() {
        return Ok("Nothing to compare.".to_string());
    }

    let mut table: Vec<Vec<String>> = Vec::new();
    let mut header = vec!["Criterion".to_string()];
    header.extend(rows.iter().map(|r| r.tool_name.clone()));
    table.push(header);

    for criterion in criteria {
        let mut line = vec![criterion.name.clone()];
        for row in rows {
            let cell = row
                .breakdown
                .iter()
                .find(|c| c.criterion_id == criterion.id)
                .map(|c| {
                    let mark = if c.rated { "" } else { "*" };
                    format!("{}{} ({})", c.rating, mark, c.weight)
                })
                .unwrap_or_else(|| "-".to_string());
            line.push(cell);
        }
        table.push(line);
    }

    let mut footer = vec!["Match".to_string()];
    footer.extend(rows.iter().map(|r| format!("{:.1}%", r.score)));
    table.push(footer);

    Ok(match format {
        OutputFormat::Markdown => markdown_table(&table),
        _ => text_table(&table),
    })
}

fn markdown_table(table: &[Vec<String>]) -> String {
    let mut output = String::new();
    for (i, line) in table.iter().enumerate() {
        output.push_str(&format!("| {} |\n", line.join(" | ")));
        if i == 0 {
            let rule: Vec<&str> = line.iter().map(|_| "---").collect();
            output.push_str(&format!("|{}|\n", rule.join("|")));
        }
    }
    output.trim_end().to_string()
}

fn text_table(table: &[Vec<String>]) -> String {
    let columns = table.first().map(|l| l.len()).unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| table.iter().filter_map(|l| l.get(i)).map(|c| c.len()).max().unwrap_or(0))
        .collect();

    table
        .iter()
        .map(|line| {
            line.iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::scoring::{rank_tools, score_breakdown, ScoringOptions};
    use crate::finder::types::{Tag, Tool, WeightVector};

    fn ranking() -> Ranking {
        let a = Tool::new("a", "Alpha")
            .with_tag(Tag::new("agile", "Agile", "Methodology"))
            .with_rating("speed", 5);
        let b = Tool::new("b", "Beta").with_rating("speed", 2);
        let weights = WeightVector::from_pairs([("speed", 4)]).unwrap();
        rank_tools(&[&a, &b], &weights, &[], &ScoringOptions::default())
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("html".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_text_ranking() {
        let out = render_ranking(&ranking(), OutputFormat::Text, None).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Alpha"));
        assert!(lines[0].contains("100.0%"));
        assert!(lines[0].contains("Agile"));
        assert!(lines[1].contains("40.0%"));
    }

    #[test]
    fn test_markdown_ranking_respects_top() {
        let out = render_ranking(&ranking(), OutputFormat::Markdown, Some(1)).unwrap();
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains("| 1 | Alpha | 100.0% | Agile |"));
    }

    #[test]
    fn test_json_ranking() {
        let out = render_ranking(&ranking(), OutputFormat::Json, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["tool"]["id"], "a");
        assert_eq!(value[1]["rank"], 2);
    }

    #[test]
    fn test_empty_ranking() {
        let out = render_ranking(&Ranking::default(), OutputFormat::Text, None).unwrap();
        assert_eq!(out, "No tools match the current filters.");
    }

    #[test]
    fn test_comparison_marks_unrated() {
        let criteria = vec![Criterion::new("speed", "Speed"), Criterion::new("cost", "Cost")];
        let tool = Tool::new("a", "Alpha").with_rating("speed", 5);
        let weights = WeightVector::from_pairs([("speed", 4), ("cost", 2)]).unwrap();
        let rows = vec![ComparisonRow {
            tool_id: "a".to_string(),
            tool_name: "Alpha".to_string(),
            score: 86.7,
            breakdown: score_breakdown(&tool, &weights, &ScoringOptions::default()),
        }];
        let out = render_comparison(&rows, &criteria, OutputFormat::Text).unwrap();
        assert!(out.contains("5 (4)"));
        assert!(out.contains("3* (2)"));
        assert!(out.contains("86.7%"));
    }
}
