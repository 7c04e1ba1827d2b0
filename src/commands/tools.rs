//! `ppm-finder tools`: list catalog tools, optionally narrowed by tag

use anyhow::Result;
use console::style;

use crate::finder::{FilterCondition, FilterMode, FilterSet, Tool};

use super::SourceOptions;

#[derive(Debug, Clone, Default)]
pub struct ToolsOptions {
    pub source: SourceOptions,
    /// Keep tools carrying any of these tags
    pub tags: Vec<String>,
    pub json: bool,
}

pub fn execute_tools(options: ToolsOptions) -> Result<()> {
    let catalog = options.source.load_catalog()?;

    let tools: Vec<&Tool> = if options.tags.is_empty() {
        catalog.tools.iter().collect()
    } else {
        let condition = FilterCondition::new("tags", &options.tags)?;
        FilterSet::new(FilterMode::Or)
            .with_added(condition)?
            .apply(&catalog.tools)
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    println!("Tools ({} of {}):\n", tools.len(), catalog.tools.len());
    for tool in tools {
        let tags: Vec<&str> = tool.tags.iter().map(|t| t.name.as_str()).collect();
        println!("  {:14} {:22} {}", style(&tool.id).bold(), tool.name, style(tags.join(", ")).cyan());
    }

    let known: Vec<&str> = catalog.all_tags().iter().map(|t| t.id.as_str()).collect();
    println!("\n{} {}", style("Tags:").dim(), known.join(", "));
    Ok(())
}
