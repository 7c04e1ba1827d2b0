//! `ppm-finder criteria`: list the scoring criteria and their default weights

use anyhow::Result;
use console::style;

use super::SourceOptions;

#[derive(Debug, Clone, Default)]
pub struct CriteriaOptions {
    pub source: SourceOptions,
    pub json: bool,
}

pub fn execute_criteria(options: CriteriaOptions) -> Result<()> {
    let catalog = options.source.load_catalog()?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&catalog.criteria)?);
        return Ok(());
    }

    println!("Criteria ({}):\n", catalog.criteria.len());
    for criterion in &catalog.criteria {
        println!(
            "  {:22} {:24} weight {}",
            style(&criterion.id).bold(),
            criterion.name,
            criterion.weight
        );
        if let Some(description) = &criterion.description {
            println!("    {}", style(description).dim());
        }
    }
    Ok(())
}
