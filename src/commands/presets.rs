//! `ppm-finder presets`: list weight presets

use anyhow::Result;
use console::style;

use crate::finder::list_presets;

use super::SourceOptions;

#[derive(Debug, Clone, Default)]
pub struct PresetsOptions {
    pub source: SourceOptions,
}

pub fn execute_presets(options: PresetsOptions) -> Result<()> {
    println!("Available presets:\n");
    for preset in list_presets(&options.source.config.presets) {
        println!("  {} - {}", style(&preset.name).bold(), preset.description);
        let weights: Vec<String> = preset
            .weights
            .iter()
            .map(|(id, w)| format!("{}={}", id, w))
            .collect();
        println!("    {}\n", weights.join(" "));
    }
    Ok(())
}
