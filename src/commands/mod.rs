//! CLI command implementations
//!
//! Each command is in its own submodule and takes an `*Options` struct.
//! [`SourceOptions`] carries what every command needs to open a catalog.

pub mod criteria;
pub mod guided;
pub mod presets;
pub mod rank;
pub mod tools;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::config::FinderConfig;
use crate::finder::{
    load_catalog, load_question_table, AnalyticsSink, Catalog, CatalogOverrides, FinderSession,
};

pub use criteria::{execute_criteria, CriteriaOptions};
pub use guided::{execute_guided, run_scripted, GuidedOptions};
pub use presets::{execute_presets, PresetsOptions};
pub use rank::{build_session, execute_rank, parse_weight, RankOptions};
pub use tools::{execute_tools, ToolsOptions};

/// Where the catalog and question table come from
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    pub config: FinderConfig,
    /// Project catalog; wins over the one named in the config
    pub catalog: Option<PathBuf>,
    /// Tools dropped before anything else happens
    pub exclude: Vec<String>,
    /// Keep only tools carrying one of these tags
    pub only_tags: Vec<String>,
}

impl SourceOptions {
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog.clone().or_else(|| self.config.catalog.clone())
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        let overrides = CatalogOverrides {
            exclude_tools: self.exclude.clone(),
            only_tags: self.only_tags.clone(),
        };
        load_catalog(self.catalog_path().as_deref(), &overrides)
    }

    /// Load everything and start a session reporting to `sink`
    pub fn open_session(&self, sink: Arc<dyn AnalyticsSink>) -> Result<FinderSession> {
        let catalog = self.load_catalog()?;
        let questions = load_question_table(self.config.questions.as_deref())?;
        Ok(FinderSession::new(catalog, questions, &self.config, sink)?)
    }
}
