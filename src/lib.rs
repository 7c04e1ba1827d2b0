#![forbid(unsafe_code)]

//! # PPM Tool Finder
//!
//! Decision-support engine that ranks project portfolio management tools
//! against user-weighted criteria.
//!
//! ## Features
//!
//! - **Weighted scoring**: 0-100 match scores with a neutral default for unrated criteria
//! - **Tag filters**: conditions combined with AND or OR
//! - **Guided ranking**: a questionnaire that sets weights, with back and revise
//! - **Selection**: priority ordering, removal and side-by-side comparison
//! - **Analytics**: semantic events through a pluggable sink
//!
//! ## Example
//!
//! ```rust,no_run
//! use ppm_finder::finder::{load_catalog, load_question_table, CatalogOverrides, FinderSession};
//!
//! fn main() -> anyhow::Result<()> {
//!     let catalog = load_catalog(None, &CatalogOverrides::default())?;
//!     let questions = load_question_table(None)?;
//!     let mut session = FinderSession::with_defaults(catalog, questions)?;
//!
//!     session.set_weight("security", 5)?;
//!     let snapshot = session.select_tool("jira")?;
//!     for row in snapshot.ranking.iter() {
//!         println!("{} {} {:.1}", row.rank, row.tool.name, row.score);
//!     }
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod finder;

// Re-exports
pub use config::FinderConfig;
pub use error::{EntityKind, FinderError, Result};
pub use finder::{
    Catalog, Criterion, FilterCondition, FilterMode, FinderSession, Ranking, Snapshot, Tag, Tool,
    WeightVector,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
