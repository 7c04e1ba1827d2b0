//! Tool finder engine: catalog, weights, filters, selection, guided ranking
//! and the session that ties them together.

pub mod analytics;
pub mod filter;
pub mod guided;
pub mod loader;
pub mod presets;
pub mod registry;
pub mod renderer;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod types;

pub use analytics::{AnalyticsEvent, AnalyticsSink, EventKind, EventValue, MemorySink, NullSink, TracingSink};
pub use filter::{filter_tools, FilterCondition, FilterMode, FilterSet};
pub use guided::{AnswerOption, FlowState, GuidedFlow, GuidedRankingAnswer, Question, QuestionTable, WeightEffect};
pub use loader::{catalog_fingerprint, load_catalog, load_question_table, CatalogOverrides};
pub use presets::{builtin_presets, list_presets, resolve_preset, Preset};
pub use registry::CriterionRegistry;
pub use renderer::{render_comparison, render_ranking, OutputFormat};
pub use scoring::{match_score, rank_tools, round_score, score_breakdown, score_tool, RankedTool, Ranking, ScoringOptions};
pub use selection::SelectionState;
pub use session::{ComparisonRow, FinderSession, GuidedStatus, Snapshot};
pub use types::*;
