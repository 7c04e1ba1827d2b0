//! Finder Session
//!
//! Owns one visitor's catalog, weights, filters, selection and guided flow.
//! Every mutating call validates first and commits as a single step, then
//! returns the [`Snapshot`] the presentation layer renders from.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::FinderConfig;
use crate::error::{EntityKind, FinderError, Result};

use super::analytics::{AnalyticsEvent, AnalyticsSink, EventKind, NullSink};
use super::filter::{FilterCondition, FilterMode, FilterSet};
use super::guided::{FlowState, GuidedFlow, Question, QuestionTable};
use super::loader::catalog_fingerprint;
use super::presets::resolve_preset;
use super::registry::CriterionRegistry;
use super::scoring::{rank_tools, score_breakdown, score_tool, CriterionContribution, Ranking, ScoringOptions};
use super::selection::SelectionState;
use super::types::{Catalog, Criterion, Tool, WeightVector};

/// Where the guided flow stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidedStatus {
    #[serde(skip)]
    pub state: FlowState,
    pub complete: bool,
    /// 1-based position of the current question; absent once complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_number: Option<usize>,
    pub answered: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<String>,
}

/// Everything the presentation layer needs after a mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub ranking: Ranking,
    pub weights: WeightVector,
    pub filters: FilterSet,
    pub selection: SelectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guided: Option<GuidedStatus>,
}

/// One compared tool with its per-criterion breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub tool_id: String,
    pub tool_name: String,
    pub score: f64,
    pub breakdown: Vec<CriterionContribution>,
}

pub struct FinderSession {
    id: Uuid,
    catalog: Catalog,
    fingerprint: String,
    registry: CriterionRegistry,
    filters: FilterSet,
    selection: SelectionState,
    questions: QuestionTable,
    guided: Option<GuidedFlow>,
    presets: BTreeMap<String, WeightVector>,
    options: ScoringOptions,
    ranking: Ranking,
    sink: Arc<dyn AnalyticsSink>,
}

impl std::fmt::Debug for FinderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderSession")
            .field("id", &self.id)
            .field("tools", &self.catalog.tools.len())
            .field("filters", &self.filters)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl FinderSession {
    /// Start a session over a catalog snapshot and question table.
    pub fn new(
        catalog: Catalog,
        questions: QuestionTable,
        config: &FinderConfig,
        sink: Arc<dyn AnalyticsSink>,
    ) -> Result<Self> {
        catalog.validate()?;
        config.validate()?;
        let registry = CriterionRegistry::new(catalog.criteria.clone())?;
        questions.validate(&registry)?;

        let mut session = Self {
            id: Uuid::new_v4(),
            fingerprint: catalog_fingerprint(&catalog),
            catalog,
            registry,
            filters: FilterSet::new(config.filter_mode),
            selection: SelectionState::new(config.comparison_limit),
            questions,
            guided: None,
            presets: config.presets.clone(),
            options: config.scoring_options(),
            ranking: Ranking::default(),
            sink,
        };
        session.rescore();
        tracing::debug!(session = %session.id, "finder session started");
        Ok(session)
    }

    /// Session with default config that drops analytics
    pub fn with_defaults(catalog: Catalog, questions: QuestionTable) -> Result<Self> {
        Self::new(catalog, questions, &FinderConfig::default(), Arc::new(NullSink))
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn criteria(&self) -> &[Criterion] {
        self.registry.criteria()
    }

    pub fn weights(&self) -> WeightVector {
        self.registry.weights()
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn ranking(&self) -> &Ranking {
        &self.ranking
    }

    pub fn question_table(&self) -> &QuestionTable {
        &self.questions
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.guided.as_ref().and_then(|g| g.current_question())
    }

    pub fn guided_status(&self) -> Option<GuidedStatus> {
        self.guided.as_ref().map(|flow| {
            let (answered, total) = flow.progress();
            let state = flow.state();
            let question_number = match state {
                FlowState::AtQuestion(index) => Some(index + 1),
                FlowState::Complete => None,
            };
            GuidedStatus {
                state,
                complete: question_number.is_none(),
                question_number,
                answered,
                total,
                current_question: flow.current_question().map(|q| q.id.clone()),
            }
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            ranking: self.ranking.clone(),
            weights: self.registry.weights(),
            filters: self.filters.clone(),
            selection: self.selection.clone(),
            guided: self.guided_status(),
        }
    }

    /// Rounded match score of any catalog tool under the current weights
    pub fn score_tool(&self, tool_id: &str) -> Result<f64> {
        score_tool(&self.catalog, tool_id, &self.registry.weights(), &self.options)
    }

    /// Breakdown rows for the compared tools, in comparison order
    pub fn comparison(&self) -> Vec<ComparisonRow> {
        let weights = self.registry.weights();
        self.selection
            .compared()
            .iter()
            .filter_map(|id| self.catalog.tool(id))
            .map(|tool| ComparisonRow {
                tool_id: tool.id.clone(),
                tool_name: tool.name.clone(),
                score: self
                    .ranking
                    .get(&tool.id)
                    .map(|e| e.score)
                    .unwrap_or_else(|| self.score_tool(&tool.id).unwrap_or(0.0)),
                breakdown: score_breakdown(tool, &weights, &self.options),
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Weights
    // ------------------------------------------------------------------

    pub fn set_weight(&mut self, criterion_id: &str, weight: u8) -> Result<Snapshot> {
        self.registry.set_weight(criterion_id, weight)?;
        self.rescore();
        self.emit(
            self.event(EventKind::WeightChanged)
                .with("criterionId", criterion_id)
                .with("weight", weight),
        );
        Ok(self.snapshot())
    }

    /// Apply a named preset. Entries for criteria this catalog lacks are skipped.
    pub fn apply_preset(&mut self, name: &str) -> Result<Snapshot> {
        let preset = resolve_preset(name, &self.presets)?;
        let mut known = WeightVector::new();
        for (id, weight) in preset.iter() {
            if self.registry.contains(id) {
                known.insert(id, weight);
            } else {
                tracing::warn!("Preset '{}' names unknown criterion: {}", name, id);
            }
        }
        self.registry.set_weights(&known)?;
        self.rescore();
        self.emit(
            self.event(EventKind::PresetApplied)
                .with("preset", name)
                .with("criteria", known.len()),
        );
        Ok(self.snapshot())
    }

    pub fn reset_weights(&mut self) -> Snapshot {
        self.registry.reset_defaults();
        self.rescore();
        self.emit(self.event(EventKind::WeightChanged).with("reset", true));
        self.snapshot()
    }

    // ------------------------------------------------------------------
    // Guided ranking
    // ------------------------------------------------------------------

    /// Begin the questionnaire. A flow still in progress must be abandoned first.
    pub fn start_guided(&mut self) -> Result<Snapshot> {
        if self.guided.as_ref().is_some_and(|g| !g.is_complete()) {
            return Err(FinderError::invalid(
                "a guided ranking is already in progress; abandon it first",
            ));
        }
        let flow = GuidedFlow::start(self.questions.clone(), &self.registry)?;
        self.emit(
            self.event(EventKind::GuidedStarted)
                .with("questions", flow.progress().1),
        );
        self.guided = Some(flow);
        Ok(self.snapshot())
    }

    pub fn answer_guided(&mut self, option_id: &str) -> Result<Snapshot> {
        let flow = active_flow(&mut self.guided)?;
        let question_id = flow.current_question().map(|q| q.id.clone()).unwrap_or_default();
        let state = flow.answer(option_id, &mut self.registry)?;
        self.rescore();
        self.emit(
            self.event(EventKind::GuidedAnswered)
                .with("questionId", question_id)
                .with("optionId", option_id),
        );
        if state == FlowState::Complete {
            let top = self.ranking.top().map(|e| e.tool.id.clone()).unwrap_or_default();
            self.emit(self.event(EventKind::GuidedCompleted).with("topTool", top));
        }
        Ok(self.snapshot())
    }

    pub fn guided_back(&mut self) -> Result<Snapshot> {
        let flow = active_flow(&mut self.guided)?;
        flow.back(&mut self.registry)?;
        self.rescore();
        self.emit(self.event(EventKind::GuidedBack));
        Ok(self.snapshot())
    }

    /// Re-answer the last answered question without advancing
    pub fn revise_guided(&mut self, option_id: &str) -> Result<Snapshot> {
        let flow = active_flow(&mut self.guided)?;
        flow.revise_last(option_id, &mut self.registry)?;
        self.rescore();
        self.emit(
            self.event(EventKind::GuidedAnswered)
                .with("optionId", option_id)
                .with("revised", true),
        );
        Ok(self.snapshot())
    }

    /// Drop the flow. With `restore`, weights return to their pre-flow values.
    pub fn abandon_guided(&mut self, restore: bool) -> Result<Snapshot> {
        let flow = self
            .guided
            .take()
            .ok_or_else(|| FinderError::invalid("no guided ranking is active"))?;
        let answered = flow.progress().0;
        if let Err(err) = flow.clone().abandon(&mut self.registry, restore) {
            self.guided = Some(flow);
            return Err(err);
        }
        self.rescore();
        self.emit(
            self.event(EventKind::GuidedAbandoned)
                .with("answered", answered)
                .with("restored", restore),
        );
        Ok(self.snapshot())
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    pub fn add_filter(&mut self, condition: FilterCondition) -> Result<Snapshot> {
        let next = self.filters.with_added(condition)?;
        Ok(self.commit_filters(next, "add"))
    }

    pub fn remove_filter(&mut self, condition_id: &str) -> Result<Snapshot> {
        let next = self.filters.with_removed(condition_id)?;
        Ok(self.commit_filters(next, "remove"))
    }

    pub fn update_filter(&mut self, condition: FilterCondition) -> Result<Snapshot> {
        let next = self.filters.with_updated(condition)?;
        Ok(self.commit_filters(next, "update"))
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) -> Snapshot {
        let next = self.filters.with_mode(mode);
        self.commit_filters(next, "mode")
    }

    pub fn toggle_filter_mode(&mut self) -> Snapshot {
        self.set_filter_mode(self.filters.mode.toggled())
    }

    pub fn clear_filters(&mut self) -> Snapshot {
        let next = self.filters.cleared();
        self.commit_filters(next, "clear")
    }

    fn commit_filters(&mut self, next: FilterSet, action: &str) -> Snapshot {
        self.filters = next;
        self.rescore();
        self.emit(
            self.event(EventKind::FilterChanged)
                .with("action", action)
                .with("conditions", self.filters.conditions.len())
                .with("mode", self.filters.mode.as_str())
                .with("matched", self.ranking.len()),
        );
        self.snapshot()
    }

    // ------------------------------------------------------------------
    // Selection & comparison
    // ------------------------------------------------------------------

    pub fn select_tool(&mut self, tool_id: &str) -> Result<Snapshot> {
        self.require_tool(tool_id)?;
        if self.selection.select(tool_id)? {
            self.ranking.reorder(self.selection.selected());
            self.emit(
                self.event(EventKind::ToolSelected)
                    .with("toolId", tool_id)
                    .with("position", self.selection.selected().len()),
            );
        }
        Ok(self.snapshot())
    }

    pub fn deselect_tool(&mut self, tool_id: &str) -> Result<Snapshot> {
        self.require_tool(tool_id)?;
        if self.selection.deselect(tool_id) {
            self.ranking.reorder(self.selection.selected());
            self.emit(self.event(EventKind::ToolDeselected).with("toolId", tool_id));
        }
        Ok(self.snapshot())
    }

    pub fn remove_tool(&mut self, tool_id: &str) -> Result<Snapshot> {
        self.require_tool(tool_id)?;
        self.selection.remove(tool_id)?;
        self.rescore();
        self.emit(self.event(EventKind::ToolRemoved).with("toolId", tool_id));
        Ok(self.snapshot())
    }

    pub fn restore_tool(&mut self, tool_id: &str) -> Result<Snapshot> {
        self.require_tool(tool_id)?;
        self.selection.restore(tool_id)?;
        self.rescore();
        self.emit(
            self.event(EventKind::ToolsRestored)
                .with("toolId", tool_id)
                .with("count", 1usize),
        );
        Ok(self.snapshot())
    }

    pub fn restore_all(&mut self) -> Snapshot {
        let restored = self.selection.restore_all();
        self.rescore();
        self.emit(self.event(EventKind::ToolsRestored).with("count", restored.len()));
        self.snapshot()
    }

    pub fn compare_tool(&mut self, tool_id: &str) -> Result<Snapshot> {
        self.require_tool(tool_id)?;
        self.selection.compare(tool_id)?;
        self.emit(
            self.event(EventKind::ToolCompared)
                .with("toolId", tool_id)
                .with("compared", self.selection.compared().len()),
        );
        Ok(self.snapshot())
    }

    pub fn uncompare_tool(&mut self, tool_id: &str) -> Result<Snapshot> {
        self.require_tool(tool_id)?;
        if self.selection.uncompare(tool_id) {
            self.emit(self.event(EventKind::ToolUncompared).with("toolId", tool_id));
        }
        Ok(self.snapshot())
    }

    /// Drag a selected tool to a new priority slot. Scores are not recomputed.
    pub fn move_selected(&mut self, tool_id: &str, index: usize) -> Result<Snapshot> {
        self.require_tool(tool_id)?;
        self.selection.move_selected(tool_id, index)?;
        self.ranking.reorder(self.selection.selected());
        self.emit(
            self.event(EventKind::SelectionReordered)
                .with("toolId", tool_id)
                .with("index", index),
        );
        Ok(self.snapshot())
    }

    /// Replace the priority order of the selection. Scores are not recomputed.
    pub fn reorder_selection(&mut self, order: &[String]) -> Result<Snapshot> {
        self.selection.reorder(order)?;
        self.ranking.reorder(self.selection.selected());
        self.emit(
            self.event(EventKind::SelectionReordered)
                .with("count", order.len()),
        );
        Ok(self.snapshot())
    }

    fn require_tool(&self, tool_id: &str) -> Result<()> {
        if self.catalog.contains_tool(tool_id) {
            Ok(())
        } else {
            Err(FinderError::not_found(EntityKind::Tool, tool_id))
        }
    }

    // ------------------------------------------------------------------
    // Submission & reset
    // ------------------------------------------------------------------

    /// Mark the current ranking as the user's result
    pub fn submit_ranking(&self) -> Snapshot {
        let mut event = self
            .event(EventKind::RankingSubmitted)
            .with("count", self.ranking.len())
            .with("catalog", self.fingerprint.clone())
            .with("guided", self.guided.as_ref().is_some_and(|g| g.is_complete()));
        if let Some(top) = self.ranking.top() {
            event = event
                .with("topTool", top.tool.id.clone())
                .with("topScore", top.score);
        }
        self.emit(event);
        self.snapshot()
    }

    /// Back to a fresh session over the same catalog
    pub fn reset(&mut self) -> Snapshot {
        self.registry.reset_defaults();
        self.filters = self.filters.cleared();
        self.selection.clear();
        self.guided = None;
        self.rescore();
        self.emit(self.event(EventKind::SessionReset));
        self.snapshot()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Tools that pass the filters and were not removed, in catalog order
    fn candidates(&self) -> Vec<&Tool> {
        self.filters
            .apply(&self.catalog.tools)
            .into_iter()
            .filter(|t| !self.selection.is_removed(&t.id))
            .collect()
    }

    fn rescore(&mut self) {
        let weights = self.registry.weights();
        let ranking = rank_tools(
            &self.candidates(),
            &weights,
            self.selection.selected(),
            &self.options,
        );
        self.ranking = ranking;
    }

    fn event(&self, kind: EventKind) -> AnalyticsEvent {
        AnalyticsEvent::new(kind, self.id)
    }

    fn emit(&self, event: AnalyticsEvent) {
        self.sink.record(&event);
    }
}

fn active_flow(guided: &mut Option<GuidedFlow>) -> Result<&mut GuidedFlow> {
    guided
        .as_mut()
        .ok_or_else(|| FinderError::invalid("no guided ranking is active"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finder::analytics::MemorySink;
    use crate::finder::loader::{load_builtin_catalog, load_builtin_questions};

    fn session() -> (FinderSession, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let session = FinderSession::new(
            load_builtin_catalog().unwrap(),
            load_builtin_questions().unwrap(),
            &FinderConfig::default(),
            sink.clone(),
        )
        .unwrap();
        (session, sink)
    }

    #[test]
    fn test_initial_ranking_covers_catalog() {
        let (session, _) = session();
        assert_eq!(session.ranking().len(), session.catalog().tools.len());
        assert_eq!(session.ranking().top().unwrap().rank, 1);
    }

    #[test]
    fn test_failed_step_leaves_state_untouched() {
        let (mut session, sink) = session();
        let before = session.snapshot();
        assert!(session.set_weight("scalability", 9).is_err());
        assert!(session.select_tool("nope").is_err());
        assert!(session.remove_filter("missing").is_err());
        assert_eq!(session.snapshot(), before);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_guided_completion_emits_events() {
        let (mut session, sink) = session();
        session.start_guided().unwrap();
        while let Some(question) = session.current_question() {
            let option = question.options[0].id.clone();
            session.answer_guided(&option).unwrap();
        }
        let kinds = sink.kinds();
        assert_eq!(kinds.first(), Some(&EventKind::GuidedStarted));
        assert_eq!(kinds.last(), Some(&EventKind::GuidedCompleted));
        let status = session.guided_status().unwrap();
        assert_eq!(status.state, FlowState::Complete);
        assert!(status.complete);
        assert_eq!(status.question_number, None);
        session.set_weight("easeOfUse", 1).unwrap();
        assert_eq!(session.weights().get("easeOfUse"), Some(1));
    }

    #[test]
    fn test_second_start_requires_abandon() {
        let (mut session, _) = session();
        session.start_guided().unwrap();
        assert!(matches!(
            session.start_guided(),
            Err(FinderError::InvalidOperation(_))
        ));
        session.abandon_guided(true).unwrap();
        session.start_guided().unwrap();
    }

    #[test]
    fn test_remove_excludes_from_ranking_and_restore_all_returns_it() {
        let (mut session, _) = session();
        let snapshot = session.remove_tool("jira").unwrap();
        assert!(snapshot.ranking.get("jira").is_none());
        let snapshot = session.restore_all();
        assert!(snapshot.ranking.get("jira").is_some());
        assert!(snapshot.selection.selected().is_empty());
    }

    #[test]
    fn test_comparison_rows_follow_compare_order() {
        let (mut session, sink) = session();
        session.select_tool("asana").unwrap();
        session.select_tool("jira").unwrap();
        session.compare_tool("jira").unwrap();
        session.compare_tool("asana").unwrap();
        let rows = session.comparison();
        let ids: Vec<&str> = rows.iter().map(|r| r.tool_id.as_str()).collect();
        assert_eq!(ids, vec!["jira", "asana"]);
        assert_eq!(rows[0].breakdown.len(), session.criteria().len());
        assert!(sink.kinds().contains(&EventKind::ToolCompared));
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mut session, _) = session();
        session.set_weight("security", 5).unwrap();
        session.add_filter(FilterCondition::new("f1", ["Agile"]).unwrap()).unwrap();
        session.select_tool("asana").unwrap();
        session.start_guided().unwrap();
        let snapshot = session.reset();
        assert_eq!(snapshot.weights.get("security"), Some(3));
        assert!(snapshot.filters.is_empty());
        assert!(snapshot.selection.selected().is_empty());
        assert!(snapshot.guided.is_none());
    }

    #[test]
    fn test_unknown_preset_changes_nothing() {
        let (mut session, _) = session();
        let before = session.weights();
        assert!(session.apply_preset("turbo").is_err());
        assert_eq!(session.weights(), before);
        session.apply_preset("enterprise").unwrap();
        assert_eq!(session.weights().get("security"), Some(5));
    }
}
