//! Finder session integration tests
//!
//! Runs the session against the built-in catalog and question table, plus
//! project files written to temp dirs.

use std::io::Write;
use std::sync::Arc;

use ppm_finder::config::FinderConfig;
use ppm_finder::finder::{
    load_catalog, load_question_table, CatalogOverrides, EventKind, EventValue, FilterCondition,
    FilterMode, FinderSession, FlowState, MemorySink,
};
use ppm_finder::{EntityKind, FinderError};

fn open(config: &FinderConfig) -> (FinderSession, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let catalog = load_catalog(None, &CatalogOverrides::default()).unwrap();
    let questions = load_question_table(None).unwrap();
    let session = FinderSession::new(catalog, questions, config, sink.clone()).unwrap();
    (session, sink)
}

fn session() -> (FinderSession, Arc<MemorySink>) {
    open(&FinderConfig::default())
}

// =============================================================================
// Weights
// =============================================================================

mod weight_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_weight_change_reranks() {
        let (mut session, sink) = session();
        let before = session.score_tool("planview").unwrap();
        let snapshot = session.set_weight("portfolioManagement", 5).unwrap();
        let after = snapshot.ranking.get("planview").unwrap().score;
        assert!(after > before);
        assert_eq!(snapshot.weights.get("portfolioManagement"), Some(5));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::WeightChanged);
        assert_eq!(
            events[0].get("criterionId"),
            Some(&EventValue::Str("portfolioManagement".to_string()))
        );
    }

    #[test]
    fn test_out_of_range_weight_rejected() {
        let (mut session, _) = session();
        for bad in [0, 6] {
            assert!(matches!(
                session.set_weight("security", bad),
                Err(FinderError::Validation(_))
            ));
        }
        assert!(matches!(
            session.set_weight("speed", 3),
            Err(FinderError::NotFound { kind: EntityKind::Criterion, .. })
        ));
        assert_eq!(session.weights().get("security"), Some(3));
    }

    #[test]
    fn test_preset_then_reset() {
        let (mut session, sink) = session();
        let snapshot = session.apply_preset("agile-team").unwrap();
        assert_eq!(snapshot.weights.get("flexibility"), Some(5));
        assert_eq!(snapshot.weights.get("scalability"), Some(2));

        let snapshot = session.reset_weights();
        assert!(snapshot.weights.iter().all(|(_, w)| w == 3));
        assert_eq!(
            sink.kinds(),
            vec![EventKind::PresetApplied, EventKind::WeightChanged]
        );
    }

    #[test]
    fn test_project_preset_from_config() {
        let mut config = FinderConfig::default();
        config.presets.insert(
            "ops".to_string(),
            ppm_finder::WeightVector::from_pairs([("security", 5), ("uptime", 4)]).unwrap(),
        );
        let (mut session, _) = open(&config);
        let snapshot = session.apply_preset("ops").unwrap();
        assert_eq!(snapshot.weights.get("security"), Some(5));
        assert_eq!(snapshot.weights.get("uptime"), None);
    }
}

// =============================================================================
// Guided Ranking
// =============================================================================

mod guided_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_back_restores_previous_weights() {
        let (mut session, _) = session();
        session.start_guided().unwrap();
        let initial = session.weights();

        session.answer_guided("under-20").unwrap();
        assert_eq!(session.weights().get("scalability"), Some(1));
        assert_eq!(session.weights().get("easeOfUse"), Some(4));

        let snapshot = session.guided_back().unwrap();
        assert_eq!(snapshot.weights, initial);
        assert_eq!(snapshot.guided.unwrap().state, FlowState::AtQuestion(0));
    }

    #[test]
    fn test_back_at_first_question_is_invalid() {
        let (mut session, _) = session();
        session.start_guided().unwrap();
        assert!(matches!(
            session.guided_back(),
            Err(FinderError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_revising_same_answer_is_idempotent() {
        let (mut session, _) = session();
        session.start_guided().unwrap();
        session.answer_guided("under-20").unwrap();
        let once = session.weights();

        session.revise_guided("under-20").unwrap();
        session.revise_guided("under-20").unwrap();
        assert_eq!(session.weights(), once);
        assert_eq!(session.guided_status().unwrap().state, FlowState::AtQuestion(1));

        session.revise_guided("over-200").unwrap();
        assert_eq!(session.weights().get("scalability"), Some(5));
        assert_eq!(session.weights().get("easeOfUse"), Some(3));
        assert_eq!(session.weights().get("security"), Some(4));
    }

    #[test]
    fn test_unknown_option_leaves_flow_in_place() {
        let (mut session, _) = session();
        session.start_guided().unwrap();
        let before = session.snapshot();
        assert!(matches!(
            session.answer_guided("galaxy"),
            Err(FinderError::NotFound { kind: EntityKind::Option, .. })
        ));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_abandon_with_and_without_restore() {
        let (mut session, sink) = session();
        session.start_guided().unwrap();
        session.answer_guided("over-200").unwrap();
        let snapshot = session.abandon_guided(false).unwrap();
        assert_eq!(snapshot.weights.get("scalability"), Some(5));
        assert!(snapshot.guided.is_none());

        session.start_guided().unwrap();
        session.answer_guided("under-20").unwrap();
        let snapshot = session.abandon_guided(true).unwrap();
        assert_eq!(snapshot.weights.get("scalability"), Some(5));
        assert_eq!(sink.kinds().last(), Some(&EventKind::GuidedAbandoned));

        assert!(session.abandon_guided(true).is_err());
    }

    #[test]
    fn test_full_run_reaches_complete() {
        let (mut session, sink) = session();
        session.start_guided().unwrap();
        for option in ["over-200", "hundreds", "waterfall", "critical", "regulated", "training"] {
            session.answer_guided(option).unwrap();
        }
        let status = session.guided_status().unwrap();
        assert_eq!(status.state, FlowState::Complete);
        assert_eq!((status.answered, status.total), (6, 6));
        assert!(matches!(
            session.answer_guided("few"),
            Err(FinderError::InvalidOperation(_))
        ));

        let top = session.ranking().top().unwrap();
        assert_eq!(top.tool.id, "planview");
        assert_eq!(sink.kinds().last(), Some(&EventKind::GuidedCompleted));
    }
}

// =============================================================================
// Filters & Selection
// =============================================================================

mod filter_selection_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_and_or_on_builtin_catalog() {
        let (mut session, _) = session();
        session
            .add_filter(FilterCondition::new("m", ["Agile"]).unwrap())
            .unwrap();
        session
            .add_filter(FilterCondition::new("s", ["Enterprise"]).unwrap())
            .unwrap();

        let or = session.set_filter_mode(FilterMode::Or);
        let and = session.toggle_filter_mode();
        assert_eq!(and.filters.mode, FilterMode::And);

        let mut and_ids: Vec<&str> = and.ranking.tool_ids();
        and_ids.sort();
        assert_eq!(and_ids, vec!["jira", "wrike"]);
        assert!(and_ids.iter().all(|id| or.ranking.get(id).is_some()));
        assert!(or.ranking.len() > and.ranking.len());

        assert_eq!(session.clear_filters().ranking.len(), session.catalog().tools.len());
    }

    #[test]
    fn test_filters_hide_but_keep_selection() {
        let (mut session, _) = session();
        session.select_tool("msproject").unwrap();
        let snapshot = session
            .add_filter(FilterCondition::new("m", ["agile"]).unwrap())
            .unwrap();
        assert!(snapshot.ranking.get("msproject").is_none());
        assert!(snapshot.selection.is_selected("msproject"));
    }

    #[test]
    fn test_update_filter_and_deselect() {
        let (mut session, sink) = session();
        session
            .add_filter(FilterCondition::new("m", ["waterfall"]).unwrap())
            .unwrap();
        let snapshot = session
            .update_filter(FilterCondition::new("m", ["kanban"]).unwrap())
            .unwrap();
        assert_eq!(snapshot.filters.conditions[0].tag_selector, vec!["kanban".to_string()]);
        assert!(snapshot.ranking.iter().all(|r| r.tool.has_tag("kanban")));
        assert!(session
            .update_filter(FilterCondition::new("other", ["kanban"]).unwrap())
            .is_err());

        session.select_tool("asana").unwrap();
        let snapshot = session.deselect_tool("asana").unwrap();
        assert!(snapshot.selection.selected().is_empty());
        assert_eq!(sink.kinds().last(), Some(&EventKind::ToolDeselected));
    }

    #[test]
    fn test_unknown_tool_is_not_found() {
        let (mut session, _) = session();
        assert!(matches!(
            session.select_tool("basecamp"),
            Err(FinderError::NotFound { kind: EntityKind::Tool, .. })
        ));
        assert!(session.remove_tool("basecamp").is_err());
    }

    fn position(ids: &[&str], id: &str) -> usize {
        ids.iter().position(|i| *i == id).unwrap()
    }

    #[test]
    fn test_reorder_changes_tie_order_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        let ratings = "{ scalability: 1, integrations: 1, easeOfUse: 1, flexibility: 1, \
                       portfolioManagement: 1, reporting: 1, security: 1 }";
        std::fs::write(
            &path,
            format!(
                "tools:\n  - {{ id: twin-a, name: Twin A, criteriaRatings: {r} }}\n  - {{ id: twin-b, name: Twin B, criteriaRatings: {r} }}\n",
                r = ratings
            ),
        )
        .unwrap();
        let catalog = load_catalog(Some(&path), &CatalogOverrides::default()).unwrap();
        let mut session =
            FinderSession::with_defaults(catalog, load_question_table(None).unwrap()).unwrap();

        session.select_tool("twin-a").unwrap();
        let snapshot = session.select_tool("twin-b").unwrap();
        let a = snapshot.ranking.get("twin-a").unwrap();
        let b = snapshot.ranking.get("twin-b").unwrap();
        assert_eq!(a.score, b.score);
        assert_eq!(a.rank, b.rank);
        let ids = snapshot.ranking.tool_ids();
        assert!(position(&ids, "twin-a") < position(&ids, "twin-b"));
        let scores_before: Vec<f64> = snapshot.ranking.iter().map(|r| r.score).collect();

        let snapshot = session
            .reorder_selection(&["twin-b".to_string(), "twin-a".to_string()])
            .unwrap();
        let ids = snapshot.ranking.tool_ids();
        assert!(position(&ids, "twin-b") < position(&ids, "twin-a"));
        assert_eq!(
            snapshot.ranking.get("twin-a").unwrap().rank,
            snapshot.ranking.get("twin-b").unwrap().rank
        );
        let scores_after: Vec<f64> = snapshot.ranking.iter().map(|r| r.score).collect();
        assert_eq!(scores_before, scores_after);

        let snapshot = session.move_selected("twin-a", 0).unwrap();
        assert_eq!(snapshot.selection.selected(), ["twin-a".to_string(), "twin-b".to_string()]);
        let ids = snapshot.ranking.tool_ids();
        assert!(position(&ids, "twin-a") < position(&ids, "twin-b"));

        assert!(matches!(
            session.reorder_selection(&["twin-a".to_string()]),
            Err(FinderError::Validation(_))
        ));
    }

    #[test]
    fn test_hand_built_filter_is_rejected() {
        let (mut session, _) = session();
        let empty = FilterCondition {
            id: String::new(),
            tag_selector: Vec::new(),
        };
        assert!(matches!(session.add_filter(empty), Err(FinderError::Validation(_))));

        let bell = FilterCondition {
            id: "m".to_string(),
            tag_selector: vec!["\u{7}bell".to_string()],
        };
        assert!(matches!(session.add_filter(bell), Err(FinderError::Validation(_))));
        assert!(session.filters().is_empty());
        assert_eq!(session.ranking().len(), 9);
    }

    #[test]
    fn test_comparison_limit_from_config() {
        let config = FinderConfig {
            comparison_limit: 2,
            ..Default::default()
        };
        let (mut session, _) = open(&config);
        for id in ["jira", "asana", "wrike"] {
            session.select_tool(id).unwrap();
        }
        session.compare_tool("jira").unwrap();
        session.compare_tool("asana").unwrap();
        assert!(matches!(
            session.compare_tool("wrike"),
            Err(FinderError::InvalidOperation(_))
        ));

        let snapshot = session.uncompare_tool("jira").unwrap();
        assert_eq!(snapshot.selection.compared(), ["asana".to_string()]);
        session.compare_tool("wrike").unwrap();
        assert_eq!(session.comparison().len(), 2);
    }

    #[test]
    fn test_remove_restore_cycle_keeps_sets_disjoint() {
        let (mut session, sink) = session();
        session.select_tool("jira").unwrap();
        session.compare_tool("jira").unwrap();
        let snapshot = session.remove_tool("jira").unwrap();
        assert!(!snapshot.selection.is_selected("jira"));
        assert!(!snapshot.selection.is_compared("jira"));
        assert!(matches!(
            session.select_tool("jira"),
            Err(FinderError::InvalidOperation(_))
        ));
        assert!(matches!(
            session.remove_tool("jira"),
            Err(FinderError::InvalidOperation(_))
        ));

        let snapshot = session.restore_tool("jira").unwrap();
        assert!(snapshot.ranking.get("jira").is_some());
        assert!(snapshot.selection.selected().is_empty());
        assert!(sink.kinds().contains(&EventKind::ToolsRestored));
    }
}

// =============================================================================
// Submission & Output
// =============================================================================

mod submission_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_submit_reports_top_tool() {
        let (mut session, sink) = session();
        session.apply_preset("enterprise").unwrap();
        let snapshot = session.submit_ranking();
        let event = sink.events().pop().unwrap();
        assert_eq!(event.kind, EventKind::RankingSubmitted);
        assert_eq!(
            event.get("topTool"),
            Some(&EventValue::Str(snapshot.ranking.top().unwrap().tool.id.clone()))
        );
        assert_eq!(event.get("count"), Some(&EventValue::Int(9)));
        assert!(sink.events().iter().all(|e| e.session_id == session.id()));
    }

    #[test]
    fn test_snapshot_serializes_for_presentation() {
        let (mut session, _) = session();
        session.select_tool("jira").unwrap();
        let json = serde_json::to_value(session.snapshot()).unwrap();
        assert!(json["ranking"].is_array());
        assert_eq!(json["weights"]["security"], 3);
        assert_eq!(json["filters"]["mode"], "or");
        assert_eq!(json["selection"]["selected"][0], "jira");
        assert!(json.get("guided").is_none());

        let snapshot = session.start_guided().unwrap();
        let guided = serde_json::to_value(&snapshot).unwrap()["guided"].clone();
        assert_eq!(guided["questionNumber"], 1);
        assert_eq!(guided["complete"], false);
        assert_eq!(guided["currentQuestion"], "org-size");
        assert!(guided.get("state").is_none());
    }
}

// =============================================================================
// Project Files
// =============================================================================

mod project_file_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_project_catalog_adds_tool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"tools:
  - id: basecamp
    name: Basecamp
    tags:
      - {{ id: smb, name: Small Business, type: Segment }}
    criteriaRatings:
      easeOfUse: 5
      scalability: 2
"#
        )
        .unwrap();

        let catalog = load_catalog(Some(&path), &CatalogOverrides::default()).unwrap();
        let questions = load_question_table(None).unwrap();
        let mut session = FinderSession::with_defaults(catalog, questions).unwrap();
        assert_eq!(session.catalog().tools.len(), 10);
        session.select_tool("basecamp").unwrap();
        let snapshot = session
            .add_filter(FilterCondition::new("s", ["small business"]).unwrap())
            .unwrap();
        assert!(snapshot.ranking.get("basecamp").is_some());
    }

    #[test]
    fn test_question_table_with_unknown_criterion_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.json");
        std::fs::write(
            &path,
            r#"{"questions": [{"id": "q1", "prompt": "Speed?", "options": [
                {"id": "fast", "label": "Fast", "effects": [{"criterion": "speed", "set": 5}]}
            ]}]}"#,
        )
        .unwrap();

        let catalog = load_catalog(None, &CatalogOverrides::default()).unwrap();
        let questions = load_question_table(Some(&path)).unwrap();
        assert!(matches!(
            FinderSession::with_defaults(catalog, questions),
            Err(FinderError::Config(_))
        ));
    }
}
