//! Analytics Events
//!
//! Semantic events emitted by the session. Delivery is the sink's business;
//! the engine only builds events with primitive key/value payloads.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    WeightChanged,
    PresetApplied,
    GuidedStarted,
    GuidedAnswered,
    GuidedBack,
    GuidedCompleted,
    GuidedAbandoned,
    FilterChanged,
    ToolSelected,
    ToolDeselected,
    ToolRemoved,
    ToolsRestored,
    ToolCompared,
    ToolUncompared,
    SelectionReordered,
    RankingSubmitted,
    SessionReset,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::WeightChanged => "weight_changed",
            EventKind::PresetApplied => "preset_applied",
            EventKind::GuidedStarted => "guided_started",
            EventKind::GuidedAnswered => "guided_answered",
            EventKind::GuidedBack => "guided_back",
            EventKind::GuidedCompleted => "guided_completed",
            EventKind::GuidedAbandoned => "guided_abandoned",
            EventKind::FilterChanged => "filter_changed",
            EventKind::ToolSelected => "tool_selected",
            EventKind::ToolDeselected => "tool_deselected",
            EventKind::ToolRemoved => "tool_removed",
            EventKind::ToolsRestored => "tools_restored",
            EventKind::ToolCompared => "tool_compared",
            EventKind::ToolUncompared => "tool_uncompared",
            EventKind::SelectionReordered => "selection_reordered",
            EventKind::RankingSubmitted => "ranking_submitted",
            EventKind::SessionReset => "session_reset",
        }
    }
}

/// Primitive payload value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for EventValue {
    fn from(v: &str) -> Self {
        EventValue::Str(v.to_string())
    }
}

impl From<String> for EventValue {
    fn from(v: String) -> Self {
        EventValue::Str(v)
    }
}

impl From<i64> for EventValue {
    fn from(v: i64) -> Self {
        EventValue::Int(v)
    }
}

impl From<usize> for EventValue {
    fn from(v: usize) -> Self {
        EventValue::Int(v as i64)
    }
}

impl From<u8> for EventValue {
    fn from(v: u8) -> Self {
        EventValue::Int(v as i64)
    }
}

impl From<f64> for EventValue {
    fn from(v: f64) -> Self {
        EventValue::Float(v)
    }
}

impl From<bool> for EventValue {
    fn from(v: bool) -> Self {
        EventValue::Bool(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub kind: EventKind,
    pub session_id: Uuid,
    pub at: DateTime<Utc>,
    pub payload: BTreeMap<String, EventValue>,
}

impl AnalyticsEvent {
    pub fn new(kind: EventKind, session_id: Uuid) -> Self {
        Self {
            kind,
            session_id,
            at: Utc::now(),
            payload: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<EventValue>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&EventValue> {
        self.payload.get(key)
    }
}

/// Receiver of analytics events
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: &AnalyticsEvent);
}

/// Drops every event
#[derive(Debug, Default)]
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn record(&self, _event: &AnalyticsEvent) {}
}

/// Logs each event through `tracing`
#[derive(Debug, Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn record(&self, event: &AnalyticsEvent) {
        let payload = serde_json::to_string(&event.payload).unwrap_or_default();
        tracing::info!(
            target: "ppm_finder::analytics",
            event = event.kind.as_str(),
            session = %event.session_id,
            %payload,
            "analytics event"
        );
    }
}

/// Keeps events in memory; handy for tests and for batching upstream
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.lock().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<AnalyticsEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Poisoning is ignored so recorded events survive a panicking holder
    fn lock(&self) -> MutexGuard<'_, Vec<AnalyticsEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AnalyticsSink for MemorySink {
    fn record(&self, event: &AnalyticsEvent) {
        self.lock().push(event.clone());
    }
}

impl<T: AnalyticsSink + ?Sized> AnalyticsSink for std::sync::Arc<T> {
    fn record(&self, event: &AnalyticsEvent) {
        (**self).record(event)
    }
}
