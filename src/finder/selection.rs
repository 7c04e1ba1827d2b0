//! Selection/Comparison State
//!
//! Tracks which tools the user picked (in priority order), which they threw
//! out, and which selected tools are flagged for side-by-side comparison.
//!
//! Invariants held after every call:
//! - `selected` and `removed` are disjoint
//! - `compared` is a subset of `selected`
//! - `compared` never exceeds the comparison limit

use serde::{Deserialize, Serialize};

use crate::error::{FinderError, Result};

/// Default side-by-side comparison limit
pub const DEFAULT_COMPARISON_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    selected: Vec<String>,
    removed: Vec<String>,
    compared: Vec<String>,
    comparison_limit: usize,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(DEFAULT_COMPARISON_LIMIT)
    }
}

impl SelectionState {
    pub fn new(comparison_limit: usize) -> Self {
        Self {
            selected: Vec::new(),
            removed: Vec::new(),
            compared: Vec::new(),
            comparison_limit,
        }
    }

    /// Selected tool ids, highest priority first
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    pub fn compared(&self) -> &[String] {
        &self.compared
    }

    pub fn comparison_limit(&self) -> usize {
        self.comparison_limit
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn is_removed(&self, id: &str) -> bool {
        self.removed.iter().any(|s| s == id)
    }

    pub fn is_compared(&self, id: &str) -> bool {
        self.compared.iter().any(|s| s == id)
    }

    /// Append to the selection. Returns false if it was already selected.
    pub fn select(&mut self, id: &str) -> Result<bool> {
        if self.is_removed(id) {
            return Err(FinderError::invalid(format!(
                "tool '{}' was removed; restore it before selecting",
                id
            )));
        }
        if self.is_selected(id) {
            return Ok(false);
        }
        self.selected.push(id.to_string());
        Ok(true)
    }

    /// Drop from the selection (and comparison). Returns false if it was not selected.
    pub fn deselect(&mut self, id: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| s != id);
        self.compared.retain(|s| s != id);
        before != self.selected.len()
    }

    /// Exclude a tool, dropping it from the selection and comparison.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        if self.is_removed(id) {
            return Err(FinderError::invalid(format!("tool '{}' is already removed", id)));
        }
        self.selected.retain(|s| s != id);
        self.compared.retain(|s| s != id);
        self.removed.push(id.to_string());
        Ok(())
    }

    /// Make a single removed tool eligible again.
    pub fn restore(&mut self, id: &str) -> Result<()> {
        if !self.is_removed(id) {
            return Err(FinderError::invalid(format!("tool '{}' is not removed", id)));
        }
        self.removed.retain(|s| s != id);
        Ok(())
    }

    /// Make every removed tool eligible again without selecting it.
    /// Returns the ids that were restored.
    pub fn restore_all(&mut self) -> Vec<String> {
        std::mem::take(&mut self.removed)
    }

    pub fn compare(&mut self, id: &str) -> Result<()> {
        if !self.is_selected(id) {
            return Err(FinderError::invalid(format!(
                "tool '{}' must be selected before it can be compared",
                id
            )));
        }
        if self.is_compared(id) {
            return Ok(());
        }
        if self.compared.len() >= self.comparison_limit {
            return Err(FinderError::invalid(format!(
                "comparison is limited to {} tools",
                self.comparison_limit
            )));
        }
        self.compared.push(id.to_string());
        Ok(())
    }

    pub fn uncompare(&mut self, id: &str) -> bool {
        let before = self.compared.len();
        self.compared.retain(|s| s != id);
        before != self.compared.len()
    }

    /// Move a selected tool to a new priority slot (clamped to the end).
    pub fn move_selected(&mut self, id: &str, index: usize) -> Result<()> {
        let from = self
            .selected
            .iter()
            .position(|s| s == id)
            .ok_or_else(|| FinderError::invalid(format!("tool '{}' is not selected", id)))?;
        let item = self.selected.remove(from);
        let to = index.min(self.selected.len());
        self.selected.insert(to, item);
        Ok(())
    }

    /// Replace the priority order. `order` must be a permutation of the
    /// current selection.
    pub fn reorder(&mut self, order: &[String]) -> Result<()> {
        let same_len = order.len() == self.selected.len();
        let same_members = order.iter().all(|id| self.is_selected(id))
            && self.selected.iter().all(|id| order.contains(id));
        if !same_len || !same_members {
            return Err(FinderError::validation(
                "reorder must list every selected tool exactly once",
            ));
        }
        self.selected = order.to_vec();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.removed.clear();
        self.compared.clear();
    }
}
