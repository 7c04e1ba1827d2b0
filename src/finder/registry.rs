//! Criterion Registry
//!
//! Canonical list of criteria and their current weights. The registry is the
//! single source of truth the scoring engine reads from.

use crate::error::{EntityKind, FinderError, Result};

use super::types::{Criterion, WeightVector, DEFAULT_WEIGHT, MAX_WEIGHT, MIN_WEIGHT};

#[derive(Debug, Clone)]
pub struct CriterionRegistry {
    criteria: Vec<Criterion>,
    defaults: WeightVector,
}

impl CriterionRegistry {
    /// Build from catalog criteria; each criterion's weight becomes its default.
    pub fn new(criteria: Vec<Criterion>) -> Result<Self> {
        let mut defaults = WeightVector::new();
        for criterion in &criteria {
            check_weight(&criterion.id, criterion.weight).map_err(|_| {
                FinderError::config(format!(
                    "criterion '{}' has default weight {} outside [{}, {}]",
                    criterion.id, criterion.weight, MIN_WEIGHT, MAX_WEIGHT
                ))
            })?;
            if defaults.get(&criterion.id).is_some() {
                return Err(FinderError::config(format!(
                    "duplicate criterion id '{}'",
                    criterion.id
                )));
            }
            defaults.insert(criterion.id.clone(), criterion.weight);
        }
        Ok(Self { criteria, defaults })
    }

    /// Criteria in catalog order
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn get(&self, id: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn weight(&self, id: &str) -> Result<u8> {
        self.get(id)
            .map(|c| c.weight)
            .ok_or_else(|| FinderError::not_found(EntityKind::Criterion, id))
    }

    /// The active weight vector; every criterion has exactly one entry
    pub fn weights(&self) -> WeightVector {
        let mut weights = WeightVector::new();
        for criterion in &self.criteria {
            weights.insert(criterion.id.clone(), criterion.weight);
        }
        weights
    }

    pub fn defaults(&self) -> &WeightVector {
        &self.defaults
    }

    pub fn set_weight(&mut self, id: &str, weight: u8) -> Result<()> {
        check_weight(id, weight)?;
        let criterion = self
            .criteria
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| FinderError::not_found(EntityKind::Criterion, id))?;
        tracing::debug!(criterion = id, from = criterion.weight, to = weight, "set weight");
        criterion.weight = weight;
        Ok(())
    }

    /// Set several weights as one step. Nothing changes unless every entry is valid.
    pub fn set_weights(&mut self, weights: &WeightVector) -> Result<()> {
        for (id, weight) in weights.iter() {
            if !self.contains(id) {
                return Err(FinderError::not_found(EntityKind::Criterion, id));
            }
            check_weight(id, weight)?;
        }
        for (id, weight) in weights.iter() {
            if let Some(criterion) = self.criteria.iter_mut().find(|c| c.id == id) {
                criterion.weight = weight;
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> WeightVector {
        self.weights()
    }

    /// Restore a snapshot taken earlier. Criteria missing from the snapshot
    /// fall back to their defaults.
    pub fn restore(&mut self, snapshot: &WeightVector) -> Result<()> {
        for (id, weight) in snapshot.iter() {
            if !self.contains(id) {
                return Err(FinderError::not_found(EntityKind::Criterion, id));
            }
            check_weight(id, weight)?;
        }
        for criterion in &mut self.criteria {
            criterion.weight = snapshot
                .get(&criterion.id)
                .or_else(|| self.defaults.get(&criterion.id))
                .unwrap_or(DEFAULT_WEIGHT);
        }
        Ok(())
    }

    pub fn reset_defaults(&mut self) {
        for criterion in &mut self.criteria {
            criterion.weight = self.defaults.get(&criterion.id).unwrap_or(DEFAULT_WEIGHT);
        }
    }
}

fn check_weight(id: &str, weight: u8) -> Result<()> {
    if (MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
        Ok(())
    } else {
        Err(FinderError::validation(format!(
            "weight {} for criterion '{}' is outside [{}, {}]",
            weight, id, MIN_WEIGHT, MAX_WEIGHT
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CriterionRegistry {
        CriterionRegistry::new(vec![
            Criterion::new("scalability", "Scalability"),
            Criterion::new("easeOfUse", "Ease of Use").with_weight(4),
        ])
        .unwrap()
    }

    #[test]
    fn test_defaults_come_from_catalog() {
        let reg = registry();
        assert_eq!(reg.weight("scalability").unwrap(), 3);
        assert_eq!(reg.weight("easeOfUse").unwrap(), 4);
        assert_eq!(reg.weights().len(), 2);
    }

    #[test]
    fn test_set_weight_rejects_out_of_range() {
        let mut reg = registry();
        assert!(matches!(
            reg.set_weight("scalability", 0),
            Err(FinderError::Validation(_))
        ));
        assert!(matches!(
            reg.set_weight("scalability", 6),
            Err(FinderError::Validation(_))
        ));
        assert_eq!(reg.weight("scalability").unwrap(), 3);
    }

    #[test]
    fn test_set_weight_unknown_criterion() {
        let mut reg = registry();
        let err = reg.set_weight("nope", 2).unwrap_err();
        assert!(matches!(err, FinderError::NotFound { kind: EntityKind::Criterion, .. }));
    }

    #[test]
    fn test_set_weights_is_all_or_nothing() {
        let mut reg = registry();
        let batch = WeightVector::from_pairs([("scalability", 5), ("unknown", 2)]).unwrap();
        assert!(reg.set_weights(&batch).is_err());
        assert_eq!(reg.weight("scalability").unwrap(), 3);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut reg = registry();
        let before = reg.snapshot();
        reg.set_weight("scalability", 5).unwrap();
        reg.set_weight("easeOfUse", 1).unwrap();
        reg.restore(&before).unwrap();
        assert_eq!(reg.weights(), before);
    }

    #[test]
    fn test_reset_defaults() {
        let mut reg = registry();
        reg.set_weight("easeOfUse", 1).unwrap();
        reg.reset_defaults();
        assert_eq!(reg.weight("easeOfUse").unwrap(), 4);
    }

    #[test]
    fn test_new_rejects_bad_default() {
        let err = CriterionRegistry::new(vec![Criterion::new("x", "X").with_weight(9)]).unwrap_err();
        assert!(matches!(err, FinderError::Config(_)));
    }
}
