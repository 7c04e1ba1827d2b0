//! Guided Ranking Flow
//!
//! A linear questionnaire that derives criterion weights from answers instead
//! of manual sliders. The flow is an explicit state machine
//! (`AtQuestion(i)` → … → `Complete`). Every answered step keeps the weight
//! vector it started from, so going back or revising an answer restores that
//! vector first and nothing is ever applied twice.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{EntityKind, FinderError, Result};

use super::registry::CriterionRegistry;
use super::types::{WeightVector, MAX_WEIGHT, MIN_WEIGHT};

/// Static question table supplied as configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,

    pub prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    pub options: Vec<AnswerOption>,
}

impl Question {
    pub fn option(&self, id: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,

    pub label: String,

    /// No effects means "skip / not applicable"
    #[serde(default)]
    pub effects: Vec<WeightEffect>,
}

/// Weight change for one criterion. Exactly one of `set` or `adjust` is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightEffect {
    pub criterion: String,

    /// Absolute weight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<u8>,

    /// Additive change, result clamped to [1,5]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjust: Option<i8>,
}

impl WeightEffect {
    pub fn set(criterion: impl Into<String>, weight: u8) -> Self {
        Self {
            criterion: criterion.into(),
            set: Some(weight),
            adjust: None,
        }
    }

    pub fn adjust(criterion: impl Into<String>, delta: i8) -> Self {
        Self {
            criterion: criterion.into(),
            set: None,
            adjust: Some(delta),
        }
    }

    fn apply_to(&self, current: u8) -> u8 {
        if let Some(weight) = self.set {
            return weight;
        }
        match self.adjust {
            Some(delta) => (current as i16 + delta as i16).clamp(MIN_WEIGHT as i16, MAX_WEIGHT as i16) as u8,
            None => current,
        }
    }
}

impl QuestionTable {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Check the table is usable against the given criteria.
    ///
    /// Any reference to an unknown criterion is a configuration error.
    pub fn validate(&self, registry: &CriterionRegistry) -> Result<()> {
        if self.questions.is_empty() {
            return Err(FinderError::config("question table has no questions"));
        }

        let mut question_ids = HashSet::new();
        for question in &self.questions {
            if !question_ids.insert(question.id.as_str()) {
                return Err(FinderError::config(format!(
                    "duplicate question id '{}'",
                    question.id
                )));
            }
            if question.options.is_empty() {
                return Err(FinderError::config(format!(
                    "question '{}' has no options",
                    question.id
                )));
            }

            let mut option_ids = HashSet::new();
            for option in &question.options {
                if !option_ids.insert(option.id.as_str()) {
                    return Err(FinderError::config(format!(
                        "duplicate option id '{}' in question '{}'",
                        option.id, question.id
                    )));
                }
                for effect in &option.effects {
                    validate_effect(effect, &question.id, &option.id, registry)?;
                }
            }
        }

        Ok(())
    }
}

fn validate_effect(
    effect: &WeightEffect,
    question_id: &str,
    option_id: &str,
    registry: &CriterionRegistry,
) -> Result<()> {
    let location = format!("question '{}' option '{}'", question_id, option_id);

    if !registry.contains(&effect.criterion) {
        return Err(FinderError::config(format!(
            "{} references unknown criterion '{}'",
            location, effect.criterion
        )));
    }
    match (effect.set, effect.adjust) {
        (Some(_), Some(_)) | (None, None) => Err(FinderError::config(format!(
            "{} must give exactly one of set/adjust for '{}'",
            location, effect.criterion
        ))),
        (Some(weight), None) if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) => {
            Err(FinderError::config(format!(
                "{} sets '{}' to {} outside [{}, {}]",
                location, effect.criterion, weight, MIN_WEIGHT, MAX_WEIGHT
            )))
        }
        _ => Ok(()),
    }
}

/// An answer given by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidedRankingAnswer {
    pub question_id: String,
    pub selected_option_id: String,
}

/// Position in the questionnaire (0-based question index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "question", rename_all = "camelCase")]
pub enum FlowState {
    AtQuestion(usize),
    Complete,
}

#[derive(Debug, Clone)]
struct AnsweredStep {
    answer: GuidedRankingAnswer,
    /// Weights right before this answer was applied
    before: WeightVector,
}

#[derive(Debug, Clone)]
pub struct GuidedFlow {
    table: QuestionTable,
    state: FlowState,
    initial: WeightVector,
    steps: Vec<AnsweredStep>,
}

impl GuidedFlow {
    /// Validate the table and remember the pre-flow weights.
    pub fn start(table: QuestionTable, registry: &CriterionRegistry) -> Result<Self> {
        table.validate(registry)?;
        tracing::debug!(questions = table.questions.len(), "guided flow started");
        Ok(Self {
            table,
            state: FlowState::AtQuestion(0),
            initial: registry.snapshot(),
            steps: Vec::new(),
        })
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == FlowState::Complete
    }

    pub fn table(&self) -> &QuestionTable {
        &self.table
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            FlowState::AtQuestion(i) => self.table.questions.get(i),
            FlowState::Complete => None,
        }
    }

    /// (answered, total)
    pub fn progress(&self) -> (usize, usize) {
        (self.steps.len(), self.table.questions.len())
    }

    pub fn answers(&self) -> impl Iterator<Item = &GuidedRankingAnswer> {
        self.steps.iter().map(|s| &s.answer)
    }

    /// Answer the current question and advance.
    pub fn answer(&mut self, option_id: &str, registry: &mut CriterionRegistry) -> Result<FlowState> {
        let index = match self.state {
            FlowState::AtQuestion(i) => i,
            FlowState::Complete => {
                return Err(FinderError::invalid("guided flow is already complete"));
            }
        };

        let before = registry.snapshot();
        let (answer, after) = self.resolve(index, option_id, &before)?;
        registry.restore(&after)?;

        tracing::debug!(
            question = %answer.question_id,
            option = %answer.selected_option_id,
            "guided answer applied"
        );
        self.steps.push(AnsweredStep { answer, before });
        self.state = if index + 1 < self.table.questions.len() {
            FlowState::AtQuestion(index + 1)
        } else {
            FlowState::Complete
        };
        Ok(self.state)
    }

    /// Step back one question, restoring the weights from before its answer.
    pub fn back(&mut self, registry: &mut CriterionRegistry) -> Result<FlowState> {
        let step = self
            .steps
            .last()
            .ok_or_else(|| FinderError::invalid("guided flow is at the first question"))?;
        registry.restore(&step.before)?;
        self.steps.pop();
        self.state = FlowState::AtQuestion(self.steps.len());
        Ok(self.state)
    }

    /// Re-answer the most recently answered question without advancing.
    ///
    /// The new option is applied to the weights saved for that step, so
    /// repeating the same answer leaves the weights unchanged.
    pub fn revise_last(&mut self, option_id: &str, registry: &mut CriterionRegistry) -> Result<FlowState> {
        let index = self
            .steps
            .len()
            .checked_sub(1)
            .ok_or_else(|| FinderError::invalid("no answer to revise"))?;
        let before = self.steps[index].before.clone();
        let (answer, after) = self.resolve(index, option_id, &before)?;
        registry.restore(&after)?;
        self.steps[index].answer = answer;
        Ok(self.state)
    }

    /// End the flow early. Applied answers stay unless `restore` is set, in
    /// which case the pre-flow weights come back.
    pub fn abandon(self, registry: &mut CriterionRegistry, restore: bool) -> Result<()> {
        if restore {
            registry.restore(&self.initial)?;
        }
        tracing::debug!(answered = self.steps.len(), restore, "guided flow abandoned");
        Ok(())
    }

    /// Compute the answer record and resulting weights without touching state.
    fn resolve(
        &self,
        index: usize,
        option_id: &str,
        before: &WeightVector,
    ) -> Result<(GuidedRankingAnswer, WeightVector)> {
        let question = &self.table.questions[index];
        let option = question
            .option(option_id)
            .ok_or_else(|| FinderError::not_found(EntityKind::Option, option_id))?;

        let mut after = before.clone();
        for effect in &option.effects {
            let current = after.get(&effect.criterion).ok_or_else(|| {
                FinderError::config(format!(
                    "option '{}' references unknown criterion '{}'",
                    option.id, effect.criterion
                ))
            })?;
            after.insert(effect.criterion.clone(), effect.apply_to(current));
        }

        let answer = GuidedRankingAnswer {
            question_id: question.id.clone(),
            selected_option_id: option.id.clone(),
        };
        Ok((answer, after))
    }
}
