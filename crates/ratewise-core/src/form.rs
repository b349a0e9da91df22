//! The per-member evaluation form and its save lifecycle.
//!
//! ```text
//! Empty --load--> Draft --edit--> Draft
//! Draft --save ok--> Saved --edit--> Draft
//! Draft --save with bad ratios--> Draft (RatioError)
//! ```

use std::fmt;

use crate::error::{InputError, RatioError};
use crate::grade::{Grade, GradeTable};
use crate::model::{EvaluationItem, EvaluationKey, RatingSubmission, SaveRequest};
use crate::scoring::{
    self, format_score, normalize_score_input, RatioPolicy, BONUS_RANGE, SCORE_RANGE,
};

/// Lifecycle state of one evaluation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Empty,
    Draft,
    Saved,
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormState::Empty => write!(f, "empty"),
            FormState::Draft => write!(f, "draft"),
            FormState::Saved => write!(f, "saved"),
        }
    }
}

/// Which numeric field of an item an input targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreField {
    Score,
    Bonus,
}

/// An evaluation set being edited for one `(project, member)` pair.
#[derive(Debug, Clone)]
pub struct EvaluationForm {
    key: EvaluationKey,
    items: Vec<EvaluationItem>,
    state: FormState,
}

impl EvaluationForm {
    pub fn new(key: EvaluationKey) -> Self {
        Self {
            key,
            items: Vec::new(),
            state: FormState::Empty,
        }
    }

    /// Replace the items and enter `Draft`.
    pub fn load(&mut self, items: Vec<EvaluationItem>) {
        self.items = items;
        self.state = FormState::Draft;
    }

    pub fn key(&self) -> &EvaluationKey {
        &self.key
    }

    pub fn items(&self) -> &[EvaluationItem] {
        &self.items
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn item(&self, item_id: &str) -> Option<&EvaluationItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Apply raw text to a score or bonus field.
    ///
    /// A rejected input leaves the item and the form state unchanged.
    pub fn set_field(&mut self, item_id: &str, field: ScoreField, raw: &str) -> Result<u32, InputError> {
        let range = match field {
            ScoreField::Score => SCORE_RANGE,
            ScoreField::Bonus => BONUS_RANGE,
        };
        let index = self.index_of(item_id)?;
        let value = normalize_score_input(raw, range)?;

        let item = &mut self.items[index];
        match field {
            ScoreField::Score => item.score = value,
            ScoreField::Bonus => item.bonus = value,
        }
        self.touch();
        Ok(value)
    }

    pub fn set_score(&mut self, item_id: &str, raw: &str) -> Result<u32, InputError> {
        self.set_field(item_id, ScoreField::Score, raw)
    }

    pub fn set_bonus(&mut self, item_id: &str, raw: &str) -> Result<u32, InputError> {
        self.set_field(item_id, ScoreField::Bonus, raw)
    }

    pub fn set_comment(&mut self, item_id: &str, comment: &str) -> Result<(), InputError> {
        let index = self.index_of(item_id)?;
        self.items[index].comment = comment.to_string();
        self.touch();
        Ok(())
    }

    pub fn total_ratio(&self) -> f64 {
        scoring::total_ratio(&self.items)
    }

    /// Live total, available even while the ratios are off.
    pub fn total_score(&self) -> f64 {
        scoring::total_score(&self.items)
    }

    pub fn grade(&self, table: &GradeTable) -> Grade {
        table.classify(self.total_score())
    }

    /// Validate the ratios and build the request the backend expects.
    ///
    /// Does not change state; call [`mark_saved`](Self::mark_saved) once the
    /// request has been accepted.
    pub fn prepare_save(&self, policy: RatioPolicy) -> Result<SaveRequest, RatioError> {
        scoring::validate_ratios_with(&self.items, policy)?;

        let ratings = self
            .items
            .iter()
            .map(|item| RatingSubmission {
                item_id: item.id.clone(),
                user_id: self.key.member_id.clone(),
                score: item.score,
                bonus: item.bonus,
                comment: item.comment.clone(),
            })
            .collect();

        Ok(SaveRequest {
            key: self.key.clone(),
            total_score: format_score(self.total_score()),
            ratings,
        })
    }

    pub fn mark_saved(&mut self) {
        if self.state == FormState::Draft {
            self.state = FormState::Saved;
        }
    }

    fn index_of(&self, item_id: &str) -> Result<usize, InputError> {
        self.items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| InputError::UnknownItem(item_id.to_string()))
    }

    fn touch(&mut self) {
        if self.state == FormState::Saved {
            self.state = FormState::Draft;
        }
    }
}
