//! Core data model types for ratewise.
//!
//! Items, templates, members, projects and the record cached after a save.
//! JSON field names follow what the web front-end has always written to
//! local storage, so existing caches stay readable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One weighted line of an evaluation: the template part plus entered values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationItem {
    /// Item identifier, normalised to a string.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Weight of this item, 0–100.
    pub ratio: f64,
    /// What the item measures.
    #[serde(default)]
    pub description: String,
    /// Entered score, 0–100.
    #[serde(default)]
    pub score: u32,
    /// Discretionary bonus points, 0–5.
    #[serde(default)]
    pub bonus: u32,
    /// Free-text comment from the evaluator.
    #[serde(default)]
    pub comment: String,
}

impl EvaluationItem {
    /// Build an unscored item from a template entry.
    pub fn from_template(template: &TemplateItem) -> Self {
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            ratio: template.ratio,
            description: template.description.clone(),
            score: 0,
            bonus: 0,
            comment: String::new(),
        }
    }
}

/// The name/ratio/description skeleton of an evaluation item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateItem {
    pub id: String,
    pub name: String,
    pub ratio: f64,
    #[serde(default)]
    pub description: String,
}

impl From<&EvaluationItem> for TemplateItem {
    fn from(item: &EvaluationItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            ratio: item.ratio,
            description: item.description.clone(),
        }
    }
}

/// Reference data for a team member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub team: String,
}

/// A project that owns one evaluation set per member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// The `(project, member)` pair that owns an evaluation set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvaluationKey {
    pub project_id: String,
    pub member_id: String,
}

impl EvaluationKey {
    pub fn new(project_id: impl Into<String>, member_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            member_id: member_id.into(),
        }
    }
}

/// A member's stored rating for one item, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRating {
    pub item_id: String,
    pub user_id: String,
    pub score: u32,
    pub bonus: u32,
    pub comment: String,
}

/// One line of a save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingSubmission {
    pub item_id: String,
    pub user_id: String,
    pub score: u32,
    pub bonus: u32,
    pub comment: String,
}

/// Everything the backend needs to persist one member's evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub key: EvaluationKey,
    /// Total already rounded to two decimals, e.g. `"79.65"`.
    pub total_score: String,
    pub ratings: Vec<RatingSubmission>,
}

/// The evaluation snapshot cached locally after a successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub project_id: String,
    #[serde(default)]
    pub project_name: Option<String>,
    pub member_id: String,
    #[serde(default)]
    pub member_name: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<EvaluationItem>>,
    #[serde(default)]
    pub total_score: Option<f64>,
    pub evaluated_at: DateTime<Utc>,
}

/// Free-form feedback about a member's evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub project_id: String,
    pub member_id: String,
    #[serde(default)]
    pub member_name: Option<String>,
    pub feedback: String,
    pub requested_at: DateTime<Utc>,
}

/// A request for a one-on-one interview about an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRequest {
    pub project_id: String,
    pub member_id: String,
    #[serde(default)]
    pub member_name: Option<String>,
    pub requested_date: String,
    pub requested_time: String,
    #[serde(default)]
    pub message: String,
    pub requested_at: DateTime<Utc>,
}
