//! Yearly result sheets for the employee report view.

use serde::{Deserialize, Serialize};

use crate::grade::{Grade, GradeTable};

/// An employee's result for one year, as served by `/getResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeResult {
    pub name: String,
    #[serde(default)]
    pub center: String,
    #[serde(default)]
    pub division: String,
    #[serde(default)]
    pub team: String,
    pub score: f64,
    /// Structured written feedback, absent when none was recorded.
    #[serde(default)]
    pub feedback: Option<FeedbackReport>,
}

impl EmployeeResult {
    pub fn grade(&self, table: &GradeTable) -> Grade {
        table.classify(self.score)
    }
}

/// Written feedback attached to a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    #[serde(default)]
    pub strengths: String,
    #[serde(default)]
    pub weaknesses: String,
    #[serde(default)]
    pub improvements: String,
    #[serde(default)]
    pub overall_evaluation: String,
}

impl FeedbackReport {
    /// Decode the JSON string the backend embeds in the `feedback` field.
    /// An empty string means no feedback.
    pub fn parse_embedded(raw: &str) -> Result<Option<Self>, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(raw).map(Some)
    }
}
