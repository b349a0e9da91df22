//! The printable view of one evaluation.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ratewise_core::grade::{Grade, GradeTable};
use ratewise_core::model::{EvaluationItem, EvaluationRecord};
use ratewise_core::scoring::{total_ratio, total_score, weighted_score};

/// One row of the sheet with its weighted contribution.
#[derive(Debug, Clone, Serialize)]
pub struct SheetLine {
    pub id: String,
    pub name: String,
    pub ratio: f64,
    pub score: u32,
    pub bonus: u32,
    pub weighted: f64,
    pub comment: String,
}

/// Everything a renderer needs; all derived numbers are computed once here.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSheet {
    pub project: String,
    pub member: String,
    pub lines: Vec<SheetLine>,
    pub total_ratio: f64,
    pub total_score: f64,
    pub grade: Grade,
    /// Where the values were loaded from, when known.
    pub source: Option<String>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl EvaluationSheet {
    pub fn from_items(
        project: &str,
        member: &str,
        items: &[EvaluationItem],
        grades: &GradeTable,
    ) -> Self {
        let total = total_score(items);
        Self {
            project: project.to_string(),
            member: member.to_string(),
            lines: items
                .iter()
                .map(|item| SheetLine {
                    id: item.id.clone(),
                    name: item.name.clone(),
                    ratio: item.ratio,
                    score: item.score,
                    bonus: item.bonus,
                    weighted: weighted_score(item),
                    comment: item.comment.clone(),
                })
                .collect(),
            total_ratio: total_ratio(items),
            total_score: total,
            grade: grades.classify(total),
            source: None,
            evaluated_at: None,
        }
    }

    /// Build a sheet from a cached record. Names fall back to the ids.
    pub fn from_record(record: &EvaluationRecord, grades: &GradeTable) -> Self {
        let items = record.items.as_deref().unwrap_or_default();
        let mut sheet = Self::from_items(
            record.project_name.as_deref().unwrap_or(&record.project_id),
            record.member_name.as_deref().unwrap_or(&record.member_id),
            items,
            grades,
        );
        sheet.evaluated_at = Some(record.evaluated_at);
        sheet
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Whether the ratios add up; a sheet is still rendered when they do not.
    pub fn ratios_complete(&self) -> bool {
        self.total_ratio == 100.0
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_totals_match_scoring() {
        let sheet = fixtures::sheet();
        assert!((sheet.total_score - 80.15).abs() < 1e-9);
        assert_eq!(sheet.total_ratio, 100.0);
        assert!(sheet.ratios_complete());
        assert_eq!(sheet.grade.as_str(), "B+");
        assert!((sheet.lines[1].weighted - 23.0).abs() < 1e-9);
    }

    #[test]
    fn record_without_names_uses_ids() {
        let record = EvaluationRecord {
            project_id: "project-009".into(),
            project_name: None,
            member_id: "m7".into(),
            member_name: None,
            items: None,
            total_score: None,
            evaluated_at: Utc::now(),
        };
        let sheet = EvaluationSheet::from_record(&record, &GradeTable::default());
        assert_eq!(sheet.project, "project-009");
        assert_eq!(sheet.member, "m7");
        assert!(sheet.lines.is_empty());
        assert_eq!(sheet.grade.as_str(), "B-");
        assert!(sheet.evaluated_at.is_some());
    }
}
