//! Markdown rendering, for pasting into review documents and chat.

use ratewise_core::grade::GradeTable;
use ratewise_core::result::EmployeeResult;
use ratewise_core::scoring::format_score;

use crate::sheet::EvaluationSheet;

/// Pipes would end the table cell early.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

pub fn to_markdown(sheet: &EvaluationSheet) -> String {
    let mut md = String::new();

    md.push_str(&format!("## {} ({})\n\n", sheet.member, sheet.project));
    md.push_str(&format!(
        "**Total:** {} | **Grade:** {}",
        format_score(sheet.total_score),
        sheet.grade
    ));
    if let Some(source) = &sheet.source {
        md.push_str(&format!(" | **Source:** {source}"));
    }
    md.push_str("\n\n");

    if !sheet.ratios_complete() {
        md.push_str(&format!(
            "> Ratios sum to {}% instead of 100%.\n\n",
            sheet.total_ratio
        ));
    }

    md.push_str("| Item | Ratio | Score | Bonus | Weighted | Comment |\n");
    md.push_str("|------|-------|-------|-------|----------|---------|\n");
    for line in &sheet.lines {
        md.push_str(&format!(
            "| {} | {}% | {} | {} | {} | {} |\n",
            cell(&line.name),
            line.ratio,
            line.score,
            line.bonus,
            format_score(line.weighted),
            cell(&line.comment)
        ));
    }

    md
}

pub fn result_to_markdown(result: &EmployeeResult, year: i32, grades: &GradeTable) -> String {
    let mut md = String::new();

    md.push_str(&format!("## {} ({year})\n\n", result.name));
    let org: Vec<&str> = [&result.center, &result.division, &result.team]
        .into_iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    if !org.is_empty() {
        md.push_str(&format!("{}\n\n", org.join(" / ")));
    }
    md.push_str(&format!(
        "**Score:** {} | **Grade:** {}\n",
        format_score(result.score),
        result.grade(grades)
    ));

    if let Some(feedback) = &result.feedback {
        for (title, text) in [
            ("Strengths", &feedback.strengths),
            ("Weaknesses", &feedback.weaknesses),
            ("Improvements", &feedback.improvements),
            ("Overall", &feedback.overall_evaluation),
        ] {
            if !text.is_empty() {
                md.push_str(&format!("\n### {title}\n\n{text}\n"));
            }
        }
    }

    md
}
