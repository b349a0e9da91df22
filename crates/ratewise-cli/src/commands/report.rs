//! The `ratewise report` command.

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use ratewise_core::result::EmployeeResult;
use ratewise_core::scoring::format_score;
use ratewise_report::{generate_result_html, result_to_markdown};

use super::{emit, Context};
use crate::Format;

pub async fn execute(
    config_path: Option<PathBuf>,
    year: i32,
    employee: Option<String>,
    format: Format,
    output: Option<PathBuf>,
) -> Result<()> {
    let ctx = Context::load(config_path)?;
    let employee = match employee {
        Some(employee) => employee,
        None => ctx
            .identity()?
            .username
            .context("no employee given and nobody is logged in")?,
    };
    let service = ctx.service()?;

    let result = service
        .employee_result(&employee, year)
        .await
        .with_context(|| format!("failed to load the {year} result for {employee}"))?;

    let grades = service.grades();
    let content = match format {
        Format::Text => render_text(&result, year, &result.grade(grades).to_string()),
        Format::Markdown => result_to_markdown(&result, year, grades),
        Format::Html => generate_result_html(&result, year, grades),
    };
    emit(&content, output.as_deref(), format)
}

fn render_text(result: &EmployeeResult, year: i32, grade: &str) -> String {
    let mut out = format!("{} ({year})\n", result.name);
    for (label, value) in [
        ("Center", &result.center),
        ("Division", &result.division),
        ("Team", &result.team),
    ] {
        if !value.is_empty() {
            out.push_str(&format!("{label}: {value}\n"));
        }
    }
    out.push_str(&format!("Score: {}  Grade: {grade}\n", format_score(result.score)));

    if let Some(feedback) = &result.feedback {
        for (label, text) in [
            ("Strengths", &feedback.strengths),
            ("Weaknesses", &feedback.weaknesses),
            ("Improvements", &feedback.improvements),
            ("Overall", &feedback.overall_evaluation),
        ] {
            if !text.is_empty() {
                out.push_str(&format!("\n{label}:\n  {}\n", text.replace('\n', "\n  ")));
            }
        }
    }
    out
}
