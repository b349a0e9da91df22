//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use anyhow::Result;
use std::path::Path;

use ratewise_core::grade::GradeTable;
use ratewise_core::result::EmployeeResult;
use ratewise_core::scoring::format_score;

use crate::sheet::EvaluationSheet;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn open_document(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

fn grade_class(label: &str) -> &'static str {
    match label.chars().next() {
        Some('A') | Some('S') => "grade-high",
        Some('B') => "grade-mid",
        _ => "grade-low",
    }
}

/// Generate an HTML page for one evaluation sheet.
pub fn generate_html(sheet: &EvaluationSheet) -> String {
    let mut html = String::new();
    open_document(
        &mut html,
        &format!("ratewise: {} / {}", sheet.project, sheet.member),
    );

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&sheet.member)));
    let mut meta = format!("Project: <strong>{}</strong>", html_escape(&sheet.project));
    if let Some(at) = sheet.evaluated_at {
        meta.push_str(&format!(" | evaluated {}", at.format("%Y-%m-%d %H:%M UTC")));
    }
    if let Some(source) = &sheet.source {
        meta.push_str(&format!(" | source: {}", html_escape(source)));
    }
    html.push_str(&format!("<p class=\"meta\">{meta}</p>\n"));
    html.push_str("</header>\n");

    // Total and grade
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str(&format!(
        "<p class=\"total\">{} <span class=\"grade {}\">{}</span></p>\n",
        format_score(sheet.total_score),
        grade_class(sheet.grade.as_str()),
        html_escape(sheet.grade.as_str())
    ));
    if !sheet.ratios_complete() {
        html.push_str(&format!(
            "<p class=\"warning\">Ratios sum to {}% instead of 100%.</p>\n",
            sheet.total_ratio
        ));
    }
    html.push_str("</section>\n");

    // Items
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Items</h2>\n");
    html.push_str("<table class=\"results-table\">\n");
    html.push_str("<thead><tr><th>Item</th><th>Ratio</th><th>Score</th><th>Bonus</th><th>Weighted</th><th>Comment</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for line in &sheet.lines {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}%</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&line.name),
            line.ratio,
            line.score,
            line.bonus,
            format_score(line.weighted),
            html_escape(&line.comment),
        ));
    }
    html.push_str("</tbody>\n");
    html.push_str(&format!(
        "<tfoot><tr><th>Total</th><th>{}%</th><th></th><th></th><th>{}</th><th></th></tr></tfoot>\n",
        sheet.total_ratio,
        format_score(sheet.total_score)
    ));
    html.push_str("</table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(sheet).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Generate an HTML page for a yearly employee result.
pub fn generate_result_html(result: &EmployeeResult, year: i32, grades: &GradeTable) -> String {
    let mut html = String::new();
    open_document(&mut html, &format!("ratewise: {} {year}", result.name));

    let grade = result.grade(grades);
    html.push_str("<header>\n");
    html.push_str(&format!(
        "<h1>{} <small>{year}</small></h1>\n",
        html_escape(&result.name)
    ));
    let org: Vec<&str> = [&result.center, &result.division, &result.team]
        .into_iter()
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();
    if !org.is_empty() {
        html.push_str(&format!(
            "<p class=\"meta\">{}</p>\n",
            html_escape(&org.join(" / "))
        ));
    }
    html.push_str("</header>\n");

    html.push_str("<section class=\"dashboard\">\n");
    html.push_str(&format!(
        "<p class=\"total\">{} <span class=\"grade {}\">{}</span></p>\n",
        format_score(result.score),
        grade_class(grade.as_str()),
        html_escape(grade.as_str())
    ));
    html.push_str("</section>\n");

    html.push_str("<section class=\"feedback\">\n");
    html.push_str("<h2>Feedback</h2>\n");
    match &result.feedback {
        Some(feedback) => {
            for (title, text) in [
                ("Strengths", &feedback.strengths),
                ("Weaknesses", &feedback.weaknesses),
                ("Improvements", &feedback.improvements),
                ("Overall", &feedback.overall_evaluation),
            ] {
                if text.is_empty() {
                    continue;
                }
                html.push_str(&format!(
                    "<h3>{title}</h3>\n<p>{}</p>\n",
                    html_escape(text).replace('\n', "<br>")
                ));
            }
        }
        None => html.push_str("<p class=\"meta\">No feedback recorded.</p>\n"),
    }
    html.push_str("</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(sheet: &EvaluationSheet, path: &Path) -> Result<()> {
    let html = generate_html(sheet);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --high: #dcfce7; --mid: #fef9c3; --low: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --high: #064e3b; --mid: #713f12; --low: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.total { font-size: 2rem; font-weight: bold; }
.grade { padding: 0.1rem 0.6rem; border-radius: 6px; }
.grade-high { background: var(--high); }
.grade-mid { background: var(--mid); }
.grade-low { background: var(--low); }
.warning { background: var(--low); padding: 0.5rem 1rem; border-radius: 6px; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;
