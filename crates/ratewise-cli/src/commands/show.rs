//! The `ratewise show` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Table};

use ratewise_core::scoring::format_score;
use ratewise_report::{generate_html, to_markdown, EvaluationSheet};

use super::{emit, evaluation_key, resolve_member, Context};
use crate::Format;

pub async fn execute(
    config_path: Option<PathBuf>,
    member: String,
    project: Option<String>,
    format: Format,
    output: Option<PathBuf>,
) -> Result<()> {
    let ctx = Context::load(config_path)?;
    let (project_id, project_name) = ctx.project(project)?;
    let identity = ctx.identity()?;
    let service = ctx.service()?;

    let data = service.reference_data(&identity.pm_id, &project_id).await?;
    let (member_id, member_name) = resolve_member(&data.members, &member);
    let opened = service
        .open(evaluation_key(&project_id, &member_id), &data.template)
        .await?;

    let sheet = EvaluationSheet::from_items(
        project_name.as_deref().unwrap_or(&project_id),
        member_name.as_deref().unwrap_or(&member_id),
        opened.form.items(),
        service.grades(),
    )
    .with_source(opened.origin.to_string());

    emit(&render(&sheet, format), output.as_deref(), format)
}

pub fn render(sheet: &EvaluationSheet, format: Format) -> String {
    match format {
        Format::Text => render_text(sheet),
        Format::Markdown => to_markdown(sheet),
        Format::Html => generate_html(sheet),
    }
}

pub fn render_text(sheet: &EvaluationSheet) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Item", "Ratio", "Score", "Bonus", "Weighted", "Comment"]);
    for line in &sheet.lines {
        table.add_row(vec![
            Cell::new(&line.id),
            Cell::new(&line.name),
            Cell::new(format!("{}%", line.ratio)).set_alignment(CellAlignment::Right),
            Cell::new(line.score).set_alignment(CellAlignment::Right),
            Cell::new(line.bonus).set_alignment(CellAlignment::Right),
            Cell::new(format_score(line.weighted)).set_alignment(CellAlignment::Right),
            Cell::new(&line.comment),
        ]);
    }

    let mut out = format!("{} / {}", sheet.project, sheet.member);
    if let Some(source) = &sheet.source {
        out.push_str(&format!(" (loaded from {source})"));
    }
    out.push_str(&format!("\n{table}\n"));
    out.push_str(&format!(
        "Total: {}  Grade: {}  Ratio: {}%",
        format_score(sheet.total_score),
        sheet.grade,
        sheet.total_ratio
    ));
    if !sheet.ratios_complete() {
        let deficit = 100.0 - sheet.total_ratio;
        if deficit > 0.0 {
            out.push_str(&format!(" ({deficit}% missing)"));
        } else {
            out.push_str(&format!(" ({}% over)", -deficit));
        }
    }
    out
}
