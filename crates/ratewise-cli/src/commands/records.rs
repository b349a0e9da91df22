//! The `ratewise records` command.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use comfy_table::{Cell, Table};
use tracing::warn;

use ratewise_core::model::EvaluationRecord;
use ratewise_core::scoring::format_score;
use ratewise_core::store::{evaluation_data_key, is_evaluation_data_key};
use ratewise_core::traits::KeyValueStore;
use ratewise_report::EvaluationSheet;

use super::{evaluation_key, show, Context};
use crate::RecordAction;

pub async fn execute(config_path: Option<PathBuf>, action: RecordAction) -> Result<()> {
    let ctx = Context::load(config_path)?;

    match action {
        RecordAction::List { remote: false } => {
            let mut records = local_records(&ctx)?;
            if records.is_empty() {
                println!("No evaluations saved on this machine.");
                return Ok(());
            }
            records.sort_by(|a, b| b.evaluated_at.cmp(&a.evaluated_at));
            print_records(&ctx, records.iter());
        }
        RecordAction::List { remote: true } => {
            let stored = ctx.client()?.list_evaluations().await?;
            if stored.is_empty() {
                println!("The server holds no stored evaluations.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec!["Id", "Project", "Member", "Total", "Evaluated"]);
            for entry in &stored {
                table.add_row(record_row(Some(&entry.id), &entry.record));
            }
            println!("{table}");
        }
        RecordAction::Show { member, project } => {
            let record = find(&ctx, &member, project)?;
            let sheet = EvaluationSheet::from_record(&record, &ctx.config.grade_table())
                .with_source("cache");
            println!("{}", show::render_text(&sheet));
        }
        RecordAction::Delete { member, project } => {
            let record = find(&ctx, &member, project)?;
            let key = evaluation_key(&record.project_id, &record.member_id);
            ctx.store
                .remove(&evaluation_data_key(&key))
                .context("failed to delete the saved evaluation")?;
            println!(
                "Deleted the saved evaluation of {} in {}",
                record.member_name.as_deref().unwrap_or(&record.member_id),
                record.project_id
            );
        }
        RecordAction::Push { member, project } => {
            let record = find(&ctx, &member, project)?;
            let stored = ctx.client()?.create_evaluation(&record).await?;
            println!("Uploaded as evaluation {}", stored.id);
        }
    }

    Ok(())
}

fn local_records(ctx: &Context) -> Result<Vec<EvaluationRecord>> {
    let mut records = Vec::new();
    for key in ctx.store.keys()? {
        if !is_evaluation_data_key(&key) {
            continue;
        }
        match ctx.store.get_json::<EvaluationRecord>(&key) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => warn!("skipping unreadable record: {e}"),
        }
    }
    Ok(records)
}

/// A saved record in the given (or current) project, by member id or name.
fn find(ctx: &Context, member: &str, project: Option<String>) -> Result<EvaluationRecord> {
    let (project_id, _) = ctx.project(project)?;
    local_records(ctx)?
        .into_iter()
        .find(|r| {
            r.project_id == project_id
                && (r.member_id == member || r.member_name.as_deref() == Some(member))
        })
        .with_context(|| format!("no saved evaluation of {member} in {project_id}"))
}

fn record_row(id: Option<&str>, record: &EvaluationRecord) -> Vec<Cell> {
    let mut row = Vec::with_capacity(6);
    if let Some(id) = id {
        row.push(Cell::new(id));
    }
    row.push(Cell::new(
        record.project_name.as_deref().unwrap_or(&record.project_id),
    ));
    row.push(Cell::new(
        record.member_name.as_deref().unwrap_or(&record.member_id),
    ));
    row.push(Cell::new(
        record.total_score.map(format_score).unwrap_or_default(),
    ));
    row.push(Cell::new(record.evaluated_at.format("%Y-%m-%d %H:%M")));
    row
}

fn print_records<'a>(ctx: &Context, records: impl Iterator<Item = &'a EvaluationRecord>) {
    let grades = ctx.config.grade_table();
    let mut table = Table::new();
    table.set_header(vec!["Project", "Member", "Total", "Evaluated", "Grade"]);
    for record in records {
        let mut row = record_row(None, record);
        row.push(Cell::new(
            record
                .total_score
                .map(|total| grades.classify(total).to_string())
                .unwrap_or_default(),
        ));
        table.add_row(row);
    }
    println!("{table}");
}
