//! The `ratewise settings` command.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use comfy_table::{Cell, CellAlignment, Table};

use ratewise_core::settings::{parse_ratio, EvaluationSettings, SettingsError, SettingsField};
use ratewise_core::store::evaluation_settings_key;
use ratewise_core::traits::KeyValueStore;

use super::{split_pair, Context};
use crate::SettingsAction;

pub fn execute(config_path: Option<PathBuf>, action: SettingsAction) -> Result<()> {
    let ctx = Context::load(config_path)?;

    match action {
        SettingsAction::Show { project } => {
            let (project_id, _) = ctx.project(project)?;
            let settings = load(&ctx, &project_id)?;
            print_settings(&settings);
        }
        SettingsAction::Edit {
            project,
            add,
            remove,
            set_ratio,
            rename,
            save,
        } => {
            let (project_id, _) = ctx.project(project)?;
            let mut settings = load(&ctx, &project_id)?;

            for id in &remove {
                let removed = settings.remove(id)?;
                println!("Removed {} ({})", removed.name, removed.id);
            }
            for raw in &set_ratio {
                let (id, value) = split_pair(raw)?;
                settings.update(id, SettingsField::Ratio(value.to_string()))?;
            }
            for raw in &rename {
                let (id, name) = split_pair(raw)?;
                if name.trim().is_empty() {
                    return Err(SettingsError::EmptyName.into());
                }
                settings.update(id, SettingsField::Name(name.trim().to_string()))?;
            }
            for raw in &add {
                let (name, ratio) = split_pair(raw)?;
                let item = settings.add(name, parse_ratio(ratio), "")?;
                println!("Added {} ({})", item.name, item.id);
            }

            print_settings(&settings);

            if save {
                let policy = ctx.config.ratio_policy();
                match settings.save(ctx.store.as_ref(), &project_id, policy) {
                    Ok(()) => println!("Saved evaluation items for {project_id}"),
                    Err(SettingsError::Ratio(e)) => {
                        anyhow::bail!("not saved: {e}, {} points to adjust", e.deficit())
                    }
                    Err(e) => return Err(e.into()),
                }
            } else {
                println!("Preview only; pass --save to keep these items.");
            }
        }
        SettingsAction::Reset { project } => {
            let (project_id, _) = ctx.project(project)?;
            ctx.store
                .remove(&evaluation_settings_key(&project_id))
                .context("failed to remove saved settings")?;
            println!("Project {project_id} uses the stock evaluation items again.");
        }
    }

    Ok(())
}

fn load(ctx: &Context, project_id: &str) -> Result<EvaluationSettings> {
    EvaluationSettings::load(ctx.store.as_ref(), project_id)
        .with_context(|| format!("failed to read settings for {project_id}"))
}

fn print_settings(settings: &EvaluationSettings) {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Item", "Ratio", "Description"]);
    for item in settings.items() {
        table.add_row(vec![
            Cell::new(&item.id),
            Cell::new(&item.name),
            Cell::new(format!("{}%", item.ratio)).set_alignment(CellAlignment::Right),
            Cell::new(&item.description),
        ]);
    }
    println!("{table}");

    let total = settings.total_ratio();
    if total == 100.0 {
        println!("Total ratio: 100%");
    } else {
        println!("Total ratio: {total}% (must be 100%)");
    }
}
