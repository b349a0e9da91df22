//! The `ratewise projects` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use ratewise_core::project::ProjectUpdate;
use ratewise_core::traits::ProjectAccessor;

use super::Context;
use crate::ProjectAction;

pub fn execute(config_path: Option<PathBuf>, action: ProjectAction) -> Result<()> {
    let ctx = Context::load(config_path)?;
    let mut registry = ctx.registry()?;

    match action {
        ProjectAction::List => {
            let current = registry.current_project_id().map(str::to_string);
            let mut table = Table::new();
            table.set_header(vec!["", "Id", "Name", "Description", "Created"]);
            for project in registry.projects() {
                let marker = if current.as_deref() == Some(project.id.as_str()) {
                    "*"
                } else {
                    ""
                };
                table.add_row(vec![
                    Cell::new(marker),
                    Cell::new(&project.id),
                    Cell::new(&project.name),
                    Cell::new(&project.description),
                    Cell::new(project.created_at.format("%Y-%m-%d")),
                ]);
            }
            println!("{table}");
        }
        ProjectAction::Add { name, description } => {
            let project = registry.add(&name, &description)?;
            println!("Created project {} ({}) and made it current", project.name, project.id);
        }
        ProjectAction::Select { id } => {
            registry.select(&id)?;
            println!("Current project: {id}");
        }
        ProjectAction::Update {
            id,
            name,
            description,
        } => {
            if name.is_none() && description.is_none() {
                anyhow::bail!("nothing to update; pass --name or --description");
            }
            let project = registry.update(&id, ProjectUpdate { name, description })?;
            println!("Updated project {} ({})", project.name, project.id);
        }
        ProjectAction::Delete { id } => {
            registry.delete(&id)?;
            println!("Deleted project {id}");
            match registry.current_project() {
                Some(project) => println!("Current project: {} ({})", project.name, project.id),
                None => println!("No projects left."),
            }
        }
    }

    Ok(())
}
