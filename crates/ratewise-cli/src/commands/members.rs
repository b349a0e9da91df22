//! The `ratewise members` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::{evaluation_key, Context};

pub async fn execute(config_path: Option<PathBuf>, project: Option<String>) -> Result<()> {
    let ctx = Context::load(config_path)?;
    let (project_id, project_name) = ctx.project(project)?;
    let identity = ctx.identity()?;
    let service = ctx.service()?;

    let members = service.members(&identity.pm_id).await?;
    if members.is_empty() {
        println!("No team members found for PM {}.", identity.pm_id);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "Username", "Team", "Evaluated"]);
    for member in &members {
        let evaluated = service.has_evaluation(&evaluation_key(&project_id, &member.id));
        table.add_row(vec![
            Cell::new(&member.id),
            Cell::new(&member.username),
            Cell::new(&member.team),
            Cell::new(if evaluated { "yes" } else { "" }),
        ]);
    }

    println!(
        "Project: {}",
        project_name.as_deref().unwrap_or(&project_id)
    );
    println!("{table}");
    Ok(())
}
