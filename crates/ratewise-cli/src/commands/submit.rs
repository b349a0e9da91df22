//! The `ratewise feedback` and `ratewise interview` commands.

use std::path::PathBuf;

use anyhow::Result;

use ratewise_core::service::InterviewSlot;

use super::{evaluation_key, resolve_member, Context};

pub async fn feedback(
    config_path: Option<PathBuf>,
    member: String,
    project: Option<String>,
    message: String,
) -> Result<()> {
    let ctx = Context::load(config_path)?;
    let (project_id, _) = ctx.project(project)?;
    let identity = ctx.identity()?;
    let service = ctx.service()?;

    let members = service.members(&identity.pm_id).await?;
    let (member_id, member_name) = resolve_member(&members, &member);
    service
        .submit_feedback(&evaluation_key(&project_id, &member_id), member_name, &message)
        .await?;

    println!("Feedback sent.");
    Ok(())
}

pub async fn interview(
    config_path: Option<PathBuf>,
    member: String,
    project: Option<String>,
    date: String,
    time: String,
    message: String,
) -> Result<()> {
    let ctx = Context::load(config_path)?;
    let (project_id, _) = ctx.project(project)?;
    let identity = ctx.identity()?;
    let service = ctx.service()?;

    let members = service.members(&identity.pm_id).await?;
    let (member_id, member_name) = resolve_member(&members, &member);
    let slot = InterviewSlot {
        date,
        time,
        message,
    };
    service
        .request_interview(&evaluation_key(&project_id, &member_id), member_name, slot)
        .await?;

    println!("Interview requested.");
    Ok(())
}
