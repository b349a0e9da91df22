//! The `ratewise evaluate` command.

use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;

use ratewise_core::error::{LoadError, SaveError};
use ratewise_core::form::{EvaluationForm, ScoreField};
use ratewise_core::service::RecordNames;
use ratewise_report::EvaluationSheet;

use super::{evaluation_key, resolve_member, show, split_pair, Context};

pub struct EvaluateArgs {
    pub member: String,
    pub project: Option<String>,
    pub scores: Vec<String>,
    pub bonuses: Vec<String>,
    pub comments: Vec<String>,
    pub save: bool,
}

pub async fn execute(config_path: Option<PathBuf>, args: EvaluateArgs) -> Result<()> {
    let ctx = Context::load(config_path)?;
    let (project_id, project_name) = ctx.project(args.project.clone())?;
    let identity = ctx.identity()?;
    let service = ctx.service()?;

    let data = service.reference_data(&identity.pm_id, &project_id).await?;
    let (member_id, member_name) = resolve_member(&data.members, &args.member);

    let mut opened = match service
        .open(evaluation_key(&project_id, &member_id), &data.template)
        .await
    {
        Ok(opened) => opened,
        Err(LoadError::MissingTemplate) => anyhow::bail!(
            "no evaluation items for project {project_id}. \
             Save some with `ratewise settings edit --save`"
        ),
    };

    let rejected = apply_edits(&mut opened.form, &args);

    let sheet = EvaluationSheet::from_items(
        project_name.as_deref().unwrap_or(&project_id),
        member_name.as_deref().unwrap_or(&member_id),
        opened.form.items(),
        service.grades(),
    )
    .with_source(opened.origin.to_string());
    println!("{}", show::render_text(&sheet));

    if !args.save {
        return Ok(());
    }
    if rejected > 0 {
        anyhow::bail!("not saved: {rejected} input(s) were rejected");
    }

    let names = RecordNames {
        project_name,
        member_name,
    };
    match service.save(&mut opened.form, names).await {
        Ok(record) => {
            println!(
                "Saved evaluation for {} ({})",
                record.member_name.as_deref().unwrap_or(&record.member_id),
                opened.form.state()
            );
            Ok(())
        }
        Err(SaveError::Ratio(e)) => {
            anyhow::bail!("not saved: {e}, {} points to adjust", e.deficit())
        }
        Err(e) => Err(e.into()),
    }
}

/// Apply every `ID=VALUE` edit. Rejected inputs keep the prior value and are
/// counted.
fn apply_edits(form: &mut EvaluationForm, args: &EvaluateArgs) -> usize {
    let mut rejected = 0;

    let fields = args
        .scores
        .iter()
        .map(|raw| (raw, Some(ScoreField::Score)))
        .chain(args.bonuses.iter().map(|raw| (raw, Some(ScoreField::Bonus))))
        .chain(args.comments.iter().map(|raw| (raw, None)));

    for (raw, field) in fields {
        let result = split_pair(raw).and_then(|(id, value)| {
            let applied = match field {
                Some(field) => form.set_field(id, field, value).map(|_| ()),
                None => form.set_comment(id, value),
            };
            applied.map_err(anyhow::Error::from)
        });
        if let Err(e) = result {
            warn!("ignored `{raw}`: {e}");
            eprintln!("Ignored `{raw}`: {e}");
            rejected += 1;
        }
    }

    rejected
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratewise_core::model::{EvaluationItem, EvaluationKey};

    fn form() -> EvaluationForm {
        let mut form = EvaluationForm::new(EvaluationKey::new("p", "m"));
        form.load(vec![EvaluationItem {
            id: "1".into(),
            name: "Quality".into(),
            ratio: 100.0,
            description: String::new(),
            score: 40,
            bonus: 0,
            comment: String::new(),
        }]);
        form
    }

    fn args(scores: &[&str], bonuses: &[&str], comments: &[&str]) -> EvaluateArgs {
        EvaluateArgs {
            member: "m".into(),
            project: None,
            scores: scores.iter().map(|s| s.to_string()).collect(),
            bonuses: bonuses.iter().map(|s| s.to_string()).collect(),
            comments: comments.iter().map(|s| s.to_string()).collect(),
            save: false,
        }
    }

    #[test]
    fn valid_edits_apply() {
        let mut form = form();
        let rejected = apply_edits(&mut form, &args(&["1=85"], &["1=3"], &["1=solid"]));
        assert_eq!(rejected, 0);
        let item = form.item("1").unwrap();
        assert_eq!((item.score, item.bonus, item.comment.as_str()), (85, 3, "solid"));
    }

    #[test]
    fn rejected_edits_keep_prior_values() {
        let mut form = form();
        let rejected = apply_edits(
            &mut form,
            &args(&["1=12.5", "2=50", "nonsense"], &["1=6"], &[]),
        );
        assert_eq!(rejected, 4);
        let item = form.item("1").unwrap();
        assert_eq!((item.score, item.bonus), (40, 0));
    }
}
