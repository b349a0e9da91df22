//! End-to-end evaluation flow over the mock backend and a file-backed cache.

use std::sync::Arc;

use ratewise_client::MockApi;
use ratewise_core::error::SaveError;
use ratewise_core::form::FormState;
use ratewise_core::loader::DataOrigin;
use ratewise_core::model::{EvaluationKey, Member, TemplateItem};
use ratewise_core::project::ProjectRegistry;
use ratewise_core::scoring::RatioPolicy;
use ratewise_core::service::{EvaluationService, RecordNames, ServiceConfig};
use ratewise_core::settings::EvaluationSettings;
use ratewise_core::traits::ProjectAccessor;
use ratewise_store::JsonFileStore;

fn members() -> Vec<Member> {
    vec![
        Member {
            id: "m1".into(),
            username: "kim".into(),
            team: "platform".into(),
        },
        Member {
            id: "m2".into(),
            username: "lee".into(),
            team: "platform".into(),
        },
    ]
}

fn template() -> Vec<TemplateItem> {
    [("1", "Code quality", 60.0), ("2", "Delivery", 40.0)]
        .into_iter()
        .map(|(id, name, ratio)| TemplateItem {
            id: id.into(),
            name: name.into(),
            ratio,
            description: String::new(),
        })
        .collect()
}

#[tokio::test]
async fn save_then_reload_reproduces_values() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::open(dir.path().join("store.json")).unwrap());
    let api = Arc::new(MockApi::new(members(), template()));
    let service = EvaluationService::new(Arc::clone(&api), Arc::clone(&store), ServiceConfig::default());

    let registry = ProjectRegistry::open(Arc::clone(&store)).unwrap();
    let project = registry.current_project_id().unwrap().to_string();

    let data = service.reference_data("pm", &project).await.unwrap();
    assert_eq!(data.members.len(), 2);

    let key = EvaluationKey::new(project.clone(), "m1");
    let mut opened = service.open(key.clone(), &data.template).await.unwrap();
    assert_eq!(opened.origin, DataOrigin::Template);

    opened.form.set_score("1", "90").unwrap();
    opened.form.set_bonus("1", "2").unwrap();
    opened.form.set_score("2", "75").unwrap();
    opened.form.set_comment("2", "ships on time").unwrap();

    let record = service
        .save(
            &mut opened.form,
            RecordNames {
                project_name: None,
                member_name: Some("kim".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(opened.form.state(), FormState::Saved);
    // 90*0.6 + 2*0.6 + 75*0.4 = 85.2
    assert!((record.total_score.unwrap() - 85.2).abs() < 1e-9);
    assert_eq!(api.saves()[0].total_score, "85.20");
    assert!(service.has_evaluation(&key));

    let reopened = service.open(key.clone(), &data.template).await.unwrap();
    assert_eq!(reopened.origin, DataOrigin::Remote);
    assert_eq!(reopened.form.items(), opened.form.items());

    // Backend gone: the cached copy takes over.
    api.set_offline(true);
    let offline = service.open(key, &data.template).await.unwrap();
    assert_eq!(offline.origin, DataOrigin::Cache);
    assert_eq!(offline.form.item("2").unwrap().comment, "ships on time");
}

#[tokio::test]
async fn failed_save_keeps_draft_and_cache_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::open(dir.path().join("store.json")).unwrap());
    let api = Arc::new(MockApi::new(members(), template()));
    let service = EvaluationService::new(Arc::clone(&api), Arc::clone(&store), ServiceConfig::default());

    let key = EvaluationKey::new("project-001", "m2");
    let mut opened = service.open(key.clone(), &template()).await.unwrap();
    opened.form.set_score("1", "50").unwrap();

    api.set_offline(true);
    let err = service
        .save(&mut opened.form, RecordNames::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SaveError::Api(_)));
    assert_eq!(opened.form.state(), FormState::Draft);
    assert_eq!(opened.form.item("1").unwrap().score, 50);
    assert!(!service.has_evaluation(&key));
}

#[tokio::test]
async fn saved_settings_stand_in_for_missing_remote_template() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::open(dir.path().join("store.json")).unwrap());
    let api = Arc::new(MockApi::new(members(), Vec::new()));
    let service = EvaluationService::new(Arc::clone(&api), Arc::clone(&store), ServiceConfig::default());

    assert!(service.template("pm", "project-002").await.unwrap().is_empty());

    EvaluationSettings::default()
        .save(store.as_ref(), "project-002", RatioPolicy::exact())
        .unwrap();
    let template = service.template("pm", "project-002").await.unwrap();
    assert_eq!(template.len(), 5);
    assert_eq!(template.iter().map(|t| t.ratio).sum::<f64>(), 100.0);
}

#[tokio::test]
async fn deleting_a_project_drops_its_evaluations() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::open(dir.path().join("store.json")).unwrap());
    let api = Arc::new(MockApi::new(members(), template()));
    let service = EvaluationService::new(Arc::clone(&api), Arc::clone(&store), ServiceConfig::default());
    let mut registry = ProjectRegistry::open(Arc::clone(&store)).unwrap();

    let project = registry.add("Billing revamp", "").unwrap();
    let key = EvaluationKey::new(project.id.clone(), "m1");
    let mut opened = service.open(key.clone(), &template()).await.unwrap();
    opened.form.set_score("1", "70").unwrap();
    service
        .save(&mut opened.form, RecordNames::default())
        .await
        .unwrap();
    assert!(service.has_evaluation(&key));

    registry.delete(&project.id).unwrap();
    assert!(!service.has_evaluation(&key));

    // Reopening the store from disk sees the same state.
    drop(registry);
    let reopened = Arc::new(JsonFileStore::open(dir.path().join("store.json")).unwrap());
    let registry = ProjectRegistry::open(reopened).unwrap();
    assert!(registry.get(&project.id).is_none());
}
