//! The evaluation workflow over a remote API and a local cache.
//!
//! Reads never fail on an unreachable or erroring backend; they degrade to
//! cached or default data. Writes surface every failure and leave the form as
//! it was, so the user can simply retry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::error::{ApiError, LoadError, SaveError, StoreError, SubmitError};
use crate::form::EvaluationForm;
use crate::grade::GradeTable;
use crate::loader::{DataOrigin, FallbackChain, LoadContext};
use crate::model::{
    EvaluationKey, EvaluationRecord, FeedbackRequest, InterviewRequest, Member, TemplateItem,
};
use crate::result::EmployeeResult;
use crate::scoring::RatioPolicy;
use crate::settings::EvaluationSettings;
use crate::store::evaluation_data_key;
use crate::traits::{EvaluationApi, KeyValueStore};

/// Tunables for the workflow.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub ratio_policy: RatioPolicy,
    pub grades: GradeTable,
    /// Login name to employee id, for the yearly result lookup.
    pub employee_aliases: HashMap<String, String>,
}

/// Members and template, fetched together when a page opens.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub members: Vec<Member>,
    pub template: Vec<TemplateItem>,
}

/// A form ready for editing, plus where its values came from.
#[derive(Debug)]
pub struct OpenedEvaluation {
    pub form: EvaluationForm,
    pub origin: DataOrigin,
}

/// Display names recorded alongside a saved evaluation.
#[derive(Debug, Clone, Default)]
pub struct RecordNames {
    pub project_name: Option<String>,
    pub member_name: Option<String>,
}

/// An interview slot request as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct InterviewSlot {
    pub date: String,
    pub time: String,
    pub message: String,
}

pub struct EvaluationService<A, S> {
    api: Arc<A>,
    store: Arc<S>,
    chain: FallbackChain,
    config: ServiceConfig,
}

impl<A, S> EvaluationService<A, S>
where
    A: EvaluationApi + 'static,
    S: KeyValueStore + 'static,
{
    pub fn new(api: Arc<A>, store: Arc<S>, config: ServiceConfig) -> Self {
        let chain = FallbackChain::standard(Arc::clone(&api), Arc::clone(&store));
        Self {
            api,
            store,
            chain,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn grades(&self) -> &GradeTable {
        &self.config.grades
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The PM's team. Empty when the backend is unavailable.
    #[instrument(skip(self))]
    pub async fn members(&self, pm_id: &str) -> Result<Vec<Member>, ApiError> {
        degrade(self.api.team_members(pm_id).await, "team members")
    }

    /// The rating template: the backend's, else the settings saved locally
    /// for the project, else empty.
    #[instrument(skip(self))]
    pub async fn template(&self, pm_id: &str, project_id: &str) -> Result<Vec<TemplateItem>, ApiError> {
        let remote = degrade(self.api.rating_items(pm_id).await, "rating items")?;
        if !remote.is_empty() {
            return Ok(remote);
        }
        match EvaluationSettings::load_saved(self.store.as_ref(), project_id) {
            Ok(Some(items)) => {
                info!(project = project_id, "using locally saved evaluation settings");
                Ok(items)
            }
            Ok(None) => Ok(Vec::new()),
            Err(e) => {
                warn!("ignoring saved evaluation settings: {e}");
                Ok(Vec::new())
            }
        }
    }

    /// Members and template, fetched concurrently.
    pub async fn reference_data(&self, pm_id: &str, project_id: &str) -> Result<ReferenceData, ApiError> {
        let (members, template) =
            futures::join!(self.members(pm_id), self.template(pm_id, project_id));
        Ok(ReferenceData {
            members: members?,
            template: template?,
        })
    }

    /// Build the form for a member from the first source that has data.
    pub async fn open(
        &self,
        key: EvaluationKey,
        template: &[TemplateItem],
    ) -> Result<OpenedEvaluation, LoadError> {
        if template.is_empty() {
            return Err(LoadError::MissingTemplate);
        }
        let ctx = LoadContext {
            key: &key,
            template,
        };
        let (items, origin) = self
            .chain
            .load(&ctx)
            .await
            .ok_or(LoadError::MissingTemplate)?;

        let mut form = EvaluationForm::new(key);
        form.load(items);
        Ok(OpenedEvaluation { form, origin })
    }

    /// Validate, submit, and cache a form.
    ///
    /// A ratio or API failure leaves the form untouched. Once the backend
    /// has accepted the ratings the form is `Saved`, even if writing the
    /// local copy then fails.
    #[instrument(skip_all, fields(project = %form.key().project_id, member = %form.key().member_id))]
    pub async fn save(
        &self,
        form: &mut EvaluationForm,
        names: RecordNames,
    ) -> Result<EvaluationRecord, SaveError> {
        let request = form.prepare_save(self.config.ratio_policy)?;

        let accepted = self.api.save_user_ratings(&request).await?;
        if !accepted {
            warn!("backend reported the ratings as not stored");
        }
        form.mark_saved();

        let record = EvaluationRecord {
            project_id: form.key().project_id.clone(),
            project_name: names.project_name,
            member_id: form.key().member_id.clone(),
            member_name: names.member_name,
            items: Some(form.items().to_vec()),
            total_score: Some(form.total_score()),
            evaluated_at: Utc::now(),
        };
        self.store
            .set_json(&evaluation_data_key(form.key()), &record)?;
        info!(total = %request.total_score, "evaluation saved");
        Ok(record)
    }

    /// Whether this machine holds a saved evaluation for the pair.
    pub fn has_evaluation(&self, key: &EvaluationKey) -> bool {
        self.store
            .contains(&evaluation_data_key(key))
            .unwrap_or(false)
    }

    pub fn cached_record(&self, key: &EvaluationKey) -> Result<Option<EvaluationRecord>, StoreError> {
        self.store.get_json(&evaluation_data_key(key))
    }

    pub async fn submit_feedback(
        &self,
        key: &EvaluationKey,
        member_name: Option<String>,
        feedback: &str,
    ) -> Result<(), SubmitError> {
        if feedback.trim().is_empty() {
            return Err(SubmitError::Invalid("feedback must not be empty".into()));
        }
        let request = FeedbackRequest {
            project_id: key.project_id.clone(),
            member_id: key.member_id.clone(),
            member_name,
            feedback: feedback.to_string(),
            requested_at: Utc::now(),
        };
        self.api.submit_feedback(&request).await?;
        Ok(())
    }

    pub async fn request_interview(
        &self,
        key: &EvaluationKey,
        member_name: Option<String>,
        slot: InterviewSlot,
    ) -> Result<(), SubmitError> {
        if slot.date.trim().is_empty() || slot.time.trim().is_empty() {
            return Err(SubmitError::Invalid(
                "a preferred date and time are required".into(),
            ));
        }
        let request = InterviewRequest {
            project_id: key.project_id.clone(),
            member_id: key.member_id.clone(),
            member_name,
            requested_date: slot.date,
            requested_time: slot.time,
            message: slot.message,
            requested_at: Utc::now(),
        };
        self.api.submit_interview_request(&request).await?;
        Ok(())
    }

    /// Yearly result for a login name or employee id.
    pub async fn employee_result(&self, employee: &str, year: i32) -> Result<EmployeeResult, ApiError> {
        let employee_id = self
            .config
            .employee_aliases
            .get(employee)
            .map(String::as_str)
            .unwrap_or(employee);
        self.api.employee_result(employee_id, year).await
    }
}

/// Turn unavailable-backend failures into an empty list.
fn degrade<T>(result: Result<Vec<T>, ApiError>, what: &str) -> Result<Vec<T>, ApiError> {
    match result {
        Err(e) if e.is_read_fallback() => {
            warn!("{what} unavailable, continuing without: {e}");
            Ok(Vec::new())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::form::FormState;
    use crate::model::{MemberRating, SaveRequest};
    use crate::settings::default_template;
    use crate::store::MemoryStore;

    /// Scripted backend: `None` means "unreachable".
    #[derive(Default)]
    struct ScriptedApi {
        members: Option<Vec<Member>>,
        template: Option<Vec<TemplateItem>>,
        ratings: Option<Vec<MemberRating>>,
        save_fails: bool,
        saved: Mutex<Vec<SaveRequest>>,
        feedback: Mutex<Vec<FeedbackRequest>>,
    }

    fn unreachable() -> ApiError {
        ApiError::Network("connection refused".into())
    }

    #[async_trait]
    impl EvaluationApi for ScriptedApi {
        async fn team_members(&self, _: &str) -> Result<Vec<Member>, ApiError> {
            self.members.clone().ok_or_else(unreachable)
        }

        async fn rating_items(&self, _: &str) -> Result<Vec<TemplateItem>, ApiError> {
            self.template.clone().ok_or_else(unreachable)
        }

        async fn member_ratings(&self, _: &str) -> Result<Vec<MemberRating>, ApiError> {
            self.ratings.clone().ok_or_else(unreachable)
        }

        async fn save_user_ratings(&self, request: &SaveRequest) -> Result<bool, ApiError> {
            if self.save_fails {
                return Err(ApiError::Server {
                    status: 500,
                    message: "database down".into(),
                });
            }
            self.saved.lock().unwrap().push(request.clone());
            Ok(true)
        }

        async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<(), ApiError> {
            self.feedback.lock().unwrap().push(request.clone());
            Ok(())
        }

        async fn submit_interview_request(&self, _: &InterviewRequest) -> Result<(), ApiError> {
            Err(unreachable())
        }

        async fn employee_result(&self, employee_id: &str, _: i32) -> Result<EmployeeResult, ApiError> {
            Ok(EmployeeResult {
                name: employee_id.to_string(),
                center: String::new(),
                division: String::new(),
                team: String::new(),
                score: 91.0,
                feedback: None,
            })
        }
    }

    fn service(api: ScriptedApi) -> EvaluationService<ScriptedApi, MemoryStore> {
        EvaluationService::new(
            Arc::new(api),
            Arc::new(MemoryStore::new()),
            ServiceConfig::default(),
        )
    }

    fn key() -> EvaluationKey {
        EvaluationKey::new("project-001", "m1")
    }

    #[tokio::test]
    async fn unreachable_backend_reads_degrade_to_empty() {
        let svc = service(ScriptedApi::default());
        let data = svc.reference_data("pm", "project-001").await.unwrap();
        assert!(data.members.is_empty());
        assert!(data.template.is_empty());
    }

    #[tokio::test]
    async fn schema_errors_surface_on_reads() {
        struct BadShape;
        #[async_trait]
        impl EvaluationApi for BadShape {
            async fn team_members(&self, _: &str) -> Result<Vec<Member>, ApiError> {
                Err(ApiError::Schema("id missing".into()))
            }
            async fn rating_items(&self, _: &str) -> Result<Vec<TemplateItem>, ApiError> {
                Ok(vec![])
            }
            async fn member_ratings(&self, _: &str) -> Result<Vec<MemberRating>, ApiError> {
                Ok(vec![])
            }
            async fn save_user_ratings(&self, _: &SaveRequest) -> Result<bool, ApiError> {
                Ok(true)
            }
            async fn submit_feedback(&self, _: &FeedbackRequest) -> Result<(), ApiError> {
                Ok(())
            }
            async fn submit_interview_request(&self, _: &InterviewRequest) -> Result<(), ApiError> {
                Ok(())
            }
            async fn employee_result(&self, _: &str, _: i32) -> Result<EmployeeResult, ApiError> {
                Err(ApiError::Schema("score".into()))
            }
        }

        let svc = EvaluationService::new(
            Arc::new(BadShape),
            Arc::new(MemoryStore::new()),
            ServiceConfig::default(),
        );
        assert!(matches!(svc.members("pm").await, Err(ApiError::Schema(_))));
    }

    #[tokio::test]
    async fn template_falls_back_to_saved_settings() {
        let svc = service(ScriptedApi {
            template: Some(vec![]),
            ..Default::default()
        });
        EvaluationSettings::default()
            .save(svc.store(), "project-001", RatioPolicy::exact())
            .unwrap();
        let template = svc.template("pm", "project-001").await.unwrap();
        assert_eq!(template, default_template());
    }

    #[tokio::test]
    async fn open_without_template_is_refused() {
        let svc = service(ScriptedApi::default());
        assert!(matches!(
            svc.open(key(), &[]).await,
            Err(LoadError::MissingTemplate)
        ));
    }

    #[tokio::test]
    async fn open_prefers_remote_ratings() {
        let svc = service(ScriptedApi {
            ratings: Some(vec![MemberRating {
                item_id: "1".into(),
                user_id: "m1".into(),
                score: 88,
                bonus: 1,
                comment: "clean code".into(),
            }]),
            ..Default::default()
        });
        let opened = svc.open(key(), &default_template()).await.unwrap();
        assert_eq!(opened.origin, DataOrigin::Remote);
        assert_eq!(opened.form.state(), FormState::Draft);
        assert_eq!(opened.form.item("1").unwrap().score, 88);
        assert_eq!(opened.form.item("2").unwrap().score, 0);
    }

    #[tokio::test]
    async fn open_falls_back_to_template_when_nothing_stored() {
        let svc = service(ScriptedApi::default());
        let opened = svc.open(key(), &default_template()).await.unwrap();
        assert_eq!(opened.origin, DataOrigin::Template);
        assert_eq!(opened.form.items().len(), 5);
    }

    #[tokio::test]
    async fn save_then_reload_round_trips_through_cache() {
        let svc = service(ScriptedApi::default());
        let mut opened = svc.open(key(), &default_template()).await.unwrap();
        opened.form.set_score("1", "80").unwrap();
        opened.form.set_bonus("2", "2").unwrap();
        opened.form.set_comment("3", "tidy UI").unwrap();

        let record = svc
            .save(
                &mut opened.form,
                RecordNames {
                    project_name: Some("Mobile app renewal".into()),
                    member_name: Some("kim".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(opened.form.state(), FormState::Saved);
        assert_eq!(record.member_name.as_deref(), Some("kim"));
        assert!(svc.has_evaluation(&key()));

        let saved = svc.api.saved.lock().unwrap().clone();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].total_score, "24.50");

        // Backend unreachable on reload, so the cached copy wins.
        let reloaded = svc.open(key(), &default_template()).await.unwrap();
        assert_eq!(reloaded.origin, DataOrigin::Cache);
        assert_eq!(reloaded.form.items(), opened.form.items());
    }

    #[tokio::test]
    async fn save_with_bad_ratios_is_blocked_before_the_backend() {
        let svc = service(ScriptedApi::default());
        let mut template = default_template();
        template[4].ratio = 5.0;
        let mut opened = svc.open(key(), &template).await.unwrap();
        opened.form.set_score("1", "90").unwrap();

        let err = svc
            .save(&mut opened.form, RecordNames::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::Ratio(e) if e.deficit() == 5.0));
        assert_eq!(opened.form.state(), FormState::Draft);
        assert!(svc.api.saved.lock().unwrap().is_empty());
        assert!(!svc.has_evaluation(&key()));
        assert!((opened.form.total_score() - 27.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn failed_save_leaves_form_and_cache_alone() {
        let svc = service(ScriptedApi {
            save_fails: true,
            ..Default::default()
        });
        let mut opened = svc.open(key(), &default_template()).await.unwrap();
        opened.form.set_score("1", "50").unwrap();
        let before = opened.form.items().to_vec();

        let err = svc
            .save(&mut opened.form, RecordNames::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("database down"));
        assert_eq!(opened.form.state(), FormState::Draft);
        assert_eq!(opened.form.items(), before.as_slice());
        assert!(!svc.has_evaluation(&key()));
    }

    #[tokio::test]
    async fn feedback_requires_text() {
        let svc = service(ScriptedApi::default());
        assert!(matches!(
            svc.submit_feedback(&key(), None, "   ").await,
            Err(SubmitError::Invalid(_))
        ));
        svc.submit_feedback(&key(), Some("kim".into()), "please recheck item 2")
            .await
            .unwrap();
        let sent = svc.api.feedback.lock().unwrap().clone();
        assert_eq!(sent[0].member_id, "m1");
        assert_eq!(sent[0].feedback, "please recheck item 2");
    }

    #[tokio::test]
    async fn interview_validation_and_failure() {
        let svc = service(ScriptedApi::default());
        let missing_time = InterviewSlot {
            date: "2025-06-01".into(),
            ..Default::default()
        };
        assert!(matches!(
            svc.request_interview(&key(), None, missing_time).await,
            Err(SubmitError::Invalid(_))
        ));

        let slot = InterviewSlot {
            date: "2025-06-01".into(),
            time: "14:00".into(),
            message: String::new(),
        };
        assert!(matches!(
            svc.request_interview(&key(), None, slot).await,
            Err(SubmitError::Api(ApiError::Network(_)))
        ));
    }

    #[tokio::test]
    async fn employee_aliases_resolve_login_names() {
        let mut config = ServiceConfig::default();
        config
            .employee_aliases
            .insert("user".into(), "a6f3b0e8d2c9h1g7k4j".into());
        let svc = EvaluationService::new(
            Arc::new(ScriptedApi::default()),
            Arc::new(MemoryStore::new()),
            config,
        );
        let result = svc.employee_result("user", 2025).await.unwrap();
        assert_eq!(result.name, "a6f3b0e8d2c9h1g7k4j");
        assert_eq!(result.grade(svc.grades()).as_str(), "A");

        let direct = svc.employee_result("e-42", 2025).await.unwrap();
        assert_eq!(direct.name, "e-42");
    }
}
