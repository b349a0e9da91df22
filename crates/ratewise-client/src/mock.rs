//! In-memory backend for tests and offline demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use ratewise_core::error::ApiError;
use ratewise_core::model::{
    FeedbackRequest, InterviewRequest, Member, MemberRating, RatingSubmission, SaveRequest,
    TemplateItem,
};
use ratewise_core::result::EmployeeResult;
use ratewise_core::traits::EvaluationApi;

/// A mock scoring backend.
///
/// Saved ratings are kept per member and served back by `member_ratings`,
/// so a save followed by a reload behaves like the real server. Flip
/// [`MockApi::set_offline`] to make every call fail as unreachable.
#[derive(Default)]
pub struct MockApi {
    members: Vec<Member>,
    template: Vec<TemplateItem>,
    results: HashMap<String, EmployeeResult>,
    ratings: Mutex<HashMap<String, Vec<MemberRating>>>,
    saves: Mutex<Vec<SaveRequest>>,
    feedback: Mutex<Vec<FeedbackRequest>>,
    interviews: Mutex<Vec<InterviewRequest>>,
    offline: AtomicBool,
    call_count: AtomicU32,
}

impl MockApi {
    pub fn new(members: Vec<Member>, template: Vec<TemplateItem>) -> Self {
        Self {
            members,
            template,
            ..Self::default()
        }
    }

    pub fn with_result(mut self, employee_id: &str, result: EmployeeResult) -> Self {
        self.results.insert(employee_id.to_string(), result);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Number of calls made, including failed ones.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn saves(&self) -> Vec<SaveRequest> {
        self.saves.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn feedback(&self) -> Vec<FeedbackRequest> {
        self.feedback.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn interviews(&self) -> Vec<InterviewRequest> {
        self.interviews.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn enter(&self) -> Result<(), ApiError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.offline.load(Ordering::Relaxed) {
            Err(ApiError::Network("mock backend is offline".into()))
        } else {
            Ok(())
        }
    }
}

fn stored(rating: &RatingSubmission) -> MemberRating {
    MemberRating {
        item_id: rating.item_id.clone(),
        user_id: rating.user_id.clone(),
        score: rating.score,
        bonus: rating.bonus,
        comment: rating.comment.clone(),
    }
}

#[async_trait]
impl EvaluationApi for MockApi {
    async fn team_members(&self, _pm_id: &str) -> Result<Vec<Member>, ApiError> {
        self.enter()?;
        Ok(self.members.clone())
    }

    async fn rating_items(&self, _pm_id: &str) -> Result<Vec<TemplateItem>, ApiError> {
        self.enter()?;
        Ok(self.template.clone())
    }

    async fn member_ratings(&self, user_id: &str) -> Result<Vec<MemberRating>, ApiError> {
        self.enter()?;
        let ratings = self.ratings.lock().unwrap_or_else(|e| e.into_inner());
        Ok(ratings.get(user_id).cloned().unwrap_or_default())
    }

    async fn save_user_ratings(&self, request: &SaveRequest) -> Result<bool, ApiError> {
        self.enter()?;
        self.ratings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(
                request.key.member_id.clone(),
                request.ratings.iter().map(stored).collect(),
            );
        self.saves
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        Ok(true)
    }

    async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<(), ApiError> {
        self.enter()?;
        self.feedback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        Ok(())
    }

    async fn submit_interview_request(&self, request: &InterviewRequest) -> Result<(), ApiError> {
        self.enter()?;
        self.interviews
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        Ok(())
    }

    async fn employee_result(&self, employee_id: &str, _year: i32) -> Result<EmployeeResult, ApiError> {
        self.enter()?;
        self.results
            .get(employee_id)
            .cloned()
            .ok_or_else(|| ApiError::Server {
                status: 404,
                message: format!("no result for {employee_id}"),
            })
    }
}
