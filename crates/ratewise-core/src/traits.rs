//! Trait definitions for the remote evaluation API and local persistence.
//!
//! `ratewise-client` implements [`EvaluationApi`] over HTTP and
//! `ratewise-store` implements [`KeyValueStore`] on disk.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, StoreError};
use crate::model::{
    FeedbackRequest, InterviewRequest, Member, MemberRating, Project, SaveRequest, TemplateItem,
};
use crate::result::EmployeeResult;

// ---------------------------------------------------------------------------
// Remote evaluation API
// ---------------------------------------------------------------------------

/// The scoring backend consumed by the evaluation flow.
#[async_trait]
pub trait EvaluationApi: Send + Sync {
    /// Members managed by the given PM. A 404 is an empty list.
    async fn team_members(&self, pm_id: &str) -> Result<Vec<Member>, ApiError>;

    /// The rating template configured for the given PM. A 404 is an empty list.
    async fn rating_items(&self, pm_id: &str) -> Result<Vec<TemplateItem>, ApiError>;

    /// Stored ratings for one member. A 404 is an empty list.
    async fn member_ratings(&self, user_id: &str) -> Result<Vec<MemberRating>, ApiError>;

    /// Persist a member's ratings together with the rounded total.
    async fn save_user_ratings(&self, request: &SaveRequest) -> Result<bool, ApiError>;

    async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<(), ApiError>;

    async fn submit_interview_request(&self, request: &InterviewRequest) -> Result<(), ApiError>;

    /// The yearly result sheet for an employee.
    async fn employee_result(&self, employee_id: &str, year: i32) -> Result<EmployeeResult, ApiError>;
}

// ---------------------------------------------------------------------------
// Local key-value store
// ---------------------------------------------------------------------------

/// String key-value persistence used as an offline cache.
///
/// Values are JSON documents. The store is not authoritative: anything in it
/// may be missing or stale.
pub trait KeyValueStore: Send + Sync {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// All keys currently stored, in no particular order.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get_raw(key)?.is_some())
    }

    /// Read and decode a JSON value.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        Self: Sized,
    {
        match self.get_raw(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StoreError::Serde {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Encode and write a JSON value.
    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Serde {
            key: key.to_string(),
            source,
        })?;
        self.set_raw(key, raw)
    }
}

// ---------------------------------------------------------------------------
// Current project
// ---------------------------------------------------------------------------

/// Read access to the project the user is working in.
///
/// Views receive this instead of reaching for shared global state.
pub trait ProjectAccessor {
    fn current_project_id(&self) -> Option<&str>;

    fn current_project(&self) -> Option<&Project>;
}
