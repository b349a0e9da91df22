//! Local storage keys and an in-memory [`KeyValueStore`].

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreError;
use crate::model::EvaluationKey;
use crate::traits::KeyValueStore;

pub const PROJECTS_KEY: &str = "projects";
pub const CURRENT_PROJECT_KEY: &str = "currentProjectId";
pub const USERNAME_KEY: &str = "username";
pub const USER_ROLE_KEY: &str = "userRole";
pub const PM_ID_KEY: &str = "PM_ID";

const EVALUATION_DATA_PREFIX: &str = "evaluationData-";
const EVALUATION_SETTINGS_PREFIX: &str = "evaluationSettings-";

/// `evaluationData-{projectId}-{memberId}`
pub fn evaluation_data_key(key: &EvaluationKey) -> String {
    format!(
        "{EVALUATION_DATA_PREFIX}{}-{}",
        key.project_id, key.member_id
    )
}

/// `evaluationSettings-{projectId}`
pub fn evaluation_settings_key(project_id: &str) -> String {
    format!("{EVALUATION_SETTINGS_PREFIX}{project_id}")
}

/// Whether a key holds a saved evaluation of any project.
pub fn is_evaluation_data_key(key: &str) -> bool {
    key.starts_with(EVALUATION_DATA_PREFIX)
}

/// Whether a key holds evaluation data or settings belonging to a project.
///
/// Settings keys match the id exactly; data keys must continue with `-`
/// after it. Project ids never contain a `-` past their `project-` prefix, so
/// `project-001` does not claim keys of `project-001f3a…`.
pub fn belongs_to_project(key: &str, project_id: &str) -> bool {
    if let Some(rest) = key.strip_prefix(EVALUATION_SETTINGS_PREFIX) {
        return rest == project_id;
    }
    key.strip_prefix(EVALUATION_DATA_PREFIX)
        .and_then(|rest| rest.strip_prefix(project_id))
        .is_some_and(|member| member.starts_with('-'))
}

/// A process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.keys().cloned().collect())
    }
}
