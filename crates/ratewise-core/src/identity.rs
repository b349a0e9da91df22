//! Who is using ratewise, as remembered between runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{PM_ID_KEY, USERNAME_KEY, USER_ROLE_KEY};
use crate::traits::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Pm,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Pm => write!(f, "pm"),
            Role::User => write!(f, "user"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pm" => Ok(Role::Pm),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The signed-in user and the PM whose team and template are in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub username: Option<String>,
    pub role: Option<Role>,
    pub pm_id: String,
}

impl SessionIdentity {
    /// Read the stored identity. `default_pm_id` applies when no PM id was
    /// stored.
    pub fn load<S: KeyValueStore>(store: &S, default_pm_id: &str) -> Result<Self, StoreError> {
        let username = store.get_raw(USERNAME_KEY)?;
        let role = store
            .get_raw(USER_ROLE_KEY)?
            .and_then(|raw| raw.parse::<Role>().ok());
        let pm_id = store
            .get_raw(PM_ID_KEY)?
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| default_pm_id.to_string());
        Ok(Self {
            username,
            role,
            pm_id,
        })
    }

    pub fn save<S: KeyValueStore>(&self, store: &S) -> Result<(), StoreError> {
        match &self.username {
            Some(username) => store.set_raw(USERNAME_KEY, username.clone())?,
            None => store.remove(USERNAME_KEY)?,
        }
        match self.role {
            Some(role) => store.set_raw(USER_ROLE_KEY, role.to_string())?,
            None => store.remove(USER_ROLE_KEY)?,
        }
        store.set_raw(PM_ID_KEY, self.pm_id.clone())
    }

    /// Forget the user but keep the PM scope.
    pub fn clear<S: KeyValueStore>(store: &S) -> Result<(), StoreError> {
        store.remove(USERNAME_KEY)?;
        store.remove(USER_ROLE_KEY)
    }
}
