//! The project list and the current-project selection.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::Project;
use crate::store::{belongs_to_project, CURRENT_PROJECT_KEY, PROJECTS_KEY};
use crate::traits::{KeyValueStore, ProjectAccessor};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("unknown project: {0}")]
    NotFound(String),

    #[error("project name must not be empty")]
    EmptyName,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Changes to apply to a project. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Projects persisted under `projects`, with the selection under
/// `currentProjectId`. Every mutation is written through immediately.
pub struct ProjectRegistry<S> {
    store: Arc<S>,
    projects: Vec<Project>,
    current: Option<String>,
}

impl<S: KeyValueStore> ProjectRegistry<S> {
    /// Load the registry, seeding the default projects on first use.
    pub fn open(store: Arc<S>) -> Result<Self, ProjectError> {
        let stored: Option<Vec<Project>> = store.get_json(PROJECTS_KEY)?;
        let stored_current = store.get_raw(CURRENT_PROJECT_KEY)?;

        let mut registry = match stored {
            Some(projects) => {
                let current = stored_current
                    .filter(|id| projects.iter().any(|p| &p.id == id))
                    .or_else(|| projects.first().map(|p| p.id.clone()));
                Self {
                    store,
                    projects,
                    current,
                }
            }
            None => {
                info!("no stored projects, seeding defaults");
                let projects = default_projects();
                let current = projects.first().map(|p| p.id.clone());
                Self {
                    store,
                    projects,
                    current,
                }
            }
        };
        registry.persist()?;
        Ok(registry)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Create a project and make it current.
    pub fn add(&mut self, name: &str, description: &str) -> Result<Project, ProjectError> {
        if name.trim().is_empty() {
            return Err(ProjectError::EmptyName);
        }
        let project = Project {
            id: format!("project-{}", Uuid::new_v4().simple()),
            name: name.trim().to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };
        self.projects.push(project.clone());
        self.current = Some(project.id.clone());
        self.persist()?;
        Ok(project)
    }

    pub fn update(&mut self, id: &str, update: ProjectUpdate) -> Result<&Project, ProjectError> {
        let index = self
            .projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ProjectError::NotFound(id.to_string()))?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(ProjectError::EmptyName);
            }
            self.projects[index].name = name;
        }
        if let Some(description) = update.description {
            self.projects[index].description = description;
        }
        self.persist()?;
        Ok(&self.projects[index])
    }

    /// Remove a project together with all evaluation data and settings
    /// stored for it.
    pub fn delete(&mut self, id: &str) -> Result<(), ProjectError> {
        if self.get(id).is_none() {
            return Err(ProjectError::NotFound(id.to_string()));
        }
        self.projects.retain(|p| p.id != id);
        if self.current.as_deref() == Some(id) {
            self.current = self.projects.first().map(|p| p.id.clone());
        }

        let owned: Vec<String> = self
            .store
            .keys()?
            .into_iter()
            .filter(|key| belongs_to_project(key, id))
            .collect();
        for key in &owned {
            self.store.remove(key)?;
        }
        info!(project = id, removed_keys = owned.len(), "project deleted");

        self.persist()
    }

    /// Switch to a known project. Unknown ids are refused.
    pub fn select(&mut self, id: &str) -> Result<(), ProjectError> {
        if self.get(id).is_none() {
            return Err(ProjectError::NotFound(id.to_string()));
        }
        self.current = Some(id.to_string());
        self.persist()
    }

    fn persist(&mut self) -> Result<(), ProjectError> {
        self.store.set_json(PROJECTS_KEY, &self.projects)?;
        match &self.current {
            Some(id) => self.store.set_raw(CURRENT_PROJECT_KEY, id.clone())?,
            None => self.store.remove(CURRENT_PROJECT_KEY)?,
        }
        Ok(())
    }
}

impl<S: KeyValueStore> ProjectAccessor for ProjectRegistry<S> {
    fn current_project_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn current_project(&self) -> Option<&Project> {
        self.current.as_deref().and_then(|id| self.get(id))
    }
}

fn seeded(id: &str, name: &str, description: &str, created_at: &str) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        created_at: created_at.parse::<DateTime<Utc>>().unwrap_or_default(),
    }
}

/// Projects created the first time ratewise runs against an empty store.
pub fn default_projects() -> Vec<Project> {
    vec![
        seeded(
            "project-001",
            "Mobile app renewal",
            "iOS/Android app UI/UX overhaul",
            "2025-01-15T09:00:00Z",
        ),
        seeded(
            "project-002",
            "ERP rollout",
            "Company-wide resource planning system",
            "2025-02-01T09:00:00Z",
        ),
        seeded(
            "project-003",
            "AI chatbot service",
            "Automated customer support chatbot",
            "2025-03-10T09:00:00Z",
        ),
        seeded(
            "project-004",
            "Data analytics platform",
            "Data collection and analytics dashboards",
            "2025-04-05T09:00:00Z",
        ),
        seeded(
            "project-005",
            "Cloud migration",
            "On-premises to AWS migration",
            "2025-05-20T09:00:00Z",
        ),
    ]
}
