pub mod evaluate;
pub mod init;
pub mod login;
pub mod members;
pub mod projects;
pub mod records;
pub mod report;
pub mod settings;
pub mod show;
pub mod submit;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use ratewise_client::{HttpClient, RatewiseConfig};
use ratewise_core::identity::SessionIdentity;
use ratewise_core::model::{EvaluationKey, Member};
use ratewise_core::project::ProjectRegistry;
use ratewise_core::service::EvaluationService;
use ratewise_core::traits::ProjectAccessor;
use ratewise_store::JsonFileStore;

use crate::Format;

/// Configuration and local state shared by every command.
pub struct Context {
    pub config: RatewiseConfig,
    pub store: Arc<JsonFileStore>,
}

impl Context {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config = ratewise_client::load_config_from(config_path.as_deref())?;
        let store = JsonFileStore::open(&config.store_path).with_context(|| {
            format!("failed to open local store: {}", config.store_path.display())
        })?;
        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    pub fn client(&self) -> Result<Arc<HttpClient>> {
        Ok(Arc::new(self.config.create_client()?))
    }

    pub fn service(&self) -> Result<EvaluationService<HttpClient, JsonFileStore>> {
        Ok(EvaluationService::new(
            self.client()?,
            Arc::clone(&self.store),
            self.config.service_config(),
        ))
    }

    pub fn identity(&self) -> Result<SessionIdentity> {
        SessionIdentity::load(self.store.as_ref(), &self.config.pm_id)
            .context("failed to read the stored session")
    }

    pub fn registry(&self) -> Result<ProjectRegistry<JsonFileStore>> {
        ProjectRegistry::open(Arc::clone(&self.store)).context("failed to load projects")
    }

    /// The explicit project, else the current one. Returns id and name.
    pub fn project(&self, explicit: Option<String>) -> Result<(String, Option<String>)> {
        let registry = self.registry()?;
        match explicit {
            Some(id) => {
                let name = registry.get(&id).map(|p| p.name.clone());
                if name.is_none() {
                    anyhow::bail!("unknown project: {id}");
                }
                Ok((id, name))
            }
            None => {
                let project = registry.current_project().context(
                    "no current project. Create one with `ratewise projects add <name>`",
                )?;
                Ok((project.id.clone(), Some(project.name.clone())))
            }
        }
    }
}

/// Match a member by id or username. Unknown input is taken as an id, so
/// members can still be addressed while the backend is down.
pub fn resolve_member(members: &[Member], input: &str) -> (String, Option<String>) {
    members
        .iter()
        .find(|m| m.id == input || m.username == input)
        .map(|m| (m.id.clone(), Some(m.username.clone())))
        .unwrap_or_else(|| (input.to_string(), None))
}

pub fn evaluation_key(project_id: &str, member_id: &str) -> EvaluationKey {
    EvaluationKey::new(project_id, member_id)
}

/// Split `ID=VALUE`.
pub fn split_pair(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim(), v))
        .filter(|(k, _)| !k.is_empty())
        .with_context(|| format!("expected ID=VALUE, got `{raw}`"))
}

/// Print to stdout or write to a file.
pub fn emit(content: &str, output: Option<&Path>, format: Format) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {:?} output to {}", format, path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}
