//! Configuration loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use ratewise_core::grade::{GradeTable, GradeTier};
use ratewise_core::scoring::RatioPolicy;
use ratewise_core::service::ServiceConfig;

use crate::http::{HttpClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// PM used when neither the session nor the config names one.
pub const DEFAULT_PM_ID: &str = "4g9b2e7f1c8a0d6h3k5j";

/// Connection settings for the scoring backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Top-level ratewise configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatewiseConfig {
    /// Default PM whose team and template are loaded.
    #[serde(default = "default_pm_id")]
    pub pm_id: String,
    /// Where the local cache lives.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Allowed distance of the ratio sum from 100. Zero means exact.
    #[serde(default)]
    pub ratio_tolerance: f64,
    /// Label used when no grade tier matches.
    #[serde(default = "default_fallback_grade")]
    pub fallback_grade: String,
    #[serde(default)]
    pub api: ApiConfig,
    /// Grade tiers, highest first.
    #[serde(default = "default_grades")]
    pub grades: Vec<GradeTier>,
    /// Login name to employee id for the yearly result lookup.
    #[serde(default = "default_aliases")]
    pub employee_aliases: HashMap<String, String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_pm_id() -> String {
    DEFAULT_PM_ID.to_string()
}
fn default_store_path() -> PathBuf {
    PathBuf::from(".ratewise/store.json")
}
fn default_fallback_grade() -> String {
    GradeTable::default().fallback
}
fn default_grades() -> Vec<GradeTier> {
    GradeTable::default().tiers
}
fn default_aliases() -> HashMap<String, String> {
    HashMap::from([
        ("user".to_string(), "a6f3b0e8d2c9h1g7k4j".to_string()),
        ("user2".to_string(), "d8g2b5f0c1h3e6k7a9j".to_string()),
    ])
}

impl Default for RatewiseConfig {
    fn default() -> Self {
        Self {
            pm_id: default_pm_id(),
            store_path: default_store_path(),
            ratio_tolerance: 0.0,
            fallback_grade: default_fallback_grade(),
            api: ApiConfig::default(),
            grades: default_grades(),
            employee_aliases: default_aliases(),
        }
    }
}

impl RatewiseConfig {
    pub fn grade_table(&self) -> GradeTable {
        GradeTable::new(self.grades.clone(), &self.fallback_grade)
    }

    pub fn ratio_policy(&self) -> RatioPolicy {
        RatioPolicy::with_tolerance(self.ratio_tolerance)
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            ratio_policy: self.ratio_policy(),
            grades: self.grade_table(),
            employee_aliases: self.employee_aliases.clone(),
        }
    }

    pub fn create_client(&self) -> Result<HttpClient> {
        HttpClient::new(&self.api.base_url, self.api.timeout_secs)
            .context("failed to create the API client")
    }

    fn validate(&self) -> Result<()> {
        if !self.ratio_tolerance.is_finite() || self.ratio_tolerance < 0.0 {
            anyhow::bail!(
                "ratio_tolerance must be a non-negative number, got {}",
                self.ratio_tolerance
            );
        }
        if self.pm_id.trim().is_empty() {
            anyhow::bail!("pm_id must not be empty");
        }
        Ok(())
    }
}

/// Contents written by `ratewise init`.
pub const SAMPLE_CONFIG: &str = r#"# ratewise configuration

# PM whose team and rating template are loaded.
pm_id = "4g9b2e7f1c8a0d6h3k5j"

# Local cache of projects, settings and saved evaluations.
store_path = ".ratewise/store.json"

# How far the ratio sum may drift from 100. 0 requires exactly 100.
ratio_tolerance = 0.0

fallback_grade = "B-"

[api]
base_url = "${RATEWISE_API_URL}"
timeout_secs = 10

[[grades]]
label = "A"
min = 90.0
inclusive = true

[[grades]]
label = "B+"
min = 80.0
inclusive = false

[employee_aliases]
user = "a6f3b0e8d2c9h1g7k4j"
user2 = "d8g2b5f0c1h3e6k7a9j"
"#;

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are copied verbatim and never scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `ratewise.toml` in the current directory
/// 2. `~/.config/ratewise/config.toml`
///
/// Environment variable overrides: `RATEWISE_API_URL`, `RATEWISE_PM_ID`.
pub fn load_config() -> Result<RatewiseConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<RatewiseConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("ratewise.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<RatewiseConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => RatewiseConfig::default(),
    };

    config.api.base_url = resolve_env_vars(&config.api.base_url);
    config.pm_id = resolve_env_vars(&config.pm_id);

    // Apply env var overrides
    if let Ok(url) = std::env::var("RATEWISE_API_URL") {
        if !url.is_empty() {
            config.api.base_url = url;
        }
    }
    if let Ok(pm_id) = std::env::var("RATEWISE_PM_ID") {
        if !pm_id.is_empty() {
            config.pm_id = pm_id;
        }
    }
    if config.api.base_url.is_empty() {
        config.api.base_url = default_base_url();
    }

    config.validate()?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("ratewise"))
}
