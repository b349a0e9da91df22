//! Admin editing of the evaluation item template.

use thiserror::Error;

use crate::error::{RatioError, StoreError};
use crate::model::TemplateItem;
use crate::scoring::RatioPolicy;
use crate::store::evaluation_settings_key;
use crate::traits::KeyValueStore;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("item name must not be empty")]
    EmptyName,

    #[error("unknown evaluation item: {0}")]
    UnknownItem(String),

    #[error("ratio {0} is outside 0..=100")]
    RatioOutOfRange(f64),

    #[error("at least one evaluation item is required")]
    LastItem,

    #[error(transparent)]
    Ratio(#[from] RatioError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A single field edit on a template item.
#[derive(Debug, Clone)]
pub enum SettingsField {
    Name(String),
    /// Raw ratio text; anything unparsable counts as 0.
    Ratio(String),
    Description(String),
}

/// An editable copy of the rating template.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSettings {
    items: Vec<TemplateItem>,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            items: default_template(),
        }
    }
}

impl EvaluationSettings {
    pub fn new(items: Vec<TemplateItem>) -> Self {
        Self { items }
    }

    /// Settings saved for a project, or the default template.
    pub fn load<S: KeyValueStore>(store: &S, project_id: &str) -> Result<Self, StoreError> {
        let saved: Option<Vec<TemplateItem>> =
            store.get_json(&evaluation_settings_key(project_id))?;
        Ok(saved.map(Self::new).unwrap_or_default())
    }

    /// Settings saved for a project, if any.
    pub fn load_saved<S: KeyValueStore>(
        store: &S,
        project_id: &str,
    ) -> Result<Option<Vec<TemplateItem>>, StoreError> {
        store.get_json(&evaluation_settings_key(project_id))
    }

    pub fn items(&self) -> &[TemplateItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<TemplateItem> {
        self.items
    }

    pub fn total_ratio(&self) -> f64 {
        self.items.iter().map(|item| item.ratio).sum()
    }

    /// Append an item with the next free numeric id.
    pub fn add(&mut self, name: &str, ratio: f64, description: &str) -> Result<&TemplateItem, SettingsError> {
        if name.trim().is_empty() {
            return Err(SettingsError::EmptyName);
        }
        let ratio = checked_ratio(ratio)?;
        let next_id = self
            .items
            .iter()
            .filter_map(|item| item.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        self.items.push(TemplateItem {
            id: next_id.to_string(),
            name: name.to_string(),
            ratio,
            description: description.to_string(),
        });
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn remove(&mut self, id: &str) -> Result<TemplateItem, SettingsError> {
        let index = self.index_of(id)?;
        if self.items.len() <= 1 {
            return Err(SettingsError::LastItem);
        }
        Ok(self.items.remove(index))
    }

    pub fn update(&mut self, id: &str, field: SettingsField) -> Result<(), SettingsError> {
        let index = self.index_of(id)?;
        let item = &mut self.items[index];
        match field {
            SettingsField::Name(name) => item.name = name,
            SettingsField::Ratio(raw) => item.ratio = checked_ratio(parse_ratio(&raw))?,
            SettingsField::Description(description) => item.description = description,
        }
        Ok(())
    }

    /// Persist for a project. Refused unless the ratio sum passes `policy`.
    pub fn save<S: KeyValueStore>(
        &self,
        store: &S,
        project_id: &str,
        policy: RatioPolicy,
    ) -> Result<(), SettingsError> {
        if let Some(item) = self.items.iter().find(|item| !(0.0..=100.0).contains(&item.ratio)) {
            return Err(SettingsError::RatioOutOfRange(item.ratio));
        }
        policy.check(self.total_ratio())?;
        store.set_json(&evaluation_settings_key(project_id), &self.items)?;
        Ok(())
    }

    fn index_of(&self, id: &str) -> Result<usize, SettingsError> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| SettingsError::UnknownItem(id.to_string()))
    }
}

fn checked_ratio(ratio: f64) -> Result<f64, SettingsError> {
    if (0.0..=100.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(SettingsError::RatioOutOfRange(ratio))
    }
}

/// Lenient ratio parsing for the settings form.
pub fn parse_ratio(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|ratio| ratio.is_finite())
        .unwrap_or(0.0)
}

/// The stock template: five items summing to 100.
pub fn default_template() -> Vec<TemplateItem> {
    [
        ("1", "Code quality", 30.0, "Readability, structure, and standards compliance"),
        ("2", "Feature completeness", 25.0, "How fully the requirements are met"),
        ("3", "User experience", 20.0, "UI/UX quality and ease of use"),
        ("4", "Performance", 15.0, "Execution speed and resource efficiency"),
        ("5", "Documentation", 10.0, "Comments, README, and technical docs"),
    ]
    .into_iter()
    .map(|(id, name, ratio, description)| TemplateItem {
        id: id.to_string(),
        name: name.to_string(),
        ratio,
        description: description.to_string(),
    })
    .collect()
}
