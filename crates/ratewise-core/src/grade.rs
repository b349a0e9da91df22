//! Grade classification from a total score.
//!
//! Grades come from an ordered threshold table rather than a fixed match, so
//! deployments can move boundaries or add tiers through configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A classification label such as `A` or `B+`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grade(pub String);

impl Grade {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of a grade table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeTier {
    /// Label assigned when the score clears this tier.
    pub label: String,
    /// Lower bound of the tier.
    pub min: f64,
    /// Whether a score equal to `min` belongs to this tier.
    #[serde(default = "default_inclusive")]
    pub inclusive: bool,
}

fn default_inclusive() -> bool {
    true
}

impl GradeTier {
    pub fn at_least(label: &str, min: f64) -> Self {
        Self {
            label: label.to_string(),
            min,
            inclusive: true,
        }
    }

    pub fn above(label: &str, min: f64) -> Self {
        Self {
            label: label.to_string(),
            min,
            inclusive: false,
        }
    }

    fn admits(&self, score: f64) -> bool {
        if self.inclusive {
            score >= self.min
        } else {
            score > self.min
        }
    }
}

/// Ordered tiers, checked top to bottom; the first tier that admits the
/// score wins, otherwise the fallback label applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeTable {
    pub tiers: Vec<GradeTier>,
    pub fallback: String,
}

impl Default for GradeTable {
    /// `>= 90` is `A`, `> 80` is `B+`, everything else `B-`.
    fn default() -> Self {
        Self {
            tiers: vec![GradeTier::at_least("A", 90.0), GradeTier::above("B+", 80.0)],
            fallback: "B-".to_string(),
        }
    }
}

impl GradeTable {
    pub fn new(tiers: Vec<GradeTier>, fallback: impl Into<String>) -> Self {
        Self {
            tiers,
            fallback: fallback.into(),
        }
    }

    pub fn classify(&self, total_score: f64) -> Grade {
        let label = self
            .tiers
            .iter()
            .find(|tier| tier.admits(total_score))
            .map(|tier| tier.label.as_str())
            .unwrap_or(&self.fallback);
        Grade(label.to_string())
    }
}
