use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;
pub const NEUTRAL_SCORE: u8 = 3;

/// One Likert statement. Its identity is its position in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub category: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub description: Option<String>,
    pub prompts: Vec<String>,
}

impl Category {
    /// Text substituted for `{description}` in narrative templates.
    pub fn description_or_name(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    Mean,
    Sum,
}

impl AggregationMode {
    pub fn label(self) -> &'static str {
        match self {
            AggregationMode::Mean => "mean",
            AggregationMode::Sum => "sum",
        }
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown aggregation mode '{0}' (expected mean or sum)")]
pub struct UnknownMode(pub String);

impl FromStr for AggregationMode {
    type Err = UnknownMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mean" | "average" | "avg" => Ok(AggregationMode::Mean),
            "sum" | "total" => Ok(AggregationMode::Sum),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

/// Theoretical range of a single category score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreScale {
    pub min: f64,
    pub max: f64,
}

impl ScoreScale {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Position of `score` within the scale, clamped to 0.0..=1.0.
    pub fn fraction(&self, score: f64) -> f64 {
        if self.span() <= 0.0 {
            return 0.0;
        }
        ((score - self.min) / self.span()).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScore {
    pub category: String,
    pub score: f64,
    pub prompt_count: usize,
}

/// Ordered category scores for one submission, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSheet {
    pub mode: AggregationMode,
    pub scale: ScoreScale,
    pub scores: Vec<CategoryScore>,
}

impl ScoreSheet {
    pub fn get(&self, category: &str) -> Option<&CategoryScore> {
        self.scores.iter().find(|entry| entry.category == category)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Score formatted the way the terminal and Markdown output show it.
    pub fn display_score(&self, score: f64) -> String {
        match self.mode {
            AggregationMode::Mean => format!("{:.2}", score),
            AggregationMode::Sum => format!("{:.0}", score),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Strong,
    Balanced,
    Growth,
    High,
    Moderate,
    Low,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Level::Strong => "strong area",
            Level::Balanced => "balanced, room for growth",
            Level::Growth => "growth area",
            Level::High => "High",
            Level::Moderate => "Moderate",
            Level::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub category: String,
    pub score: f64,
    pub level: Level,
    pub narrative: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_aliases_and_names_bad_input() {
        assert_eq!("Mean".parse::<AggregationMode>(), Ok(AggregationMode::Mean));
        assert_eq!(" total ".parse::<AggregationMode>(), Ok(AggregationMode::Sum));

        let err = "median".parse::<AggregationMode>().expect_err("median is not a mode");
        assert_eq!(err, UnknownMode("median".to_string()));
        assert_eq!(
            err.to_string(),
            "unknown aggregation mode 'median' (expected mean or sum)"
        );
    }
}
