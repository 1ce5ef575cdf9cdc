use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{AggregationMode, Category, Prompt, ScoreScale, MAX_SCORE, MIN_SCORE};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog is not valid JSON")]
    Parse(#[from] serde_json::Error),
    #[error("catalog has no categories")]
    Empty,
    #[error("catalog contains a category with a blank name")]
    BlankCategory,
    #[error("category '{0}' appears more than once")]
    DuplicateCategory(String),
    #[error("category '{0}' has no prompts")]
    NoPrompts(String),
    #[error("category '{0}' has a blank prompt")]
    BlankPrompt(String),
}

/// Immutable question table shared by every stage of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub title: String,
    pub mode: AggregationMode,
    pub categories: Vec<Category>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Nested {
        title: String,
        #[serde(default)]
        aggregation: Option<AggregationMode>,
        categories: Vec<CategoryFile>,
    },
    Flat {
        title: String,
        #[serde(default)]
        aggregation: Option<AggregationMode>,
        prompts: Vec<PromptFile>,
    },
}

#[derive(Deserialize)]
struct CategoryFile {
    name: String,
    #[serde(default)]
    description: Option<String>,
    prompts: Vec<String>,
}

#[derive(Deserialize)]
struct PromptFile {
    category: String,
    text: String,
}

impl Catalog {
    pub fn new(
        title: impl Into<String>,
        mode: AggregationMode,
        categories: Vec<Category>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            title: title.into(),
            mode,
            categories,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Groups flat (category, prompt) pairs by first appearance of each category.
    pub fn from_pairs<I, C, T>(
        title: impl Into<String>,
        mode: AggregationMode,
        pairs: I,
    ) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (C, T)>,
        C: Into<String>,
        T: Into<String>,
    {
        let mut categories: Vec<Category> = Vec::new();
        for (category, text) in pairs {
            let category = category.into();
            match categories.iter_mut().find(|entry| entry.name == category) {
                Some(entry) => entry.prompts.push(text.into()),
                None => categories.push(Category {
                    name: category,
                    description: None,
                    prompts: vec![text.into()],
                }),
            }
        }
        Self::new(title, mode, categories)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        match serde_json::from_str::<CatalogFile>(raw)? {
            CatalogFile::Nested {
                title,
                aggregation,
                categories,
            } => {
                let categories = categories
                    .into_iter()
                    .map(|entry| Category {
                        name: entry.name,
                        description: entry.description.filter(|text| !text.trim().is_empty()),
                        prompts: entry.prompts,
                    })
                    .collect();
                Self::new(
                    title,
                    aggregation.unwrap_or(AggregationMode::Mean),
                    categories,
                )
            }
            CatalogFile::Flat {
                title,
                aggregation,
                prompts,
            } => Self::from_pairs(
                title,
                aggregation.unwrap_or(AggregationMode::Mean),
                prompts.into_iter().map(|entry| (entry.category, entry.text)),
            ),
        }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// The "Motivation Profile Assessment": five themes, ten prompts each.
    pub fn builtin() -> Self {
        let categories = BUILTIN_CATEGORIES
            .iter()
            .map(|(name, prompts)| Category {
                name: (*name).to_string(),
                description: None,
                prompts: prompts.iter().map(|text| (*text).to_string()).collect(),
            })
            .collect();

        Self {
            title: "Motivation Profile Assessment".to_string(),
            mode: AggregationMode::Mean,
            categories,
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.categories.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err(CatalogError::BlankCategory);
            }
            if !seen.insert(category.name.as_str()) {
                return Err(CatalogError::DuplicateCategory(category.name.clone()));
            }
            if category.prompts.is_empty() {
                return Err(CatalogError::NoPrompts(category.name.clone()));
            }
            if category.prompts.iter().any(|text| text.trim().is_empty()) {
                return Err(CatalogError::BlankPrompt(category.name.clone()));
            }
        }

        Ok(())
    }

    /// Every prompt in catalog order; the index of an item is its prompt position.
    pub fn prompts(&self) -> impl Iterator<Item = Prompt> + '_ {
        self.categories.iter().flat_map(|category| {
            category.prompts.iter().map(move |text| Prompt {
                category: category.name.clone(),
                text: text.clone(),
            })
        })
    }

    pub fn prompt_count(&self) -> usize {
        self.categories.iter().map(|category| category.prompts.len()).sum()
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|category| category.name.as_str()).collect()
    }

    pub fn scale(&self, mode: AggregationMode) -> ScoreScale {
        match mode {
            AggregationMode::Mean => ScoreScale {
                min: f64::from(MIN_SCORE),
                max: f64::from(MAX_SCORE),
            },
            AggregationMode::Sum => {
                let fewest = self
                    .categories
                    .iter()
                    .map(|category| category.prompts.len())
                    .min()
                    .unwrap_or(1);
                let most = self
                    .categories
                    .iter()
                    .map(|category| category.prompts.len())
                    .max()
                    .unwrap_or(1);
                ScoreScale {
                    min: (fewest * usize::from(MIN_SCORE)) as f64,
                    max: (most * usize::from(MAX_SCORE)) as f64,
                }
            }
        }
    }

    /// "leadership, mindfulness, well-being, business/strategy, and growth & learning"
    pub fn theme_list(&self) -> String {
        let names: Vec<String> = self
            .category_names()
            .into_iter()
            .map(str::to_lowercase)
            .collect();
        match names.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            [first, second] => format!("{first} and {second}"),
            [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
        }
    }
}

const BUILTIN_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Leadership",
        &[
            "I feel confident making important decisions.",
            "I take initiative without waiting to be asked.",
            "I motivate others to perform their best.",
            "I can adapt my leadership style to the situation.",
            "I set clear goals for myself and others.",
            "I handle conflict constructively.",
            "I communicate my vision effectively.",
            "I take responsibility for outcomes.",
            "I build trust within teams.",
            "I provide constructive feedback.",
        ],
    ),
    (
        "Mindfulness",
        &[
            "I practice being present in the moment.",
            "I manage stress effectively.",
            "I take time to reflect on my experiences.",
            "I am aware of my emotions as they arise.",
            "I can calm myself in difficult situations.",
            "I listen attentively to others.",
            "I have a regular mindfulness or meditation practice.",
            "I notice small details in my daily life.",
            "I balance work and personal life well.",
            "I show patience with myself and others.",
        ],
    ),
    (
        "Well-Being",
        &[
            "I get enough rest and sleep regularly.",
            "I maintain a healthy diet.",
            "I exercise consistently.",
            "I feel positive about my overall health.",
            "I take time for hobbies or activities I enjoy.",
            "I nurture strong personal relationships.",
            "I feel a sense of purpose in life.",
            "I manage my workload effectively.",
            "I have strategies to recharge when tired.",
            "I feel supported by those around me.",
        ],
    ),
    (
        "Business/Strategy",
        &[
            "I set long-term goals and work toward them.",
            "I analyze data to guide decisions.",
            "I understand financial impacts of choices.",
            "I manage resources effectively.",
            "I stay current with industry trends.",
            "I approach problems with creative solutions.",
            "I evaluate risks before acting.",
            "I delegate tasks effectively.",
            "I follow through on commitments.",
            "I measure success with clear metrics.",
        ],
    ),
    (
        "Growth & Learning",
        &[
            "I seek out opportunities to learn.",
            "I embrace feedback to improve.",
            "I challenge myself with new experiences.",
            "I mentor or support others' growth.",
            "I reflect on mistakes and learn from them.",
            "I stay curious and open-minded.",
            "I invest time in professional development.",
            "I track my progress over time.",
            "I celebrate small wins.",
            "I adapt quickly when facing change.",
        ],
    ),
];
