use std::cmp::Ordering;

use crate::catalog::Catalog;
use crate::models::{AggregationMode, CategoryScore, Interpretation, Level, ScoreSheet};

/// How many categories each motivator list holds.
pub const MOTIVATOR_COUNT: usize = 3;

/// Equal scores keep their catalog order in both the top and the lower list.
pub const TIE_BREAK: TieBreak = TieBreak::CatalogOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    CatalogOrder,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    AtLeast(f64),
    Otherwise,
}

impl Threshold {
    fn matches(self, score: f64) -> bool {
        match self {
            Threshold::AtLeast(floor) => score >= floor,
            Threshold::Otherwise => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandRule {
    pub level: Level,
    pub threshold: Threshold,
    /// May contain `{category}` and `{description}`.
    pub template: &'static str,
}

/// Ordered high to low; the first matching rule wins.
pub const MEAN_RULES: &[BandRule] = &[
    BandRule {
        level: Level::Strong,
        threshold: Threshold::AtLeast(4.0),
        template: "This is a strong area for you. Keep building on these strengths.",
    },
    BandRule {
        level: Level::Balanced,
        threshold: Threshold::AtLeast(3.0),
        template: "You show balance here, but there's room for growth.",
    },
    BandRule {
        level: Level::Growth,
        threshold: Threshold::Otherwise,
        template: "This may be a growth area. Consider strategies to strengthen this dimension.",
    },
];

/// Prompt count the `SUM_RULES` thresholds are written for (scores 5..=25).
pub const SUM_REFERENCE_PROMPTS: usize = 5;

/// Thresholds apply to a five-prompt category; other sizes are rescaled by
/// `banding_score` before matching.
pub const SUM_RULES: &[BandRule] = &[
    BandRule {
        level: Level::High,
        threshold: Threshold::AtLeast(20.0),
        template: "High: {description} is a powerful motivator for you.",
    },
    BandRule {
        level: Level::Moderate,
        threshold: Threshold::AtLeast(13.0),
        template: "Moderate: {description} matters to you in some situations.",
    },
    BandRule {
        level: Level::Low,
        threshold: Threshold::Otherwise,
        template: "Low: {description} does little to drive you right now.",
    },
];

pub fn rules_for(mode: AggregationMode) -> &'static [BandRule] {
    match mode {
        AggregationMode::Mean => MEAN_RULES,
        AggregationMode::Sum => SUM_RULES,
    }
}

/// First rule whose threshold accepts `score`. The last rule of every set is a catch-all.
pub fn select_rule(rules: &'static [BandRule], score: f64) -> &'static BandRule {
    rules
        .iter()
        .find(|rule| rule.threshold.matches(score))
        .unwrap_or(&rules[rules.len() - 1])
}

pub fn render_template(template: &str, category: &str, description: &str) -> String {
    template
        .replace("{category}", category)
        .replace("{description}", description)
}

/// Score compared against the rule thresholds. Sums are brought onto the
/// five-prompt scale so a ten-prompt category needs 40 for High, not 20.
pub fn banding_score(entry: &CategoryScore, mode: AggregationMode) -> f64 {
    match mode {
        AggregationMode::Mean => entry.score,
        AggregationMode::Sum if entry.prompt_count == 0 => entry.score,
        AggregationMode::Sum => {
            entry.score * SUM_REFERENCE_PROMPTS as f64 / entry.prompt_count as f64
        }
    }
}

pub fn interpret(entry: &CategoryScore, mode: AggregationMode, description: &str) -> Interpretation {
    let rule = select_rule(rules_for(mode), banding_score(entry, mode));
    Interpretation {
        category: entry.category.clone(),
        score: entry.score,
        level: rule.level,
        narrative: render_template(rule.template, &entry.category, description),
    }
}

/// One interpretation per scored category, in catalog order.
pub fn interpret_all(catalog: &Catalog, sheet: &ScoreSheet) -> Vec<Interpretation> {
    sheet
        .scores
        .iter()
        .map(|entry| {
            let description = catalog
                .category(&entry.category)
                .map(|category| category.description_or_name())
                .unwrap_or(&entry.category);
            interpret(entry, sheet.mode, description)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub top: Vec<Interpretation>,
    pub lower: Vec<Interpretation>,
}

/// Top and lower motivators. Both lists may share entries when the catalog has
/// fewer than twice `MOTIVATOR_COUNT` categories.
pub fn rank(interpretations: &[Interpretation]) -> Ranking {
    let mut descending = interpretations.to_vec();
    let mut ascending = interpretations.to_vec();

    match TIE_BREAK {
        TieBreak::CatalogOrder => {
            // Vec::sort_by is stable, so equal scores stay in catalog order.
            descending.sort_by(|a, b| compare_scores(b.score, a.score));
            ascending.sort_by(|a, b| compare_scores(a.score, b.score));
        }
    }

    descending.truncate(MOTIVATOR_COUNT);
    ascending.truncate(MOTIVATOR_COUNT);

    Ranking {
        top: descending,
        lower: ascending,
    }
}

fn compare_scores(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(category: &str, score: f64) -> CategoryScore {
        CategoryScore {
            category: category.to_string(),
            score,
            prompt_count: 5,
        }
    }

    fn level(mode: AggregationMode, score: f64) -> Level {
        interpret(&scored("X", score), mode, "X").level
    }

    fn sum_level(score: f64, prompt_count: usize) -> Level {
        let entry = CategoryScore {
            category: "X".to_string(),
            score,
            prompt_count,
        };
        interpret(&entry, AggregationMode::Sum, "X").level
    }

    #[test]
    fn mean_band_boundaries() {
        assert_eq!(level(AggregationMode::Mean, 5.0), Level::Strong);
        assert_eq!(level(AggregationMode::Mean, 4.0), Level::Strong);
        assert_eq!(level(AggregationMode::Mean, 3.99), Level::Balanced);
        assert_eq!(level(AggregationMode::Mean, 3.0), Level::Balanced);
        assert_eq!(level(AggregationMode::Mean, 2.99), Level::Growth);
        assert_eq!(level(AggregationMode::Mean, 1.0), Level::Growth);
    }

    #[test]
    fn sum_band_boundaries() {
        assert_eq!(level(AggregationMode::Sum, 5.0), Level::Low);
        assert_eq!(level(AggregationMode::Sum, 12.0), Level::Low);
        assert_eq!(level(AggregationMode::Sum, 13.0), Level::Moderate);
        assert_eq!(level(AggregationMode::Sum, 19.0), Level::Moderate);
        assert_eq!(level(AggregationMode::Sum, 20.0), Level::High);
        assert_eq!(level(AggregationMode::Sum, 25.0), Level::High);
    }

    #[test]
    fn sum_bands_scale_with_prompt_count() {
        // ten prompts: 10..=50, bands at 26 and 40
        assert_eq!(sum_level(10.0, 10), Level::Low);
        assert_eq!(sum_level(25.0, 10), Level::Low);
        assert_eq!(sum_level(26.0, 10), Level::Moderate);
        assert_eq!(sum_level(39.0, 10), Level::Moderate);
        assert_eq!(sum_level(40.0, 10), Level::High);
        assert_eq!(sum_level(50.0, 10), Level::High);

        // five prompts keep the plain 12/13 and 19/20 boundaries
        assert_eq!(sum_level(12.0, 5), Level::Low);
        assert_eq!(sum_level(13.0, 5), Level::Moderate);
        assert_eq!(sum_level(19.0, 5), Level::Moderate);
        assert_eq!(sum_level(20.0, 5), Level::High);
    }

    #[test]
    fn builtin_catalog_in_sum_mode_is_not_high_for_low_answers() {
        use crate::responses::{ResponseDraft, ResponseSet};
        use crate::scoring::aggregate;

        let catalog = Catalog::builtin();
        let mut draft = ResponseDraft::new(&catalog);
        for position in 0..catalog.prompt_count() {
            draft.set(position, 2).expect("position in range");
        }
        let all_twos = aggregate(&catalog, &draft.finish(), AggregationMode::Sum);
        let levels: Vec<Level> = interpret_all(&catalog, &all_twos)
            .iter()
            .map(|entry| entry.level)
            .collect();
        assert!(levels.iter().all(|level| *level == Level::Low));

        let neutral = aggregate(&catalog, &ResponseSet::neutral(&catalog), AggregationMode::Sum);
        assert!(interpret_all(&catalog, &neutral)
            .iter()
            .all(|entry| entry.score == 30.0 && entry.level == Level::Moderate));
    }

    #[test]
    fn banding_is_deterministic() {
        let first = interpret(&scored("Focus", 3.4), AggregationMode::Mean, "Focus");
        let second = interpret(&scored("Focus", 3.4), AggregationMode::Mean, "Focus");
        assert_eq!(first, second);
    }

    #[test]
    fn every_rule_set_ends_with_catch_all() {
        for rules in [MEAN_RULES, SUM_RULES] {
            assert_eq!(rules.last().map(|rule| rule.threshold), Some(Threshold::Otherwise));
        }
        assert_eq!(select_rule(MEAN_RULES, f64::NAN).level, Level::Growth);
    }

    #[test]
    fn sum_templates_embed_description() {
        let interpretation = interpret(
            &scored("Autonomy", 21.0),
            AggregationMode::Sum,
            "Freedom to decide how and when you work",
        );
        assert_eq!(
            interpretation.narrative,
            "High: Freedom to decide how and when you work is a powerful motivator for you."
        );
    }

    #[test]
    fn ranking_keeps_catalog_order_on_ties() {
        let interpretations: Vec<Interpretation> = [
            ("A", 3.0),
            ("B", 4.0),
            ("C", 3.0),
            ("D", 4.0),
            ("E", 1.0),
        ]
        .iter()
        .map(|(name, score)| interpret(&scored(name, *score), AggregationMode::Mean, name))
        .collect();

        let ranking = rank(&interpretations);
        let top: Vec<&str> = ranking.top.iter().map(|entry| entry.category.as_str()).collect();
        let lower: Vec<&str> = ranking.lower.iter().map(|entry| entry.category.as_str()).collect();
        assert_eq!(top, vec!["B", "D", "A"]);
        assert_eq!(lower, vec!["E", "A", "C"]);
    }

    #[test]
    fn ranking_with_few_categories_lists_them_all() {
        let interpretations = vec![
            interpret(&scored("A", 5.0), AggregationMode::Mean, "A"),
            interpret(&scored("B", 1.0), AggregationMode::Mean, "B"),
        ];
        let ranking = rank(&interpretations);
        assert_eq!(ranking.top.len(), 2);
        assert_eq!(ranking.lower.len(), 2);
        assert_eq!(ranking.top[0].category, "A");
        assert_eq!(ranking.lower[0].category, "B");
    }
}
