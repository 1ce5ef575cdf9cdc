use crate::catalog::Catalog;
use crate::models::{AggregationMode, CategoryScore, ScoreSheet, NEUTRAL_SCORE};
use crate::responses::ResponseSet;

/// Reduces one response snapshot to a score per catalog category, in catalog order.
///
/// Positions the snapshot does not cover count as neutral answers.
pub fn aggregate(catalog: &Catalog, responses: &ResponseSet, mode: AggregationMode) -> ScoreSheet {
    let mut position = 0usize;
    let mut scores = Vec::with_capacity(catalog.categories.len());

    for category in &catalog.categories {
        let count = category.prompts.len();
        let total: u32 = (position..position + count)
            .map(|index| u32::from(responses.scores().get(index).copied().unwrap_or(NEUTRAL_SCORE)))
            .sum();
        position += count;

        scores.push(CategoryScore {
            category: category.name.clone(),
            score: reduce(total, count, mode),
            prompt_count: count,
        });
    }

    ScoreSheet {
        mode,
        scale: catalog.scale(mode),
        scores,
    }
}

pub fn reduce(total: u32, count: usize, mode: AggregationMode) -> f64 {
    match mode {
        AggregationMode::Sum => f64::from(total),
        AggregationMode::Mean if count == 0 => 0.0,
        AggregationMode::Mean => f64::from(total) / count as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responses::ResponseDraft;

    fn catalog(categories: &[(&str, usize)], mode: AggregationMode) -> Catalog {
        let pairs: Vec<(String, String)> = categories
            .iter()
            .flat_map(|(name, count)| {
                (0..*count).map(move |index| (name.to_string(), format!("{name} prompt {index}")))
            })
            .collect();
        Catalog::from_pairs("Test", mode, pairs).expect("valid catalog")
    }

    fn answered(catalog: &Catalog, values: &[i64]) -> ResponseSet {
        let mut draft = ResponseDraft::new(catalog);
        for (position, value) in values.iter().enumerate() {
            draft.set(position, *value).expect("position in range");
        }
        draft.finish()
    }

    #[test]
    fn every_category_scored_exactly_once() {
        let catalog = Catalog::builtin();
        let sheet = aggregate(&catalog, &ResponseSet::neutral(&catalog), AggregationMode::Mean);
        let names: Vec<&str> = sheet.scores.iter().map(|entry| entry.category.as_str()).collect();
        assert_eq!(names, catalog.category_names());
    }

    #[test]
    fn neutral_answers_average_to_three() {
        let catalog = Catalog::builtin();
        let sheet = aggregate(&catalog, &ResponseSet::neutral(&catalog), AggregationMode::Mean);
        assert!(sheet.scores.iter().all(|entry| entry.score == 3.0));
    }

    #[test]
    fn sum_mode_spans_five_to_twenty_five() {
        let catalog = catalog(&[("High", 5), ("Low", 5)], AggregationMode::Sum);
        let responses = answered(&catalog, &[5, 5, 5, 5, 5, 1, 1, 1, 1, 1]);
        let sheet = aggregate(&catalog, &responses, AggregationMode::Sum);

        assert_eq!(sheet.get("High").map(|entry| entry.score), Some(25.0));
        assert_eq!(sheet.get("Low").map(|entry| entry.score), Some(5.0));
        assert_eq!((sheet.scale.min, sheet.scale.max), (5.0, 25.0));
    }

    #[test]
    fn mean_mode_divides_by_prompt_count() {
        let catalog = catalog(&[("A", 2), ("B", 3)], AggregationMode::Mean);
        let responses = answered(&catalog, &[5, 4, 1, 2, 4]);
        let sheet = aggregate(&catalog, &responses, AggregationMode::Mean);

        let a = sheet.get("A").expect("A scored");
        assert!((a.score - 4.5).abs() < 1e-9);
        assert_eq!(a.prompt_count, 2);
        let b = sheet.get("B").expect("B scored");
        assert!((b.score - 7.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn short_snapshot_counts_missing_answers_as_neutral() {
        let small = catalog(&[("A", 1)], AggregationMode::Mean);
        let larger = catalog(&[("A", 1), ("B", 2)], AggregationMode::Mean);
        let responses = answered(&small, &[5]);

        let sheet = aggregate(&larger, &responses, AggregationMode::Sum);
        assert_eq!(sheet.get("A").map(|entry| entry.score), Some(5.0));
        assert_eq!(sheet.get("B").map(|entry| entry.score), Some(6.0));
    }
}
