use std::fmt::Write;

use chrono::{DateTime, Local};

use crate::catalog::Catalog;
use crate::charts::{self, Chart};
use crate::interpret::{self, Ranking};
use crate::models::{AggregationMode, Interpretation, ScoreSheet};
use crate::responses::ResponseSet;
use crate::scoring;

/// Everything produced for one submission. Nothing here outlives the export step.
#[derive(Debug, Clone)]
pub struct Report {
    pub title: String,
    pub generated_at: DateTime<Local>,
    pub sheet: ScoreSheet,
    pub interpretations: Vec<Interpretation>,
    pub ranking: Ranking,
    pub bar_chart: Chart,
    pub radar_chart: Chart,
}

impl Report {
    pub fn build(catalog: &Catalog, responses: &ResponseSet, mode: AggregationMode) -> Self {
        let sheet = scoring::aggregate(catalog, responses, mode);
        let interpretations = interpret::interpret_all(catalog, &sheet);
        let ranking = interpret::rank(&interpretations);
        let bar_chart = charts::bar_chart(&sheet, "Scores by Category");
        let radar_chart = charts::radar_chart(&sheet, "Profile");

        Self {
            title: catalog.title.clone(),
            generated_at: Local::now(),
            sheet,
            interpretations,
            ranking,
            bar_chart,
            radar_chart,
        }
    }
}

/// `- <Category>: <narrative> (Score <x.x>)`
pub fn motivator_line(entry: &Interpretation) -> String {
    format!(
        "- {}: {} (Score {:.1})",
        entry.category, entry.narrative, entry.score
    )
}

pub fn results_table(report: &Report) -> String {
    let sheet = &report.sheet;
    let name_width = sheet
        .scores
        .iter()
        .map(|entry| entry.category.chars().count())
        .chain(std::iter::once("Category".len()))
        .max()
        .unwrap_or(8);

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<name_width$}  {:>6}  {}",
        "Category", "Score", "Band"
    );
    let _ = writeln!(output, "{}", "-".repeat(name_width + 2 + 6 + 2 + 25));
    for entry in &report.interpretations {
        let _ = writeln!(
            output,
            "{:<name_width$}  {:>6}  {}",
            entry.category,
            sheet.display_score(entry.score),
            entry.level.label()
        );
    }
    output
}

pub fn build_summary(report: &Report) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", report.title);
    let _ = writeln!(
        output,
        "Generated {} ({} scores, range {}-{})",
        report.generated_at.format("%Y-%m-%d %H:%M"),
        report.sheet.mode,
        report.sheet.display_score(report.sheet.scale.min),
        report.sheet.display_score(report.sheet.scale.max)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Your Results");
    let _ = writeln!(output, "```");
    let _ = write!(output, "{}", results_table(report));
    let _ = writeln!(output, "```");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    for entry in &report.interpretations {
        let _ = writeln!(output, "- **{}:** {}", entry.category, entry.narrative);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Motivators");
    for entry in &report.ranking.top {
        let _ = writeln!(output, "{}", motivator_line(entry));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Lower Motivators");
    for entry in &report.ranking.lower {
        let _ = writeln!(output, "{}", motivator_line(entry));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::radar_points;
    use crate::models::Level;
    use crate::responses::ResponseDraft;

    fn two_by_two() -> Catalog {
        Catalog::from_pairs(
            "Pair",
            AggregationMode::Mean,
            vec![("A", "a1"), ("A", "a2"), ("B", "b1"), ("B", "b2")],
        )
        .expect("valid catalog")
    }

    #[test]
    fn end_to_end_two_categories() {
        let catalog = two_by_two();
        let mut draft = ResponseDraft::new(&catalog);
        for (position, value) in [5, 5, 1, 1].into_iter().enumerate() {
            draft.set(position, value).expect("in range");
        }
        let report = Report::build(&catalog, &draft.finish(), AggregationMode::Mean);

        assert_eq!(report.sheet.get("A").map(|entry| entry.score), Some(5.0));
        assert_eq!(report.sheet.get("B").map(|entry| entry.score), Some(1.0));
        assert_eq!(report.ranking.top[0].category, "A");
        assert_eq!(report.interpretations[0].level, Level::Strong);
        assert_eq!(report.interpretations[1].level, Level::Growth);

        let values: Vec<f64> = report.sheet.scores.iter().map(|entry| entry.score).collect();
        let points = radar_points(&values);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], points[2]);
    }

    #[test]
    fn summary_lists_sections_in_order() {
        let catalog = Catalog::builtin();
        let report = Report::build(&catalog, &ResponseSet::neutral(&catalog), AggregationMode::Mean);
        let summary = build_summary(&report);

        let results = summary.find("## Your Results").expect("results section");
        let top = summary.find("## Top Motivators").expect("top section");
        let lower = summary.find("## Lower Motivators").expect("lower section");
        assert!(results < top && top < lower);
        assert!(summary.contains(
            "- Leadership: You show balance here, but there's room for growth. (Score 3.0)"
        ));
        assert!(summary.contains("balanced, room for growth"));
    }

    #[test]
    fn motivator_line_uses_one_decimal() {
        let entry = Interpretation {
            category: "Well-Being".to_string(),
            score: 4.26,
            level: Level::Strong,
            narrative: "Strong.".to_string(),
        };
        assert_eq!(motivator_line(&entry), "- Well-Being: Strong. (Score 4.3)");
    }
}
