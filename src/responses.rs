use std::io::{self, BufRead, Write};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::models::{MAX_SCORE, MIN_SCORE, NEUTRAL_SCORE};

#[derive(Debug, Error)]
pub enum AnswersError {
    #[error("failed to read answers from {path}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("answers row {row} is malformed")]
    Row {
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("prompt {number} does not exist (catalog has {count} prompts)")]
    UnknownPrompt { number: usize, count: usize },
}

/// Completed answers for one submission, one score per catalog prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSet {
    scores: Vec<u8>,
}

impl ResponseSet {
    pub fn neutral(catalog: &Catalog) -> Self {
        ResponseDraft::new(catalog).finish()
    }

    pub fn scores(&self) -> &[u8] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

pub fn clamp_score(value: i64) -> u8 {
    value.clamp(i64::from(MIN_SCORE), i64::from(MAX_SCORE)) as u8
}

/// Mutable answer sheet used while collecting; `finish` freezes it.
#[derive(Debug, Clone)]
pub struct ResponseDraft {
    scores: Vec<u8>,
}

impl ResponseDraft {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            scores: vec![NEUTRAL_SCORE; catalog.prompt_count()],
        }
    }

    /// Records the answer for a zero-based prompt position, clamped to 1..=5.
    /// Returns the stored value.
    pub fn set(&mut self, position: usize, value: i64) -> Result<u8, AnswersError> {
        let count = self.scores.len();
        let slot = self
            .scores
            .get_mut(position)
            .ok_or(AnswersError::UnknownPrompt {
                number: position + 1,
                count,
            })?;
        let clamped = clamp_score(value);
        if i64::from(clamped) != value {
            warn!(prompt = position + 1, value, clamped, "answer outside 1-5 clamped");
        }
        *slot = clamped;
        Ok(clamped)
    }

    pub fn finish(self) -> ResponseSet {
        ResponseSet {
            scores: self.scores,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnswerRow {
    #[serde(rename = "Prompt")]
    prompt: usize,
    #[serde(rename = "Score")]
    score: i64,
}

pub fn read_answers(catalog: &Catalog, path: &Path) -> Result<ResponseSet, AnswersError> {
    let reader = csv::Reader::from_path(path).map_err(|source| AnswersError::Read {
        path: path.display().to_string(),
        source,
    })?;
    answers_from_reader(catalog, reader)
}

/// Reads `Prompt,Score` rows; prompt numbers are 1-based, missing prompts stay neutral.
pub fn answers_from_reader<R: io::Read>(
    catalog: &Catalog,
    mut reader: csv::Reader<R>,
) -> Result<ResponseSet, AnswersError> {
    let mut draft = ResponseDraft::new(catalog);
    let count = catalog.prompt_count();

    for (index, result) in reader.deserialize::<AnswerRow>().enumerate() {
        let row = result.map_err(|source| AnswersError::Row {
            row: index + 1,
            source,
        })?;
        if row.prompt == 0 {
            return Err(AnswersError::UnknownPrompt { number: 0, count });
        }
        draft.set(row.prompt - 1, row.score)?;
    }

    Ok(draft.finish())
}

/// Asks every prompt on `output` and reads one line per answer from `input`.
///
/// An empty line keeps the neutral default, a non-numeric line is asked again,
/// and end of input keeps the default for every remaining prompt.
pub fn collect_interactive<R, W>(
    catalog: &Catalog,
    mut input: R,
    mut output: W,
) -> io::Result<ResponseSet>
where
    R: BufRead,
    W: Write,
{
    let mut draft = ResponseDraft::new(catalog);
    let total = catalog.prompt_count();
    let mut current_category: Option<String> = None;
    let mut exhausted = false;

    writeln!(output, "# {}", catalog.title)?;
    writeln!(
        output,
        "Answer {} questions to gain insight into your strengths across {}.",
        total,
        catalog.theme_list()
    )?;
    writeln!(
        output,
        "Rate each statement from {MIN_SCORE} (disagree) to {MAX_SCORE} (agree); press Enter for {NEUTRAL_SCORE}."
    )?;

    for (index, prompt) in catalog.prompts().enumerate() {
        if exhausted {
            break;
        }
        if current_category.as_deref() != Some(prompt.category.as_str()) {
            writeln!(output)?;
            writeln!(output, "## {}", prompt.category)?;
            current_category = Some(prompt.category.clone());
        }

        let number = index + 1;
        loop {
            write!(output, "[{number}/{total}] {} [{NEUTRAL_SCORE}]: ", prompt.text)?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                debug!(answered = index, "input closed, remaining answers neutral");
                exhausted = true;
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }

            match trimmed.parse::<i64>() {
                Ok(value) => {
                    draft
                        .set(index, value)
                        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
                    break;
                }
                Err(_) => {
                    writeln!(
                        output,
                        "Please enter a whole number from {MIN_SCORE} to {MAX_SCORE}."
                    )?;
                }
            }
        }
    }

    Ok(draft.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AggregationMode;

    fn small_catalog() -> Catalog {
        Catalog::from_pairs(
            "Small",
            AggregationMode::Mean,
            vec![("A", "a1"), ("A", "a2"), ("B", "b1"), ("B", "b2")],
        )
        .expect("valid catalog")
    }

    #[test]
    fn clamps_into_likert_range() {
        assert_eq!(clamp_score(-4), 1);
        assert_eq!(clamp_score(0), 1);
        assert_eq!(clamp_score(3), 3);
        assert_eq!(clamp_score(9), 5);
    }

    #[test]
    fn neutral_set_defaults_every_prompt_to_three() {
        let responses = ResponseSet::neutral(&small_catalog());
        assert_eq!(responses.scores(), &[3, 3, 3, 3]);
    }

    #[test]
    fn draft_rejects_unknown_positions() {
        let mut draft = ResponseDraft::new(&small_catalog());
        assert_eq!(draft.set(1, 7).expect("in range"), 5);
        let err = draft.set(4, 2).expect_err("position 4 is out of range");
        assert!(matches!(err, AnswersError::UnknownPrompt { number: 5, count: 4 }));
        assert_eq!(draft.finish().scores(), &[3, 5, 3, 3]);
    }

    #[test]
    fn answers_csv_fills_gaps_with_neutral() {
        let data = "Prompt,Score\n1,5\n4,0\n1,4\n";
        let reader = csv::Reader::from_reader(data.as_bytes());
        let responses = answers_from_reader(&small_catalog(), reader).expect("answers parse");
        assert_eq!(responses.scores(), &[4, 3, 3, 1]);
    }

    #[test]
    fn answers_csv_rejects_unknown_prompt_numbers() {
        let reader = csv::Reader::from_reader("Prompt,Score\n9,5\n".as_bytes());
        let err = answers_from_reader(&small_catalog(), reader).expect_err("prompt 9 is unknown");
        assert!(matches!(err, AnswersError::UnknownPrompt { number: 9, .. }));

        let reader = csv::Reader::from_reader("Prompt,Score\n0,5\n".as_bytes());
        assert!(answers_from_reader(&small_catalog(), reader).is_err());

        let reader = csv::Reader::from_reader("Prompt,Score\n1,high\n".as_bytes());
        let err = answers_from_reader(&small_catalog(), reader).expect_err("score must be numeric");
        assert!(matches!(err, AnswersError::Row { row: 1, .. }));
    }

    #[test]
    fn interactive_collection_handles_defaults_retries_and_eof() {
        let input = "5\n\nabc\n9\n";
        let mut output = Vec::new();
        let responses = collect_interactive(&small_catalog(), input.as_bytes(), &mut output)
            .expect("collection succeeds");

        // prompt 1 = 5, prompt 2 = default, prompt 3 retried then clamped 9 -> 5, prompt 4 hits EOF.
        assert_eq!(responses.scores(), &[5, 3, 5, 3]);

        let transcript = String::from_utf8(output).expect("utf8 transcript");
        assert!(transcript.contains("Answer 4 questions"));
        assert_eq!(transcript.matches("## A").count(), 1);
        assert_eq!(transcript.matches("## B").count(), 1);
        assert!(transcript.find("## B") < transcript.find("[3/4] b1"));
        assert!(transcript.contains("[3/4] b1"));
        assert!(transcript.contains("Please enter a whole number"));
    }
}
