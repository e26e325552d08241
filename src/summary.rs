//! Length presets and summary generation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{CapabilityError, Summarizer};

/// Minimum number of whitespace-delimited words an input text must have
/// before it is worth summarising. Shorter inputs are rejected without a
/// model call.
pub const MIN_INPUT_WORDS: usize = 50;

/// Target token-count bounds for a generated summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min_length: u32,
    pub max_length: u32,
}

#[derive(Error, Debug)]
#[error("unknown summary length: {0} (expected short, medium or long)")]
pub struct ParseLengthError(String);

/// User-selectable summary length preset.
///
/// Each preset maps to a fixed pair of generation-length bounds; the table
/// is not user-editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    /// Generation-length bounds for this preset.
    pub fn bounds(self) -> LengthBounds {
        match self {
            SummaryLength::Short => LengthBounds {
                min_length: 30,
                max_length: 100,
            },
            SummaryLength::Medium => LengthBounds {
                min_length: 80,
                max_length: 250,
            },
            SummaryLength::Long => LengthBounds {
                min_length: 120,
                max_length: 400,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SummaryLength::Short => "short",
            SummaryLength::Medium => "medium",
            SummaryLength::Long => "long",
        }
    }
}

impl fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryLength {
    type Err = ParseLengthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(SummaryLength::Short),
            "medium" => Ok(SummaryLength::Medium),
            "long" => Ok(SummaryLength::Long),
            other => Err(ParseLengthError(other.to_string())),
        }
    }
}

/// Count the whitespace-delimited words in a text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Summarise `text` at the given preset.
///
/// Looks up the length bounds for the preset and invokes the summariser
/// capability. Validation of the input (see [`MIN_INPUT_WORDS`]) is the
/// caller's responsibility; failures from the capability propagate.
pub async fn generate_summary(
    summarizer: &dyn Summarizer,
    text: &str,
    length: SummaryLength,
) -> Result<String, CapabilityError> {
    summarizer.summarize(text, length.bounds()).await
}
