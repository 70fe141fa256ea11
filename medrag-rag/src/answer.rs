//! Answer post-processing and confidence scoring.
//!
//! Small local models repeat themselves and trail off mid-sentence;
//! [`clean_answer`] compensates by deduplicating lines and trimming the
//! final incomplete fragment. [`Confidence`] grades answers by how many
//! sources backed them.

use serde::{Deserialize, Serialize};

/// A coarse indicator of answer groundedness.
///
/// Derived purely from the number of retrieved sources — a proxy, not a
/// calibrated probability. It does not consider similarity scores, so a
/// `High` answer may still rest on weakly related passages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    /// One source or none.
    Low,
    /// Exactly two sources.
    Medium,
    /// Three or more sources.
    High,
}

impl Confidence {
    /// Map a retrieved-source count to a confidence level.
    pub fn from_source_count(num_sources: usize) -> Self {
        match num_sources {
            n if n >= 3 => Confidence::High,
            2 => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        };
        f.write_str(label)
    }
}

/// The packaged result of one `ask` call. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The cleaned generated answer.
    pub text: String,
    /// Excerpts of the retrieved segments, in retrieval order.
    pub sources: Vec<String>,
    /// Groundedness indicator computed from the retrieved segment count.
    pub confidence: Confidence,
}

/// Clean a raw model answer.
///
/// - Keeps the first occurrence of each distinct non-empty trimmed line,
///   preserving relative order.
/// - If the text does not end in `.`, `!`, or `?`, drops the trailing
///   incomplete sentence fragment — unless it is the only fragment, in
///   which case the text is left as-is.
/// - Trims surrounding whitespace.
///
/// The function is idempotent: `clean_answer(clean_answer(x)) == clean_answer(x)`.
pub fn clean_answer(raw: &str) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if !line.is_empty() && !seen.contains(&line) {
            seen.push(line);
        }
    }
    let mut answer = seen.join("\n");

    if let Some(last) = answer.chars().last() {
        if !matches!(last, '.' | '!' | '?') {
            let sentences: Vec<&str> = answer.split('.').collect();
            if sentences.len() > 1 {
                answer = format!("{}.", sentences[..sentences.len() - 1].join("."));
            }
        }
    }

    answer.trim().to_string()
}
