//! Grounded answer composition.
//!
//! A single strong match is returned verbatim. Otherwise the top result
//! may be extended with the runner-up when the runner-up is itself a
//! solid match and adds new text. The top result's source is cited either
//! way.

use crate::guardrails::{ConfidenceLevel, Verdict};
use crate::search::ScoredChunk;

/// Score above which the top result is returned verbatim on its own.
const VERBATIM_SCORE: f64 = 0.85;

/// Score a runner-up must reach to be appended.
const APPEND_SCORE: f64 = 0.70;

/// A composed, grounded answer.
#[derive(Debug, Clone)]
pub struct GroundedAnswer {
    /// Answer text.
    pub text: String,
    /// Source label of the top result.
    pub source: String,
    /// Confidence band from the guardrail verdict.
    pub confidence: ConfidenceLevel,
    /// Advisory warnings carried over from the verdict.
    pub warnings: Vec<String>,
}

/// Compose an answer from approved retrieval results.
///
/// Returns `None` when the verdict did not approve answering or there are
/// no results to compose from.
#[must_use]
pub fn compose(results: &[ScoredChunk], verdict: &Verdict) -> Option<GroundedAnswer> {
    if !verdict.should_answer {
        return None;
    }
    let top = results.first()?;

    let text = if results.len() == 1 || top.score > VERBATIM_SCORE {
        top.text.clone()
    } else {
        match results.get(1) {
            Some(second) if second.score > APPEND_SCORE && !top.text.contains(&second.text) => {
                format!("{}\n\n{}", top.text, second.text)
            },
            _ => top.text.clone(),
        }
    };

    Some(GroundedAnswer {
        text,
        source: top.source.clone(),
        confidence: verdict.confidence.unwrap_or(ConfidenceLevel::Medium),
        warnings: verdict.warnings.clone(),
    })
}
