//! Grounding and safety guardrails.
//!
//! Every answer candidate passes through three gates before composition:
//! a safety scan of the question (prompt injection, sensitive-data
//! probes), similarity threshold bands, and a token-overlap relevance
//! check against the top result. LLM-composed answers additionally get a
//! numeric-token validation pass against the retrieved sources.

use std::collections::HashSet;
use std::sync::LazyLock;

use crate::search::ScoredChunk;

/// Phrases that indicate a prompt-injection attempt.
const INJECTION_PHRASES: [&str; 9] = [
    "ignore previous",
    "ignore above",
    "disregard instructions",
    "new instructions",
    "forget everything",
    "system prompt",
    "you are now",
    "pretend to be",
    "act as if",
];

/// Terms that probe for sensitive or internal data.
const SENSITIVE_TERMS: [&str; 8] = [
    "password",
    "api key",
    "secret",
    "credentials",
    "internal",
    "employee",
    "salary",
    "personal data",
];

/// Stop words removed from the question before the relevance check.
const STOP_WORDS: [&str; 36] = [
    "the", "a", "an", "is", "are", "was", "were", "what", "when", "where", "who", "how", "why",
    "do", "does", "did", "can", "could", "will", "would", "i", "you", "your", "our", "we", "of",
    "for", "to", "in", "on", "at", "and", "or", "it", "my", "please",
];

/// Share of question tokens that must appear in the top result.
const RELEVANCE_MIN_OVERLAP: f64 = 0.2;

static NUMBER_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\d+(?:[.,]\d+)*").unwrap_or_else(|e| panic!("bad number regex: {e}"))
});

/// Similarity thresholds for the answer bands.
#[derive(Debug, Clone, Copy)]
pub struct GuardrailConfig {
    /// At or above: answer with high confidence.
    pub high: f64,
    /// At or above: answer with medium confidence plus a verify warning.
    pub medium: f64,
    /// At or above: do not answer, ask for clarification instead.
    pub low: f64,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            high: 0.85,
            medium: 0.70,
            low: 0.50,
        }
    }
}

impl GuardrailConfig {
    /// Read thresholds, honoring the environment overrides
    /// (`HIGH_CONFIDENCE_THRESHOLD`, `MEDIUM_CONFIDENCE_THRESHOLD`,
    /// `LOW_CONFIDENCE_THRESHOLD`).
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |var: &str, fallback: f64| {
            std::env::var(var)
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| (0.0..=1.0).contains(v))
                .unwrap_or(fallback)
        };
        Self {
            high: read("HIGH_CONFIDENCE_THRESHOLD", defaults.high),
            medium: read("MEDIUM_CONFIDENCE_THRESHOLD", defaults.medium),
            low: read("LOW_CONFIDENCE_THRESHOLD", defaults.low),
        }
    }
}

/// Confidence band of an approved answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    /// Strong grounding.
    High,
    /// Usable grounding; the user is told to verify.
    Medium,
    /// Weak grounding (only reachable by downgrade).
    Low,
}

impl ConfidenceLevel {
    /// One band lower.
    #[must_use]
    pub fn downgraded(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium | Self::Low => Self::Low,
        }
    }
}

/// Why a question was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefusalKind {
    /// Prompt-injection phrasing.
    Injection,
    /// Sensitive-data probe.
    SensitiveData,
    /// Top result does not actually cover the question.
    LowRelevance,
    /// Nothing similar enough was retrieved.
    LowConfidence,
}

impl std::fmt::Display for RefusalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Injection => write!(f, "injection"),
            Self::SensitiveData => write!(f, "sensitive"),
            Self::LowRelevance => write!(f, "relevance"),
            Self::LowConfidence => write!(f, "confidence"),
        }
    }
}

/// Outcome of the guardrail evaluation.
#[derive(Debug, Clone)]
pub struct Verdict {
    /// Whether an answer may be produced.
    pub should_answer: bool,
    /// Confidence band when answering.
    pub confidence: Option<ConfidenceLevel>,
    /// Whether the user should be asked to clarify.
    pub needs_clarification: bool,
    /// Refusal reason, when refused.
    pub refusal: Option<RefusalKind>,
    /// Advisory warnings attached to the answer.
    pub warnings: Vec<String>,
}

impl Verdict {
    fn refuse(kind: RefusalKind) -> Self {
        Self {
            should_answer: false,
            confidence: None,
            needs_clarification: false,
            refusal: Some(kind),
            warnings: Vec::new(),
        }
    }

    fn clarify() -> Self {
        Self {
            should_answer: false,
            confidence: None,
            needs_clarification: true,
            refusal: None,
            warnings: Vec::new(),
        }
    }
}

/// Result of validating an LLM-composed answer against its sources.
#[derive(Debug, Clone, Default)]
pub struct ResponseValidation {
    /// One warning per unsourced numeric token.
    pub warnings: Vec<String>,
    /// Whether the answer's confidence should drop one band.
    pub downgrade: bool,
}

/// The guardrail evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Guardrails {
    config: GuardrailConfig,
}

impl Guardrails {
    /// Create an evaluator with the given thresholds.
    #[must_use]
    pub fn new(config: GuardrailConfig) -> Self {
        Self { config }
    }

    /// The configured thresholds.
    #[must_use]
    pub fn config(&self) -> GuardrailConfig {
        self.config
    }

    /// Evaluate a question and its retrieval results.
    #[must_use]
    pub fn evaluate(&self, question: &str, results: &[ScoredChunk]) -> Verdict {
        let lower = question.to_lowercase();

        if INJECTION_PHRASES.iter().any(|p| lower.contains(p)) {
            return Verdict::refuse(RefusalKind::Injection);
        }
        if SENSITIVE_TERMS.iter().any(|t| lower.contains(t)) {
            return Verdict::refuse(RefusalKind::SensitiveData);
        }

        let Some(top) = results.first() else {
            return Verdict::refuse(RefusalKind::LowConfidence);
        };

        if top.score < self.config.low {
            return Verdict::refuse(RefusalKind::LowConfidence);
        }
        if top.score < self.config.medium {
            return Verdict::clarify();
        }

        // Relevance heuristic, applied to the top result only.
        if !is_relevant(question, &top.text) {
            return Verdict::refuse(RefusalKind::LowRelevance);
        }

        if top.score >= self.config.high {
            Verdict {
                should_answer: true,
                confidence: Some(ConfidenceLevel::High),
                needs_clarification: false,
                refusal: None,
                warnings: Vec::new(),
            }
        } else {
            Verdict {
                should_answer: true,
                confidence: Some(ConfidenceLevel::Medium),
                needs_clarification: false,
                refusal: None,
                warnings: vec![
                    "Please verify this information with us directly if it's important."
                        .to_string(),
                ],
            }
        }
    }

    /// Validate an LLM-composed answer against the retrieved sources.
    ///
    /// Every numeric token in the answer that appears in no source text
    /// produces a warning; two or more such tokens downgrade the answer's
    /// confidence one band.
    #[must_use]
    pub fn validate_response(&self, answer: &str, sources: &[ScoredChunk]) -> ResponseValidation {
        let mut validation = ResponseValidation::default();

        let mut unsourced = 0_usize;
        for m in NUMBER_RE.find_iter(answer) {
            let token = m.as_str();
            if !sources.iter().any(|s| s.text.contains(token)) {
                unsourced = unsourced.saturating_add(1);
                validation.warnings.push(format!(
                    "The figure \"{token}\" could not be confirmed from our records."
                ));
            }
        }
        validation.downgrade = unsourced >= 2;
        validation
    }
}

/// Token-overlap relevance: at least 20 % of the question's
/// non-stop-word tokens must appear in the candidate text.
fn is_relevant(question: &str, text: &str) -> bool {
    let stop: HashSet<&str> = STOP_WORDS.into_iter().collect();
    let question_tokens: Vec<String> = question
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !stop.contains(t))
        .map(ToString::to_string)
        .collect();

    if question_tokens.is_empty() {
        return true;
    }

    let text_lower = text.to_lowercase();
    let text_tokens: HashSet<&str> = text_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let hits = question_tokens
        .iter()
        .filter(|t| text_tokens.contains(t.as_str()))
        .count();

    #[allow(clippy::cast_precision_loss)]
    let overlap = hits as f64 / question_tokens.len() as f64;
    overlap >= RELEVANCE_MIN_OVERLAP
}
