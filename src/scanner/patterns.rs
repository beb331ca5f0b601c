//! Reference pattern tables.
//!
//! A [`PatternTable`] is an immutable set of tiered regex rules plus the
//! signal vocabulary used for context weighting. The built-in table covers
//! Chinese and English figure/table references; custom tables are built with
//! [`PatternTable::builder`] and validated once, up front.

use crate::error::{Error, Result};
use crate::model::Tier;
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

/// Capture group holding the chapter number of a STRICT reference.
pub const MAJOR_GROUP: &str = "major";

/// Capture group holding the index number of a STRICT reference.
pub const MINOR_GROUP: &str = "minor";

/// Score given to STRICT-prefixed matches whose number is incomplete or malformed.
pub const DEFAULT_DOWNGRADED_SCORE: f32 = 0.7;

lazy_static! {
    static ref DEFAULT_TABLE: PatternTable = PatternTable::builder()
        // Numbered references. "附图" precedes "图" so the longer prefix wins.
        .strict("figure_zh", r"(?:附图|图|表)\s*(?P<major>\d+)(?:\s*[-._]\s*(?P<minor>\d+))?", 0.95)
        .strict("figure_en", r"\b(?:figure|fig\.?|table|tab\.)\s*(?P<major>\d+)(?:\s*[-._]\s*(?P<minor>\d+))?", 0.95)
        // Contextual phrases
        .keyword("as_shown_zh", r"如图所示", 0.7)
        .keyword("diagnostic_flow_zh", r"诊疗流程[^。；;]{0,20}?图", 0.7)
        .keyword("as_figure_zh", r"如图", 0.65)
        .keyword("see_figure_zh", r"(?:参见|详见|见)图", 0.65)
        .keyword("directional_zh", r"[上下左右]图", 0.6)
        .keyword("flow_diagram_zh", r"流程图", 0.6)
        .keyword("schematic_zh", r"示意图", 0.6)
        .keyword("example_figure_zh", r"示例图", 0.55)
        .keyword("illustration_zh", r"图示", 0.55)
        .keyword("attached_figure_zh", r"[附配]图", 0.55)
        .keyword("see_detail_zh", r"详见(?:下文|下方|如下|附件|附录)", 0.5)
        .keyword("as_shown_en", r"\bas (?:shown|depicted) (?:in|below|above)\b", 0.65)
        .keyword("see_figure_en", r"\bsee (?:the )?(?:figure|fig\.|diagram|chart)\b", 0.65)
        .keyword("directional_en", r"\b(?:figure|diagram|image|chart) (?:above|below|on the (?:left|right))\b", 0.6)
        .keyword("flow_diagram_en", r"\b(?:flow ?chart|flow diagram|process diagram)\b", 0.6)
        .keyword("schematic_en", r"\bschematic(?: diagram)?\b", 0.6)
        .keyword("as_illustrated_en", r"\bas illustrated\b", 0.6)
        .keyword("see_detail_en", r"\bsee (?:in )?detail\b", 0.5)
        // Bare image words
        .generic("image_zh", r"图片|插图", 0.3)
        .generic("image_plain_zh", r"图像|图表", 0.25)
        .generic("image_en", r"\b(?:illustrations?|figures)\b", 0.3)
        .generic("image_plain_en", r"\b(?:images?|pictures?|photos?)\b", 0.25)
        .signal_terms([
            "流程", "步骤", "过程", "示例", "例如", "诊断", "诊疗", "治疗", "示意",
            "process", "workflow", "procedure", "step", "example", "diagnosis",
            "diagnostic", "treatment",
        ])
        .build()
        .expect("built-in reference patterns are valid");
}

/// One tiered reference rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Rule name, used in logs and errors
    pub name: String,
    /// Tier assigned to matches
    pub tier: Tier,
    /// Compiled case-insensitive pattern
    pub regex: Regex,
    /// Score given to matches, 0.0..=1.0
    pub base_score: f32,
    /// Score used when a STRICT match has to be downgraded to KEYWORD
    pub downgraded_score: f32,
}

/// Immutable set of reference rules and context signal terms.
///
/// # Examples
///
/// ```
/// use figure_oxide::scanner::PatternTable;
///
/// let table = PatternTable::builder()
///     .strict("plate", r"plate\s*(?P<major>\d+)(?:-(?P<minor>\d+))?", 0.9)
///     .keyword("pictured", r"\bpictured\b", 0.6)
///     .signal_terms(["workflow"])
///     .build()
///     .unwrap();
/// assert_eq!(table.rules().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct PatternTable {
    rules: Vec<PatternRule>,
    signal_terms: Vec<String>,
}

impl PatternTable {
    /// Start building a custom table.
    pub fn builder() -> PatternTableBuilder {
        PatternTableBuilder::default()
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Lower-cased signal vocabulary.
    pub fn signal_terms(&self) -> &[String] {
        &self.signal_terms
    }
}

impl Default for PatternTable {
    /// The built-in Chinese + English table.
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

#[derive(Debug, Clone)]
struct PendingRule {
    name: String,
    tier: Tier,
    pattern: String,
    base_score: f32,
    downgraded_score: f32,
}

/// Builder for [`PatternTable`]. Patterns are compiled in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct PatternTableBuilder {
    pending: Vec<PendingRule>,
    signal_terms: Vec<String>,
}

impl PatternTableBuilder {
    /// Add a STRICT rule. The pattern must define a `major` capture and may
    /// define a `minor` capture; matches without a parsable pair are
    /// downgraded to KEYWORD.
    pub fn strict(self, name: &str, pattern: &str, base_score: f32) -> Self {
        self.push(name, Tier::Strict, pattern, base_score)
    }

    /// Add a KEYWORD rule.
    pub fn keyword(self, name: &str, pattern: &str, base_score: f32) -> Self {
        self.push(name, Tier::Keyword, pattern, base_score)
    }

    /// Add a GENERIC rule.
    pub fn generic(self, name: &str, pattern: &str, base_score: f32) -> Self {
        self.push(name, Tier::Generic, pattern, base_score)
    }

    /// Override the downgrade score of the most recently added rule.
    pub fn with_downgraded_score(mut self, score: f32) -> Self {
        if let Some(draft) = self.pending.last_mut() {
            draft.downgraded_score = score;
        }
        self
    }

    /// Add context signal terms. Terms are matched case-insensitively.
    pub fn signal_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && !self.signal_terms.contains(&term) {
                self.signal_terms.push(term);
            }
        }
        self
    }

    fn push(mut self, name: &str, tier: Tier, pattern: &str, base_score: f32) -> Self {
        self.pending.push(PendingRule {
            name: name.to_string(),
            tier,
            pattern: pattern.to_string(),
            base_score,
            downgraded_score: DEFAULT_DOWNGRADED_SCORE,
        });
        self
    }

    /// Compile every rule.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPattern`] if a pattern does not compile, a score is
    /// outside `0.0..=1.0`, or a STRICT rule lacks the `major` capture.
    pub fn build(self) -> Result<PatternTable> {
        let mut rules = Vec::with_capacity(self.pending.len());

        for draft in self.pending {
            let invalid = |reason: String| Error::InvalidPattern {
                name: draft.name.clone(),
                reason,
            };

            for score in [draft.base_score, draft.downgraded_score] {
                if !(0.0..=1.0).contains(&score) {
                    return Err(invalid(format!("score {} outside 0.0..=1.0", score)));
                }
            }

            let regex = RegexBuilder::new(&draft.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| invalid(e.to_string()))?;

            if draft.tier == Tier::Strict
                && !regex.capture_names().flatten().any(|n| n == MAJOR_GROUP)
            {
                return Err(invalid(format!("missing '{}' capture group", MAJOR_GROUP)));
            }

            rules.push(PatternRule {
                name: draft.name,
                tier: draft.tier,
                regex,
                base_score: draft.base_score,
                downgraded_score: draft.downgraded_score,
            });
        }

        Ok(PatternTable {
            rules,
            signal_terms: self.signal_terms,
        })
    }
}
