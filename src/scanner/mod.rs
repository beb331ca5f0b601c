//! Reference scanning.
//!
//! The scanner walks the flattened text line by line and records every
//! phrase that looks like a reference to an image:
//!
//! 1. **STRICT**: numbered references ("图 2-1", "Figure 3.4", "Table 1_2")
//! 2. **KEYWORD**: contextual phrases ("如图所示", "see figure", "flow diagram")
//! 3. **GENERIC**: bare image words ("图片", "illustration")
//!
//! Overlapping matches on one line keep only the highest-tier match for that
//! span. KEYWORD and GENERIC matches earn a bonus for each distinct signal
//! term found within a window of surrounding lines.

pub mod patterns;

pub use patterns::{PatternRule, PatternTable, PatternTableBuilder};

use crate::config::ContextWeighting;
use crate::model::{FigureNumber, ReferenceCandidate, Tier};
use crate::text::{is_punctuation_only, normalize_line};
use patterns::{MAJOR_GROUP, MINOR_GROUP};
use std::collections::HashSet;

/// A match before overlap resolution.
#[derive(Debug, Clone)]
struct RawMatch {
    start: usize,
    end: usize,
    text: String,
    tier: Tier,
    base_score: f32,
    figure_number: Option<FigureNumber>,
}

impl RawMatch {
    fn overlaps(&self, other: &RawMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Scans text for image references.
///
/// # Examples
///
/// ```
/// use figure_oxide::model::{FigureNumber, Tier};
/// use figure_oxide::scanner::ReferenceScanner;
///
/// let scanner = ReferenceScanner::with_defaults();
/// let candidates = scanner.scan(&["Intro text", "如图 2-2 所示"]);
///
/// assert_eq!(candidates.len(), 1);
/// assert_eq!(candidates[0].line_number, 1);
/// assert_eq!(candidates[0].tier, Tier::Strict);
/// assert_eq!(candidates[0].figure_number, Some(FigureNumber::new(2, 2)));
/// ```
#[derive(Debug, Clone)]
pub struct ReferenceScanner {
    table: PatternTable,
    context: ContextWeighting,
}

impl ReferenceScanner {
    /// Create a scanner from a pattern table and context weighting.
    pub fn new(table: PatternTable, context: ContextWeighting) -> Self {
        Self { table, context }
    }

    /// Scanner with the built-in table and default weighting.
    pub fn with_defaults() -> Self {
        Self::new(PatternTable::default(), ContextWeighting::default())
    }

    /// The pattern table in use.
    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Scan lines for references.
    ///
    /// Candidates come back in line order, and in column order within a line.
    pub fn scan<S: AsRef<str>>(&self, lines: &[S]) -> Vec<ReferenceCandidate> {
        let normalized: Vec<String> = lines.iter().map(|l| normalize_line(l.as_ref())).collect();
        let lowered: Vec<String> = normalized.iter().map(|l| l.to_lowercase()).collect();

        let mut candidates = Vec::new();

        for (line_number, line) in normalized.iter().enumerate() {
            if is_punctuation_only(line) {
                continue;
            }

            let matches = self.resolve_overlaps(self.match_line(line_number, line));
            if matches.is_empty() {
                continue;
            }

            // Computed lazily: most lines carry no reference at all.
            let mut bonus: Option<f32> = None;

            for m in matches {
                let context_bonus = match m.tier {
                    Tier::Strict => 0.0,
                    Tier::Keyword | Tier::Generic => {
                        let raw = *bonus.get_or_insert_with(|| self.context_bonus(&lowered, line_number));
                        raw.min(self.context.max_score - m.base_score).max(0.0)
                    },
                };

                candidates.push(ReferenceCandidate {
                    line_number,
                    matched_text: m.text,
                    tier: m.tier,
                    base_score: m.base_score,
                    context_bonus,
                    figure_number: m.figure_number,
                });
            }
        }

        log::debug!("Reference scan found {} candidates in {} lines", candidates.len(), lines.len());
        candidates
    }

    /// Run every rule against one normalized line.
    fn match_line(&self, line_number: usize, line: &str) -> Vec<RawMatch> {
        let mut matches = Vec::new();

        for rule in self.table.rules() {
            for caps in rule.regex.captures_iter(line) {
                let Some(whole) = caps.get(0) else { continue };
                if whole.as_str().is_empty() {
                    continue;
                }

                let (tier, base_score, figure_number) = match rule.tier {
                    Tier::Strict => {
                        let major = caps.name(MAJOR_GROUP).map(|m| m.as_str());
                        let minor = caps.name(MINOR_GROUP).map(|m| m.as_str());
                        match parse_figure_number(major, minor) {
                            Some(number) => (Tier::Strict, rule.base_score, Some(number)),
                            None => {
                                log::debug!(
                                    "Line {}: '{}' has no complete figure number, downgraded to KEYWORD",
                                    line_number,
                                    whole.as_str()
                                );
                                (Tier::Keyword, rule.downgraded_score, None)
                            },
                        }
                    },
                    tier => (tier, rule.base_score, None),
                };

                matches.push(RawMatch {
                    start: whole.start(),
                    end: whole.end(),
                    text: whole.as_str().to_string(),
                    tier,
                    base_score,
                    figure_number,
                });
            }
        }

        matches
    }

    /// Keep the best match for every overlapping span, then restore column order.
    fn resolve_overlaps(&self, mut matches: Vec<RawMatch>) -> Vec<RawMatch> {
        matches.sort_by(|a, b| {
            b.tier
                .cmp(&a.tier)
                .then_with(|| crate::utils::safe_float_cmp(b.base_score, a.base_score))
                .then_with(|| (b.end - b.start).cmp(&(a.end - a.start)))
                .then_with(|| a.start.cmp(&b.start))
        });

        let mut kept: Vec<RawMatch> = Vec::with_capacity(matches.len());
        for m in matches {
            if !kept.iter().any(|k| k.overlaps(&m)) {
                kept.push(m);
            }
        }

        kept.sort_by_key(|m| m.start);
        kept
    }

    /// Bonus from distinct signal terms within the context window.
    fn context_bonus(&self, lowered: &[String], line_number: usize) -> f32 {
        let terms = self.table.signal_terms();
        if terms.is_empty() || self.context.bonus_per_term <= 0.0 {
            return 0.0;
        }

        let first = line_number.saturating_sub(self.context.window);
        let last = line_number.saturating_add(self.context.window).min(lowered.len().saturating_sub(1));

        let mut found: HashSet<&str> = HashSet::new();
        for line in &lowered[first..=last] {
            for term in terms {
                if line.contains(term.as_str()) {
                    found.insert(term.as_str());
                }
            }
        }

        found.len() as f32 * self.context.bonus_per_term
    }
}

impl Default for ReferenceScanner {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Parse a `(major, minor)` pair. Both parts must be present, fit in `u32` and be positive.
fn parse_figure_number(major: Option<&str>, minor: Option<&str>) -> Option<FigureNumber> {
    let major: u32 = major?.parse().ok()?;
    let minor: u32 = minor?.parse().ok()?;
    if major == 0 || minor == 0 {
        return None;
    }
    Some(FigureNumber::new(major, minor))
}
