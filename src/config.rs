//! Configuration for image placement.
//!
//! Defaults reproduce the empirically tuned values of the original pipeline.
//! Every threshold and bonus can be overridden in code or loaded from JSON.

use crate::error::{Error, Result};
use crate::model::Tier;
use serde::{Deserialize, Serialize};

/// Minimum resolved score a candidate of each tier needs before the resolver
/// will place an image on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Acceptance threshold for explicit numbered references (default: 0.7)
    pub strict: f32,
    /// Acceptance threshold for contextual phrases (default: 0.6)
    pub keyword: f32,
    /// Acceptance threshold for bare image words (default: 0.3)
    pub generic: f32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            strict: 0.7,
            keyword: 0.6,
            generic: 0.3,
        }
    }
}

impl TierThresholds {
    /// Threshold for the given tier.
    pub fn for_tier(&self, tier: Tier) -> f32 {
        match tier {
            Tier::Strict => self.strict,
            Tier::Keyword => self.keyword,
            Tier::Generic => self.generic,
        }
    }
}

/// Scoring bonus from domain-signal terms near a KEYWORD or GENERIC match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextWeighting {
    /// Lines scanned on each side of the match (default: 2)
    pub window: usize,
    /// Bonus added per distinct signal term found (default: 0.1)
    pub bonus_per_term: f32,
    /// Upper bound on base score plus bonus (default: 1.0)
    pub max_score: f32,
}

impl Default for ContextWeighting {
    fn default() -> Self {
        Self {
            window: 2,
            bonus_per_term: 0.1,
            max_score: 1.0,
        }
    }
}

/// Behavior for images no reference could be found for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Estimate a line from the image's page when page info is known (default: true)
    pub page_ratio: bool,
    /// Move page-ratio estimates to the nearest paragraph break (default: true)
    pub snap_to_paragraph: bool,
    /// Move reference placements forward to the end of their paragraph (default: true)
    pub snap_after_reference: bool,
    /// Lines searched when snapping, on each side of a page-ratio estimate
    /// and below a reference (default: 10)
    pub snap_window: usize,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            page_ratio: true,
            snap_to_paragraph: true,
            snap_after_reference: true,
            snap_window: 10,
        }
    }
}

/// Output layout of inserted markers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertionConfig {
    /// Emit an empty line before every marker (default: true)
    pub blank_line_before: bool,
}

impl Default for InsertionConfig {
    fn default() -> Self {
        Self {
            blank_line_before: true,
        }
    }
}

/// Settings for documents that carry (almost) no extractable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageOnlyConfig {
    /// Trimmed text shorter than this is treated as an image-only document (default: 50)
    pub min_text_chars: usize,
    /// Heading template per page group, `{page}` is replaced (default: "Page {page}")
    pub page_heading: String,
    /// Paragraph written under the title, `None` to omit it
    pub notice: Option<String>,
}

impl Default for ImageOnlyConfig {
    fn default() -> Self {
        Self {
            min_text_chars: 50,
            page_heading: "Page {page}".to_string(),
            notice: Some(
                "**Note**: This is an image-only PDF and no text could be extracted. The extracted images follow."
                    .to_string(),
            ),
        }
    }
}

/// Complete placement configuration.
///
/// # Examples
///
/// ```
/// use figure_oxide::config::PlacementConfig;
///
/// let config = PlacementConfig::new()
///     .with_thresholds(0.8, 0.6, 0.4)
///     .with_context_window(3)
///     .with_page_ratio(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Per-tier acceptance thresholds
    pub thresholds: TierThresholds,
    /// Context bonus settings
    pub context: ContextWeighting,
    /// Fallback placement settings
    pub fallback: FallbackConfig,
    /// Marker layout settings
    pub insertion: InsertionConfig,
    /// Image-only document settings
    pub image_only: ImageOnlyConfig,
}

impl PlacementConfig {
    /// Create a configuration with the default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-tier thresholds.
    pub fn with_thresholds(mut self, strict: f32, keyword: f32, generic: f32) -> Self {
        self.thresholds = TierThresholds {
            strict,
            keyword,
            generic,
        };
        self
    }

    /// Set the number of context lines scanned on each side of a match.
    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context.window = window;
        self
    }

    /// Set the bonus per distinct signal term.
    pub fn with_context_bonus(mut self, bonus: f32) -> Self {
        self.context.bonus_per_term = bonus;
        self
    }

    /// Enable or disable page-ratio estimation.
    pub fn with_page_ratio(mut self, enable: bool) -> Self {
        self.fallback.page_ratio = enable;
        self
    }

    /// Enable or disable paragraph snapping of page-ratio estimates.
    pub fn with_paragraph_snapping(mut self, enable: bool) -> Self {
        self.fallback.snap_to_paragraph = enable;
        self
    }

    /// Enable or disable moving reference placements to the end of their paragraph.
    pub fn with_reference_snapping(mut self, enable: bool) -> Self {
        self.fallback.snap_after_reference = enable;
        self
    }

    /// Enable or disable the blank line emitted before each marker.
    pub fn with_blank_line_before(mut self, enable: bool) -> Self {
        self.insertion.blank_line_before = enable;
        self
    }

    /// Parse a (possibly partial) JSON configuration. Missing fields keep defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        for (name, value) in [("strict", t.strict), ("keyword", t.keyword), ("generic", t.generic)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{} threshold must be within 0.0..=1.0, got {}",
                    name, value
                )));
            }
        }

        let bonus = self.context.bonus_per_term;
        if bonus.is_nan() || bonus < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "context bonus must be non-negative, got {}",
                bonus
            )));
        }

        let cap = self.context.max_score;
        if cap.is_nan() || cap <= 0.0 || cap > 1.0 {
            return Err(Error::InvalidConfig(format!(
                "score cap must be within (0.0, 1.0], got {}",
                cap
            )));
        }

        Ok(())
    }
}
