//! Data types shared by the scanner, resolver, fallback placer and insertion engine.
//!
//! All of these are created and discarded within a single reinsertion call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An image extracted from the source document, in extraction order.
///
/// Owned by the caller. The placement core reads `sequence_index` and
/// `source_page` only; `file_reference` is handed back to the marker formatter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// 1-based extraction order
    pub sequence_index: u32,
    /// 1-based page in the origin document, if known
    #[serde(default)]
    pub source_page: Option<u32>,
    /// Opaque handle to the stored image (usually a relative path)
    pub file_reference: String,
}

impl ImageDescriptor {
    /// Create a descriptor without page information.
    pub fn new(sequence_index: u32, file_reference: impl Into<String>) -> Self {
        Self {
            sequence_index,
            source_page: None,
            file_reference: file_reference.into(),
        }
    }

    /// Attach the page the image was extracted from.
    pub fn with_page(mut self, page: u32) -> Self {
        self.source_page = Some(page);
        self
    }
}

/// Priority class of a textual image reference, highest confidence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Bare "image"/"illustration" word
    Generic,
    /// Contextual phrase such as "as shown in the figure"
    Keyword,
    /// Numbered reference such as "Figure 2-1"
    Strict,
}

impl Tier {
    /// Sort priority, larger wins.
    pub fn priority(self) -> u8 {
        match self {
            Tier::Strict => 2,
            Tier::Keyword => 1,
            Tier::Generic => 0,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Strict => "STRICT",
            Tier::Keyword => "KEYWORD",
            Tier::Generic => "GENERIC",
        };
        f.write_str(name)
    }
}

/// A parsed `(chapter, index)` pair from a reference like "图 2-1" or "Figure 3.4".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FigureNumber {
    /// Chapter / major component
    pub major: u32,
    /// Index within the chapter
    pub minor: u32,
}

impl FigureNumber {
    /// Create a figure number.
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for FigureNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.major, self.minor)
    }
}

/// A textual reference to an image found by the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceCandidate {
    /// 0-based line in the flattened text
    pub line_number: usize,
    /// Raw matched phrase (after width normalization)
    pub matched_text: String,
    /// Priority class
    pub tier: Tier,
    /// Score from the pattern rule, 0.0..=1.0
    pub base_score: f32,
    /// Additive bonus from nearby signal terms
    pub context_bonus: f32,
    /// Parsed figure number, STRICT candidates only
    pub figure_number: Option<FigureNumber>,
}

impl ReferenceCandidate {
    /// Base score plus context bonus.
    pub fn score(&self) -> f32 {
        self.base_score + self.context_bonus
    }
}

/// How an assignment was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PlacementSource {
    /// Matched a textual reference of the given tier
    Reference {
        /// Tier of the consumed candidate
        tier: Tier,
    },
    /// Estimated from the image's page position
    PageRatio,
    /// Appended after the last line
    EndOfDocument,
    /// Listed under its page heading in a generated image-only document
    PageGroup,
}

impl PlacementSource {
    /// True when the marker lands inside the text rather than after it.
    pub fn is_in_text(self) -> bool {
        !matches!(self, PlacementSource::EndOfDocument)
    }
}

/// Final decision for one image.
///
/// The marker is inserted immediately after original line `target_line`.
/// End-of-document placements use `target_line == line_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementAssignment {
    /// The placed image
    pub image: ImageDescriptor,
    /// Line after which the marker goes, in original line coordinates
    pub target_line: usize,
    /// Resolved score for reference placements, 0.0 for fallbacks
    pub confidence: f32,
    /// Strategy that produced the placement
    pub source: PlacementSource,
}
