//! Reinsertion pipeline.
//!
//! [`ImageReinserter`] wires the scanner, resolver, fallback placer and
//! insertion engine together and is the entry point most callers need:
//!
//! ```
//! use figure_oxide::document::ImageReinserter;
//! use figure_oxide::insertion::MarkdownImageMarker;
//! use figure_oxide::model::ImageDescriptor;
//!
//! let reinserter = ImageReinserter::with_defaults();
//! let images = vec![
//!     ImageDescriptor::new(1, "images/doc/image_001.png"),
//!     ImageDescriptor::new(2, "images/doc/image_002.png"),
//! ];
//!
//! let report = reinserter
//!     .reinsert("Workflow\n如图 2-2 所示\nEnd", &images, None, &MarkdownImageMarker::default())
//!     .unwrap();
//!
//! assert_eq!(
//!     report.text,
//!     "Workflow\n如图 2-2 所示\n\n![image](images/doc/image_001.png)\nEnd\n\n![image](images/doc/image_002.png)"
//! );
//! assert_eq!(report.stats.strict, 1);
//! assert_eq!(report.stats.end_of_document, 1);
//! ```

use crate::config::PlacementConfig;
use crate::error::{Error, Result};
use crate::insertion::{InsertionEngine, MarkerFormatter};
use crate::links::normalize_image_links;
use crate::model::{ImageDescriptor, PlacementAssignment, PlacementSource, Tier};
use crate::placement::{FallbackPlacer, PlacementResolver};
use crate::scanner::{PatternTable, ReferenceScanner};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// How a converted document relates to its extracted images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// The converter already placed images (DOCX, PPTX) or there are none to place
    NoReinsertionNeeded,
    /// Text was flattened without image positions (PDF)
    NeedsHeuristicReinsertion,
}

impl DocumentKind {
    /// Classify by file extension, case-insensitively.
    pub fn from_extension(extension: &str) -> Self {
        if extension.trim_start_matches('.').eq_ignore_ascii_case("pdf") {
            DocumentKind::NeedsHeuristicReinsertion
        } else {
            DocumentKind::NoReinsertionNeeded
        }
    }

    /// Classify a source document by its path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(DocumentKind::NoReinsertionNeeded)
    }
}

/// Placement counts per strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlacementStats {
    /// Placed on a numbered reference
    pub strict: usize,
    /// Placed on a contextual phrase
    pub keyword: usize,
    /// Placed on a bare image word
    pub generic: usize,
    /// Placed by page-ratio estimate
    pub page_ratio: usize,
    /// Appended after the text
    pub end_of_document: usize,
    /// Listed in a generated image-only document
    pub page_group: usize,
    /// Existing image links rewritten
    pub rewritten_links: usize,
}

impl PlacementStats {
    /// Count assignments by source.
    pub fn from_assignments(assignments: &[PlacementAssignment]) -> Self {
        let mut stats = Self::default();
        for assignment in assignments {
            match assignment.source {
                PlacementSource::Reference { tier: Tier::Strict } => stats.strict += 1,
                PlacementSource::Reference { tier: Tier::Keyword } => stats.keyword += 1,
                PlacementSource::Reference { tier: Tier::Generic } => stats.generic += 1,
                PlacementSource::PageRatio => stats.page_ratio += 1,
                PlacementSource::EndOfDocument => stats.end_of_document += 1,
                PlacementSource::PageGroup => stats.page_group += 1,
            }
        }
        stats
    }

    /// Images placed by a textual reference.
    pub fn by_reference(&self) -> usize {
        self.strict + self.keyword + self.generic
    }

    /// Images placed by any strategy.
    pub fn total_placed(&self) -> usize {
        self.by_reference() + self.page_ratio + self.end_of_document + self.page_group
    }
}

/// Result of one reinsertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReinsertionReport {
    /// Augmented text
    pub text: String,
    /// One entry per placed image, in sequence order
    pub assignments: Vec<PlacementAssignment>,
    /// Counts per strategy
    pub stats: PlacementStats,
}

impl ReinsertionReport {
    fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            assignments: Vec::new(),
            stats: PlacementStats::default(),
        }
    }
}

/// Scanner, resolver, fallback placer and insertion engine behind one call.
#[derive(Debug, Clone)]
pub struct ImageReinserter {
    config: PlacementConfig,
    scanner: ReferenceScanner,
    resolver: PlacementResolver,
    fallback: FallbackPlacer,
    insertion: InsertionEngine,
}

impl ImageReinserter {
    /// Build a pipeline with the built-in pattern table.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if the configuration does not validate.
    pub fn new(config: PlacementConfig) -> Result<Self> {
        Self::with_pattern_table(config, PatternTable::default())
    }

    /// Build a pipeline with a custom pattern table.
    pub fn with_pattern_table(config: PlacementConfig, table: PatternTable) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scanner: ReferenceScanner::new(table, config.context),
            resolver: PlacementResolver::new(config.thresholds),
            fallback: FallbackPlacer::new(config.fallback),
            insertion: InsertionEngine::new(config.insertion),
            config,
        })
    }

    /// Pipeline with the default configuration and pattern table.
    pub fn with_defaults() -> Self {
        let config = PlacementConfig::default();
        Self {
            scanner: ReferenceScanner::with_defaults(),
            resolver: PlacementResolver::new(config.thresholds),
            fallback: FallbackPlacer::new(config.fallback),
            insertion: InsertionEngine::new(config.insertion),
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Decide where every image goes without touching the text.
    ///
    /// Returns exactly one assignment per image, in sequence order.
    pub fn plan<S: AsRef<str>>(
        &self,
        lines: &[S],
        images: &[ImageDescriptor],
        total_pages: Option<u32>,
    ) -> Result<Vec<PlacementAssignment>> {
        validate_images(images)?;
        Ok(self.plan_validated(lines, images, total_pages))
    }

    fn plan_validated<S: AsRef<str>>(
        &self,
        lines: &[S],
        images: &[ImageDescriptor],
        total_pages: Option<u32>,
    ) -> Vec<PlacementAssignment> {
        let candidates = self.scanner.scan(lines);
        let resolution = self.resolver.resolve(images, &candidates);
        self.fallback.place(resolution, lines, total_pages)
    }

    /// Insert one marker per image into flattened text.
    ///
    /// An empty image list returns the text unchanged. Empty text is valid
    /// and places every image at the end. Text using `\r\n` line endings
    /// keeps them, markers included.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidImageList`] if a sequence index is 0 or repeated.
    pub fn reinsert<F>(
        &self,
        text: &str,
        images: &[ImageDescriptor],
        total_pages: Option<u32>,
        formatter: &F,
    ) -> Result<ReinsertionReport>
    where
        F: MarkerFormatter + ?Sized,
    {
        validate_images(images)?;
        if images.is_empty() {
            return Ok(ReinsertionReport::unchanged(text));
        }

        let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
        let lines = split_lines(text);
        let assignments = self.plan_validated(&lines, images, total_pages);
        let mut output = self.insertion.apply(&lines, &assignments, formatter);

        // Keep the trailing newline when markers were appended after it.
        if text.ends_with('\n') && output.last().is_some_and(|l| !l.is_empty()) {
            output.push(String::new());
        }

        let stats = PlacementStats::from_assignments(&assignments);
        log::info!(
            "Reinserted {} images: {} by reference ({} strict, {} keyword, {} generic), {} by page ratio, {} at end",
            stats.total_placed(),
            stats.by_reference(),
            stats.strict,
            stats.keyword,
            stats.generic,
            stats.page_ratio,
            stats.end_of_document
        );

        Ok(ReinsertionReport {
            text: output.join(newline),
            assignments,
            stats,
        })
    }

    /// Process a converted document according to its kind.
    ///
    /// - [`DocumentKind::NoReinsertionNeeded`]: existing image links are
    ///   rewritten to the stored images, nothing is inserted.
    /// - [`DocumentKind::NeedsHeuristicReinsertion`]: text with (almost) no
    ///   content becomes a generated image-only document under `title`;
    ///   otherwise markers are reinserted.
    pub fn process<F>(
        &self,
        kind: DocumentKind,
        title: &str,
        text: &str,
        images: &[ImageDescriptor],
        total_pages: Option<u32>,
        formatter: &F,
    ) -> Result<ReinsertionReport>
    where
        F: MarkerFormatter + ?Sized,
    {
        validate_images(images)?;

        match kind {
            DocumentKind::NoReinsertionNeeded => {
                let (text, rewritten) = normalize_image_links(text, images, formatter);
                log::info!("Rewrote {} existing image links", rewritten);
                Ok(ReinsertionReport {
                    text,
                    assignments: Vec::new(),
                    stats: PlacementStats {
                        rewritten_links: rewritten,
                        ..PlacementStats::default()
                    },
                })
            },
            DocumentKind::NeedsHeuristicReinsertion => {
                if !images.is_empty() && text.trim().chars().count() < self.config.image_only.min_text_chars {
                    log::info!(
                        "Document '{}' has no usable text, generating image-only layout for {} images",
                        title,
                        images.len()
                    );
                    Ok(self.render_image_only(title, images, formatter))
                } else {
                    self.reinsert(text, images, total_pages, formatter)
                }
            },
        }
    }

    /// Generate a document listing every image under its page heading.
    ///
    /// Images without a page join the current group; the first group is page 1.
    pub fn render_image_only<F>(&self, title: &str, images: &[ImageDescriptor], formatter: &F) -> ReinsertionReport
    where
        F: MarkerFormatter + ?Sized,
    {
        let mut ordered: Vec<&ImageDescriptor> = images.iter().collect();
        ordered.sort_by_key(|image| image.sequence_index);

        let mut lines: Vec<String> = Vec::new();
        if !title.trim().is_empty() {
            lines.push(format!("# {}", title.trim()));
            lines.push(String::new());
        }
        if let Some(notice) = self.config.image_only.notice.as_deref() {
            lines.push(notice.to_string());
            lines.push(String::new());
        }

        let mut assignments = Vec::with_capacity(ordered.len());
        let mut current_page = 1u32;
        let mut heading_line: Option<usize> = None;

        for image in ordered {
            if let Some(page) = image.source_page {
                if page != current_page {
                    current_page = page;
                    heading_line = None;
                }
            }

            let heading = match heading_line {
                Some(line) => line,
                None => {
                    let heading = self
                        .config
                        .image_only
                        .page_heading
                        .replace("{page}", &current_page.to_string());
                    lines.push(format!("## {}", heading));
                    lines.push(String::new());
                    let line = lines.len() - 2;
                    heading_line = Some(line);
                    line
                },
            };

            lines.push(formatter.format(image));
            lines.push(String::new());

            assignments.push(PlacementAssignment {
                image: image.clone(),
                target_line: heading,
                confidence: 0.0,
                source: PlacementSource::PageGroup,
            });
        }

        let stats = PlacementStats::from_assignments(&assignments);
        ReinsertionReport {
            text: lines.join("\n"),
            assignments,
            stats,
        }
    }
}

impl Default for ImageReinserter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Flattened text as lines, without `\r` from `\r\n` endings. Empty text has no lines at all.
pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line)).collect()
    }
}

/// Reject image lists the placement core cannot work with.
fn validate_images(images: &[ImageDescriptor]) -> Result<()> {
    let mut seen = HashSet::with_capacity(images.len());
    for image in images {
        if image.sequence_index == 0 {
            return Err(Error::InvalidImageList(format!(
                "sequence index must start at 1 ({})",
                image.file_reference
            )));
        }
        if !seen.insert(image.sequence_index) {
            return Err(Error::InvalidImageList(format!(
                "duplicate sequence index {}",
                image.sequence_index
            )));
        }
    }
    Ok(())
}
