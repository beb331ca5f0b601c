//! Marker insertion.
//!
//! Applies a complete assignment list to the original lines. Assignments are
//! expressed in original line coordinates, so the engine never has to track
//! offsets caused by earlier insertions: it walks the original lines once and
//! emits the markers queued after each of them.

use crate::config::InsertionConfig;
use crate::model::{ImageDescriptor, PlacementAssignment};
use std::collections::{BTreeMap, HashSet};

/// Renders the textual marker for one image.
///
/// Implemented for any `Fn(&ImageDescriptor) -> String`, so a closure can be
/// passed wherever a formatter is expected.
pub trait MarkerFormatter {
    /// Marker text for `image`, without surrounding newlines.
    fn format(&self, image: &ImageDescriptor) -> String;
}

impl<F> MarkerFormatter for F
where
    F: Fn(&ImageDescriptor) -> String,
{
    fn format(&self, image: &ImageDescriptor) -> String {
        self(image)
    }
}

/// Alt text policy for [`MarkdownImageMarker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AltText {
    /// Same alt text for every image
    Fixed(String),
    /// `<prefix>_<NNN>` with the zero-padded sequence index
    Numbered(String),
}

/// Formats `![alt](file_reference)` Markdown image links.
///
/// # Examples
///
/// ```
/// use figure_oxide::insertion::{MarkdownImageMarker, MarkerFormatter};
/// use figure_oxide::model::ImageDescriptor;
///
/// let image = ImageDescriptor::new(7, "images/report/image_007.png");
///
/// assert_eq!(
///     MarkdownImageMarker::default().format(&image),
///     "![image](images/report/image_007.png)"
/// );
/// assert_eq!(
///     MarkdownImageMarker::numbered("report").format(&image),
///     "![report_007](images/report/image_007.png)"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownImageMarker {
    alt: AltText,
}

impl MarkdownImageMarker {
    /// Same alt text for every image.
    pub fn fixed(alt: impl Into<String>) -> Self {
        Self {
            alt: AltText::Fixed(alt.into()),
        }
    }

    /// Alt text derived from a prefix and the sequence index.
    pub fn numbered(prefix: impl Into<String>) -> Self {
        Self {
            alt: AltText::Numbered(prefix.into()),
        }
    }

    /// Alt text for `image`.
    pub fn alt_text(&self, image: &ImageDescriptor) -> String {
        let alt = match &self.alt {
            AltText::Fixed(alt) => alt.clone(),
            AltText::Numbered(prefix) => format!("{}_{:03}", prefix, image.sequence_index),
        };
        // Brackets would terminate the link label early.
        alt.replace(['[', ']'], "")
    }
}

impl Default for MarkdownImageMarker {
    fn default() -> Self {
        Self::fixed("image")
    }
}

impl MarkerFormatter for MarkdownImageMarker {
    fn format(&self, image: &ImageDescriptor) -> String {
        format!("![{}]({})", self.alt_text(image), image.file_reference)
    }
}

/// Merges assignments into the text.
#[derive(Debug, Clone, Default)]
pub struct InsertionEngine {
    config: InsertionConfig,
}

impl InsertionEngine {
    /// Create an engine.
    pub fn new(config: InsertionConfig) -> Self {
        Self { config }
    }

    /// Insert one marker per assigned image.
    ///
    /// - A marker with `target_line == L` goes right after original line `L`.
    /// - Markers sharing a target keep ascending `sequence_index` order.
    /// - Targets at or past the end are appended after the last line.
    /// - An image assigned twice is inserted once, at its first assignment.
    ///
    /// With `blank_line_before`, an empty line is emitted ahead of a marker
    /// unless the output is empty or already ends with a blank line.
    pub fn apply<S, F>(&self, lines: &[S], assignments: &[PlacementAssignment], formatter: &F) -> Vec<String>
    where
        S: AsRef<str>,
        F: MarkerFormatter + ?Sized,
    {
        let end = lines.len();

        let mut seen: HashSet<u32> = HashSet::with_capacity(assignments.len());
        let mut queued: BTreeMap<usize, Vec<&PlacementAssignment>> = BTreeMap::new();
        for assignment in assignments {
            if !seen.insert(assignment.image.sequence_index) {
                log::warn!(
                    "Image {} assigned more than once, keeping the first placement",
                    assignment.image.sequence_index
                );
                continue;
            }
            queued
                .entry(assignment.target_line.min(end))
                .or_default()
                .push(assignment);
        }
        for group in queued.values_mut() {
            group.sort_by_key(|a| a.image.sequence_index);
        }

        let mut output: Vec<String> = Vec::with_capacity(end + seen.len() * 2);

        for (index, line) in lines.iter().enumerate() {
            output.push(line.as_ref().to_string());
            if let Some(group) = queued.get(&index) {
                self.emit(&mut output, group, formatter);
            }
        }
        if let Some(group) = queued.get(&end) {
            self.emit(&mut output, group, formatter);
        }

        output
    }

    fn emit<F>(&self, output: &mut Vec<String>, group: &[&PlacementAssignment], formatter: &F)
    where
        F: MarkerFormatter + ?Sized,
    {
        for assignment in group {
            if self.config.blank_line_before && output.last().is_some_and(|l| !l.trim().is_empty()) {
                output.push(String::new());
            }
            output.push(formatter.format(&assignment.image));
        }
    }
}
