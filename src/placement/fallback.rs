//! Fallback placement for images the reference pass could not place.
//!
//! Two strategies, first hit wins:
//! 1. page-ratio estimate, optionally snapped to a nearby paragraph break
//! 2. end of document, in sequence order
//!
//! Reference placements pass through here too, so they can be moved to the
//! end of the paragraph holding the reference.

use super::resolver::Resolution;
use crate::config::FallbackConfig;
use crate::model::{ImageDescriptor, PlacementAssignment, PlacementSource};
use crate::text::{ends_sentence, is_paragraph_break};

/// Places deferred images and merges them with the reference placements.
#[derive(Debug, Clone, Default)]
pub struct FallbackPlacer {
    config: FallbackConfig,
}

impl FallbackPlacer {
    /// Create a placer.
    pub fn new(config: FallbackConfig) -> Self {
        Self { config }
    }

    /// Produce the complete assignment list, one entry per image, in sequence order.
    ///
    /// Page-ratio estimates never move above an earlier in-text placement
    /// nor below a later reference placement. Images without a usable page
    /// (or when `total_pages` is unknown) go after the last line with
    /// `target_line == lines.len()`. Once an image went there, every later
    /// deferred image follows it, so markers keep sequence order.
    pub fn place<S: AsRef<str>>(
        &self,
        resolution: Resolution,
        lines: &[S],
        total_pages: Option<u32>,
    ) -> Vec<PlacementAssignment> {
        let line_count = lines.len();

        let mut slots: Vec<Slot> = resolution
            .assignments
            .into_iter()
            .map(Slot::Placed)
            .chain(resolution.deferred.into_iter().map(Slot::Deferred))
            .collect();
        slots.sort_by_key(|slot| slot.sequence_index());

        // ceilings[i]: smallest reference target at or after slot i
        let mut ceilings = vec![usize::MAX; slots.len() + 1];
        for i in (0..slots.len()).rev() {
            ceilings[i] = match &slots[i] {
                Slot::Placed(a) => ceilings[i + 1].min(a.target_line),
                Slot::Deferred(_) => ceilings[i + 1],
            };
        }

        let mut floor = 0usize;
        let mut trailing = false;
        let mut placed = Vec::with_capacity(slots.len());
        let mut page_ratio_count = 0usize;
        let mut end_count = 0usize;

        for (i, slot) in slots.into_iter().enumerate() {
            let assignment = match slot {
                Slot::Placed(assignment) => self.settle_reference(assignment, lines, ceilings[i + 1]),
                Slot::Deferred(image) => {
                    let estimate = if trailing {
                        None
                    } else {
                        self.estimate_line(&image, lines, total_pages, floor, ceilings[i + 1])
                    };
                    match estimate {
                        Some(target_line) => {
                            log::debug!(
                                "Image {} -> line {} via page ratio (page {:?} of {:?})",
                                image.sequence_index,
                                target_line,
                                image.source_page,
                                total_pages
                            );
                            page_ratio_count += 1;
                            PlacementAssignment {
                                image,
                                target_line,
                                confidence: 0.0,
                                source: PlacementSource::PageRatio,
                            }
                        },
                        None => {
                            if trailing {
                                log::warn!(
                                    "Image {} ({}) follows an image at the end of document, appended after it",
                                    image.sequence_index,
                                    image.file_reference
                                );
                            } else {
                                log::warn!(
                                    "Image {} ({}) has no reference or page position, appended at end of document",
                                    image.sequence_index,
                                    image.file_reference
                                );
                            }
                            end_count += 1;
                            PlacementAssignment {
                                image,
                                target_line: line_count,
                                confidence: 0.0,
                                source: PlacementSource::EndOfDocument,
                            }
                        },
                    }
                },
            };

            if assignment.source == PlacementSource::EndOfDocument {
                trailing = true;
            } else if assignment.source.is_in_text() {
                floor = floor.max(assignment.target_line);
            }
            placed.push(assignment);
        }

        if page_ratio_count + end_count > 0 {
            log::debug!(
                "Fallback placed {} images by page ratio, {} at end of document",
                page_ratio_count,
                end_count
            );
        }

        placed
    }

    /// Move a reference placement to the end of its paragraph, never past `ceiling`.
    fn settle_reference<S: AsRef<str>>(
        &self,
        mut assignment: PlacementAssignment,
        lines: &[S],
        ceiling: usize,
    ) -> PlacementAssignment {
        if !self.config.snap_after_reference {
            return assignment;
        }

        let reference = assignment.target_line;
        if let Some(target) = paragraph_end(lines, reference, self.config.snap_window, ceiling) {
            if target != reference {
                log::debug!(
                    "Image {} moved from reference line {} to paragraph end at line {}",
                    assignment.image.sequence_index,
                    reference,
                    target
                );
                assignment.target_line = target;
            }
        }
        assignment
    }

    /// Page-ratio target clamped to `[floor, ceiling]`, or `None` when no estimate is possible.
    fn estimate_line<S: AsRef<str>>(
        &self,
        image: &ImageDescriptor,
        lines: &[S],
        total_pages: Option<u32>,
        floor: usize,
        ceiling: usize,
    ) -> Option<usize> {
        if !self.config.page_ratio || lines.is_empty() {
            return None;
        }
        let page = image.source_page?;
        let total = total_pages.filter(|&t| t > 0)?;

        let last = lines.len() - 1;
        let ceiling = ceiling.min(last).max(floor);

        let ratio = (page as f64 / total as f64).min(1.0);
        let raw = ((ratio * lines.len() as f64).round() as usize).min(last);

        let target = if self.config.snap_to_paragraph {
            snap_to_break(lines, raw, self.config.snap_window, floor, ceiling).unwrap_or(raw)
        } else {
            raw
        };

        Some(target.clamp(floor, ceiling))
    }
}

enum Slot {
    Placed(PlacementAssignment),
    Deferred(ImageDescriptor),
}

impl Slot {
    fn sequence_index(&self) -> u32 {
        match self {
            Slot::Placed(a) => a.image.sequence_index,
            Slot::Deferred(image) => image.sequence_index,
        }
    }
}

/// Target that puts the marker at a paragraph boundary near `raw`.
///
/// A blank line at `i` accepts the marker right after it; a heading at `i`
/// takes it right before, i.e. after line `i - 1`. Forward first, then backward.
fn snap_to_break<S: AsRef<str>>(
    lines: &[S],
    raw: usize,
    window: usize,
    floor: usize,
    ceiling: usize,
) -> Option<usize> {
    let target_for = |i: usize| -> Option<usize> {
        let line = lines.get(i)?.as_ref();
        if !is_paragraph_break(line) {
            return None;
        }
        let target = if line.trim().is_empty() {
            i
        } else {
            i.checked_sub(1)?
        };
        (floor..=ceiling).contains(&target).then_some(target)
    };

    let forward_end = raw.saturating_add(window).min(lines.len().saturating_sub(1));
    (raw..=forward_end)
        .find_map(target_for)
        .or_else(|| (raw.saturating_sub(window)..raw).rev().find_map(target_for))
}

/// Target closing the paragraph that holds line `reference`, looking at most `window` lines ahead.
///
/// Stops at the first blank line or heading, or at a line ending a sentence
/// right before one. `None` when nothing qualifies or the target would pass `ceiling`.
fn paragraph_end<S: AsRef<str>>(lines: &[S], reference: usize, window: usize, ceiling: usize) -> Option<usize> {
    let last = reference.saturating_add(window).min(lines.len().saturating_sub(1));

    for i in reference.saturating_add(1)..=last {
        let line = lines[i].as_ref();
        let target = if is_paragraph_break(line) {
            if line.trim().is_empty() {
                i
            } else {
                i - 1
            }
        } else if ends_sentence(line) && lines.get(i + 1).is_some_and(|next| is_paragraph_break(next.as_ref())) {
            i
        } else {
            continue;
        };
        return (target <= ceiling).then_some(target);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tier;

    fn image(seq: u32, page: Option<u32>) -> ImageDescriptor {
        ImageDescriptor {
            sequence_index: seq,
            source_page: page,
            file_reference: format!("image_{:03}.png", seq),
        }
    }

    fn reference(seq: u32, line: usize) -> PlacementAssignment {
        PlacementAssignment {
            image: image(seq, None),
            target_line: line,
            confidence: 0.95,
            source: PlacementSource::Reference { tier: Tier::Strict },
        }
    }

    fn text(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("line {}", i)).collect()
    }

    fn no_snap() -> FallbackPlacer {
        FallbackPlacer::new(FallbackConfig {
            snap_to_paragraph: false,
            ..FallbackConfig::default()
        })
    }

    #[test]
    fn test_end_of_document_without_pages() {
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(2, None), image(1, None)],
        };
        let placed = FallbackPlacer::default().place(resolution, &text(5), None);

        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0].image.sequence_index, 1);
        assert!(placed.iter().all(|a| a.target_line == 5));
        assert!(placed.iter().all(|a| a.source == PlacementSource::EndOfDocument));
    }

    #[test]
    fn test_empty_text_goes_to_end() {
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, Some(1))],
        };
        let placed = FallbackPlacer::default().place(resolution, &Vec::<String>::new(), Some(3));
        assert_eq!(placed[0].target_line, 0);
        assert_eq!(placed[0].source, PlacementSource::EndOfDocument);
    }

    #[test]
    fn test_page_ratio_estimate() {
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, Some(5))],
        };
        let placed = no_snap().place(resolution, &text(100), Some(10));
        assert_eq!(placed[0].source, PlacementSource::PageRatio);
        assert_eq!(placed[0].target_line, 50);
    }

    #[test]
    fn test_last_page_stays_inside_text() {
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, Some(12))],
        };
        let placed = no_snap().place(resolution, &text(40), Some(10));
        assert_eq!(placed[0].target_line, 39);
    }

    #[test]
    fn test_unknown_total_pages_disables_ratio() {
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, Some(2))],
        };
        let placed = FallbackPlacer::default().place(resolution, &text(10), None);
        assert_eq!(placed[0].source, PlacementSource::EndOfDocument);

        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, Some(2))],
        };
        let placed = FallbackPlacer::default().place(resolution, &text(10), Some(0));
        assert_eq!(placed[0].source, PlacementSource::EndOfDocument);
    }

    #[test]
    fn test_page_ratio_disabled() {
        let placer = FallbackPlacer::new(FallbackConfig {
            page_ratio: false,
            ..FallbackConfig::default()
        });
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, Some(2))],
        };
        let placed = placer.place(resolution, &text(10), Some(4));
        assert_eq!(placed[0].source, PlacementSource::EndOfDocument);
    }

    #[test]
    fn test_page_ratio_respects_earlier_reference() {
        // Image 1 is referenced at line 80; image 2 sits on page 1 of 10 but
        // must not move above it.
        let resolution = Resolution {
            assignments: vec![reference(1, 80)],
            deferred: vec![image(2, Some(1))],
        };
        let placed = no_snap().place(resolution, &text(100), Some(10));
        assert_eq!(placed[1].target_line, 80);
    }

    #[test]
    fn test_page_ratio_respects_later_reference() {
        let resolution = Resolution {
            assignments: vec![reference(2, 20)],
            deferred: vec![image(1, Some(9))],
        };
        let placed = no_snap().place(resolution, &text(100), Some(10));
        assert_eq!(placed[0].image.sequence_index, 1);
        assert_eq!(placed[0].target_line, 20);
        assert_eq!(placed[1].target_line, 20);
    }

    #[test]
    fn test_page_ratio_targets_monotonic() {
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, Some(6)), image(2, Some(3)), image(3, Some(8))],
        };
        let placed = no_snap().place(resolution, &text(100), Some(10));
        let lines: Vec<usize> = placed.iter().map(|a| a.target_line).collect();
        assert_eq!(lines, vec![60, 60, 80]);
    }

    #[test]
    fn test_snaps_forward_to_blank_line() {
        let mut lines = text(20);
        lines[12] = String::new();
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, Some(1))],
        };
        let placed = FallbackPlacer::default().place(resolution, &lines, Some(2));
        assert_eq!(placed[0].target_line, 12);
    }

    #[test]
    fn test_snaps_before_heading() {
        let mut lines = text(20);
        lines[13] = "## Results".to_string();
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, Some(1))],
        };
        let placed = FallbackPlacer::default().place(resolution, &lines, Some(2));
        assert_eq!(placed[0].target_line, 12);
    }

    #[test]
    fn test_snaps_backward_when_nothing_ahead() {
        let mut lines = text(40);
        lines[15] = String::new();
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, Some(1))],
        };
        let placed = FallbackPlacer::default().place(resolution, &lines, Some(2));
        assert_eq!(placed[0].target_line, 15);
    }

    #[test]
    fn test_snap_keeps_raw_estimate_when_no_break() {
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, Some(1))],
        };
        let placed = FallbackPlacer::default().place(resolution, &text(40), Some(2));
        assert_eq!(placed[0].target_line, 20);
    }

    #[test]
    fn test_reference_placements_pass_through() {
        let resolution = Resolution {
            assignments: vec![reference(1, 3)],
            deferred: vec![],
        };
        let placed = FallbackPlacer::default().place(resolution, &text(5), None);
        assert_eq!(placed, vec![reference(1, 3)]);
    }

    #[test]
    fn test_end_of_document_keeps_later_images_behind() {
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, None), image(2, Some(1))],
        };
        let placed = FallbackPlacer::default().place(resolution, &text(2), Some(2));

        assert_eq!(placed[0].source, PlacementSource::EndOfDocument);
        assert_eq!(placed[1].source, PlacementSource::EndOfDocument);
        assert!(placed.iter().all(|a| a.target_line == 2));
    }

    #[test]
    fn test_page_ratio_before_end_of_document_unaffected() {
        let resolution = Resolution {
            assignments: vec![],
            deferred: vec![image(1, Some(1)), image(2, None)],
        };
        let placed = no_snap().place(resolution, &text(10), Some(2));
        assert_eq!(placed[0].source, PlacementSource::PageRatio);
        assert_eq!(placed[0].target_line, 5);
        assert_eq!(placed[1].source, PlacementSource::EndOfDocument);
    }

    #[test]
    fn test_unbounded_snap_window() {
        let placer = FallbackPlacer::new(FallbackConfig {
            snap_window: usize::MAX,
            ..FallbackConfig::default()
        });
        let mut lines = text(10);
        lines[4] = String::new();
        let resolution = Resolution {
            assignments: vec![reference(1, 1)],
            deferred: vec![image(2, Some(1))],
        };

        let placed = placer.place(resolution, &lines, Some(2));
        let targets: Vec<usize> = placed.iter().map(|a| a.target_line).collect();
        assert_eq!(targets, vec![4, 4]);
    }

    #[test]
    fn test_reference_moves_to_blank_line() {
        let lines = ["intro", "see figure 1", "more text", "", "next"];
        let resolution = Resolution {
            assignments: vec![reference(1, 1)],
            deferred: vec![],
        };
        let placed = FallbackPlacer::default().place(resolution, &lines, None);
        assert_eq!(placed[0].target_line, 3);
        assert_eq!(placed[0].source, PlacementSource::Reference { tier: Tier::Strict });
    }

    #[test]
    fn test_reference_moves_before_heading() {
        let lines = ["a", "ref", "b", "## Next", "c"];
        let resolution = Resolution {
            assignments: vec![reference(1, 1)],
            deferred: vec![],
        };
        let placed = FallbackPlacer::default().place(resolution, &lines, None);
        assert_eq!(placed[0].target_line, 2);
    }

    #[test]
    fn test_reference_stops_after_closing_sentence() {
        let lines = ["ref", "closing line。", "", "after"];
        let resolution = Resolution {
            assignments: vec![reference(1, 0)],
            deferred: vec![],
        };
        let placed = FallbackPlacer::default().place(resolution, &lines, None);
        assert_eq!(placed[0].target_line, 1);
    }

    #[test]
    fn test_reference_stays_when_paragraph_end_out_of_window() {
        let mut lines = text(30);
        lines[20] = String::new();
        let resolution = Resolution {
            assignments: vec![reference(1, 2)],
            deferred: vec![],
        };
        let placed = FallbackPlacer::default().place(resolution, &lines, None);
        assert_eq!(placed[0].target_line, 2);
    }

    #[test]
    fn test_reference_snap_never_passes_next_reference() {
        let lines = ["ref a", "body", "ref b", "", "tail"];
        let resolution = Resolution {
            assignments: vec![reference(1, 0), reference(2, 2)],
            deferred: vec![],
        };
        let placed = FallbackPlacer::default().place(resolution, &lines, None);
        let targets: Vec<usize> = placed.iter().map(|a| a.target_line).collect();
        assert_eq!(targets, vec![0, 3]);
    }

    #[test]
    fn test_reference_snap_disabled() {
        let placer = FallbackPlacer::new(FallbackConfig {
            snap_after_reference: false,
            ..FallbackConfig::default()
        });
        let lines = ["intro", "see figure 1", "more text", "", "next"];
        let resolution = Resolution {
            assignments: vec![reference(1, 1)],
            deferred: vec![],
        };
        let placed = placer.place(resolution, &lines, None);
        assert_eq!(placed[0].target_line, 1);
    }
}
