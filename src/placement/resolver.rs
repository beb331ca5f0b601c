//! Reference-driven placement.

use super::SCORE_EPSILON;
use crate::config::TierThresholds;
use crate::model::{
    FigureNumber, ImageDescriptor, PlacementAssignment, PlacementSource, ReferenceCandidate, Tier,
};
use crate::utils::safe_float_cmp;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Candidates and figure numbers already used during one resolution.
///
/// Threaded through [`PlacementResolver::resolve_with`] instead of living on
/// the resolver, so the resolver itself stays immutable.
#[derive(Debug, Clone, Default)]
pub struct ConsumedCandidates {
    indices: HashSet<usize>,
    figures: HashSet<FigureNumber>,
}

impl ConsumedCandidates {
    /// Empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the candidate at `index`, or its figure number, was already used.
    pub fn is_consumed(&self, index: usize, candidate: &ReferenceCandidate) -> bool {
        self.indices.contains(&index)
            || candidate
                .figure_number
                .is_some_and(|number| self.figures.contains(&number))
    }

    /// Mark a candidate as used.
    pub fn consume(&mut self, index: usize, candidate: &ReferenceCandidate) {
        self.indices.insert(index);
        if let Some(number) = candidate.figure_number {
            self.figures.insert(number);
        }
    }

    /// Number of consumed candidates.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True if nothing was consumed.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Output of the reference pass.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Reference placements, in sequence order
    pub assignments: Vec<PlacementAssignment>,
    /// Images left for the fallback placer, in sequence order
    pub deferred: Vec<ImageDescriptor>,
}

/// Assigns images to reference candidates in document order.
#[derive(Debug, Clone, Default)]
pub struct PlacementResolver {
    thresholds: TierThresholds,
}

impl PlacementResolver {
    /// Create a resolver with the given acceptance thresholds.
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    /// Resolve with a fresh candidate pool.
    pub fn resolve(
        &self,
        images: &[ImageDescriptor],
        candidates: &[ReferenceCandidate],
    ) -> Resolution {
        let mut consumed = ConsumedCandidates::new();
        self.resolve_with(images, candidates, &mut consumed)
    }

    /// Resolve against an explicit pool of consumed candidates.
    ///
    /// Images are walked by ascending `sequence_index`. Each takes the
    /// highest-ranked candidate that
    /// - is not consumed (neither the candidate nor its figure number),
    /// - clears its tier's threshold,
    /// - sits on or after the line assigned to the previous placed image.
    ///
    /// Images with no eligible candidate are deferred. Unused candidates are dropped.
    pub fn resolve_with(
        &self,
        images: &[ImageDescriptor],
        candidates: &[ReferenceCandidate],
        consumed: &mut ConsumedCandidates,
    ) -> Resolution {
        let ranked = rank_candidates(candidates);

        let mut ordered: Vec<&ImageDescriptor> = images.iter().collect();
        ordered.sort_by_key(|image| image.sequence_index);

        let mut resolution = Resolution::default();
        let mut floor = 0usize;

        for image in ordered {
            let selected = ranked.iter().copied().find(|&index| {
                let candidate = &candidates[index];
                !consumed.is_consumed(index, candidate)
                    && candidate.line_number >= floor
                    && self.clears_threshold(candidate)
            });

            match selected {
                Some(index) => {
                    let candidate = &candidates[index];
                    consumed.consume(index, candidate);
                    floor = candidate.line_number;

                    log::debug!(
                        "Image {} -> line {} via {} '{}' (score {:.2})",
                        image.sequence_index,
                        candidate.line_number,
                        candidate.tier,
                        candidate.matched_text,
                        candidate.score()
                    );

                    resolution.assignments.push(PlacementAssignment {
                        image: image.clone(),
                        target_line: candidate.line_number,
                        confidence: candidate.score(),
                        source: PlacementSource::Reference {
                            tier: candidate.tier,
                        },
                    });
                },
                None => {
                    log::debug!("Image {} has no eligible reference, deferred", image.sequence_index);
                    resolution.deferred.push(image.clone());
                },
            }
        }

        resolution
    }

    fn clears_threshold(&self, candidate: &ReferenceCandidate) -> bool {
        candidate.score() + SCORE_EPSILON >= self.thresholds.for_tier(candidate.tier)
    }
}

/// Candidate indices, best first: numbered STRICT references, then by tier,
/// resolved score and line.
fn rank_candidates(candidates: &[ReferenceCandidate]) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..candidates.len()).collect();
    ranked.sort_by(|&a, &b| compare_candidates(&candidates[a], &candidates[b]));
    ranked
}

fn compare_candidates(a: &ReferenceCandidate, b: &ReferenceCandidate) -> Ordering {
    let numbered = |c: &ReferenceCandidate| c.tier == Tier::Strict && c.figure_number.is_some();

    numbered(b)
        .cmp(&numbered(a))
        .then_with(|| b.tier.priority().cmp(&a.tier.priority()))
        .then_with(|| safe_float_cmp(b.score(), a.score()))
        .then_with(|| a.line_number.cmp(&b.line_number))
}
