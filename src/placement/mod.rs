//! Mapping images to text positions.
//!
//! Placement runs in two passes:
//!
//! 1. [`PlacementResolver`] walks images in extraction order and hands each the
//!    best unused reference candidate that clears its tier threshold and does
//!    not precede the previous image's line.
//! 2. [`FallbackPlacer`] places whatever is left, first by page-ratio
//!    estimation, then by appending after the last line.
//!
//! Every image ends up in exactly one [`PlacementAssignment`](crate::model::PlacementAssignment).

pub mod fallback;
pub mod resolver;

pub use fallback::FallbackPlacer;
pub use resolver::{ConsumedCandidates, PlacementResolver, Resolution};

/// Slack for float comparisons between resolved scores and thresholds.
pub(crate) const SCORE_EPSILON: f32 = 1e-6;
