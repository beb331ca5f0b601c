// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::enum_variant_names)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # Figure Oxide
//!
//! Puts extracted images back into flattened document text.
//!
//! PDF-to-text conversion loses the position of every figure. Given the
//! converted text and the list of images extracted from the same document,
//! this crate decides, for every image, the line it belongs after and
//! inserts a Markdown image marker there.
//!
//! ## Pipeline
//!
//! 1. [`scanner::ReferenceScanner`] finds textual references ("如图 2-1",
//!    "see figure", "插图") and scores them in three tiers: STRICT, KEYWORD
//!    and GENERIC, with a bonus for nearby domain terms.
//! 2. [`placement::PlacementResolver`] walks images in extraction order and
//!    assigns each the best remaining reference at or after the previous one.
//! 3. [`placement::FallbackPlacer`] places the rest by page ratio when page
//!    information is known, otherwise after the last line.
//! 4. [`insertion::InsertionEngine`] writes one marker per image.
//!
//! Every image is placed exactly once and never dropped.
//!
//! ## Quick Start
//!
//! ```
//! use figure_oxide::{ImageDescriptor, ImageReinserter, MarkdownImageMarker};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let reinserter = ImageReinserter::with_defaults();
//! let images = vec![
//!     ImageDescriptor::new(1, "images/guide/image_001.png").with_page(1),
//!     ImageDescriptor::new(2, "images/guide/image_002.png").with_page(2),
//! ];
//!
//! let text = "诊疗流程\n治疗步骤如图所示\n\n附录";
//! let report = reinserter.reinsert(text, &images, Some(2), &MarkdownImageMarker::default())?;
//!
//! assert_eq!(report.assignments.len(), 2);
//! assert_eq!(report.text.matches("![image]").count(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Shared data types
pub mod model;

// Text normalization
pub mod text;

// Reference detection
pub mod scanner;

// Placement decisions
pub mod placement;

// Marker output
pub mod insertion;

// Pipeline facade and document kinds
pub mod document;

// Link rewriting for converters that keep images in place
pub mod links;

// Image manifests
pub mod manifest;

// Re-exports
pub use config::PlacementConfig;
pub use document::{DocumentKind, ImageReinserter, PlacementStats, ReinsertionReport};
pub use error::{Error, Result};
pub use insertion::{InsertionEngine, MarkdownImageMarker, MarkerFormatter};
pub use manifest::ImageManifest;
pub use model::{
    FigureNumber, ImageDescriptor, PlacementAssignment, PlacementSource, ReferenceCandidate, Tier,
};
pub use placement::{FallbackPlacer, PlacementResolver};
pub use scanner::{PatternTable, ReferenceScanner};

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Safely compare two floating point numbers, handling NaN cases.
    ///
    /// NaN values are treated as equal to each other and greater than all other values.
    /// This ensures that sorting operations never panic due to NaN comparisons.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// # use std::cmp::Ordering;
    /// # use figure_oxide::utils::safe_float_cmp;
    /// assert_eq!(safe_float_cmp(1.0, 2.0), Ordering::Less);
    /// assert_eq!(safe_float_cmp(2.0, 1.0), Ordering::Greater);
    /// assert_eq!(safe_float_cmp(1.0, 1.0), Ordering::Equal);
    ///
    /// // NaN handling
    /// assert_eq!(safe_float_cmp(f32::NAN, f32::NAN), Ordering::Equal);
    /// assert_eq!(safe_float_cmp(f32::NAN, 1.0), Ordering::Greater);
    /// assert_eq!(safe_float_cmp(1.0, f32::NAN), Ordering::Less);
    /// ```
    #[inline]
    pub fn safe_float_cmp(a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater, // NaN > all numbers
            (false, true) => Ordering::Less,    // all numbers < NaN
            (false, false) => {
                // Both are normal numbers, safe to unwrap
                a.partial_cmp(&b).unwrap()
            },
        }
    }

}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
