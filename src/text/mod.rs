//! Text utilities for reference scanning.
//!
//! PDF-to-text converters emit a mix of full-width and half-width forms,
//! especially in CJK documents. Patterns are matched against a normalized
//! copy of each line so "图２－１" and "图 2-1" are treated alike.

pub mod normalize;

pub use normalize::{ends_sentence, is_paragraph_break, is_punctuation_only, normalize_line};
