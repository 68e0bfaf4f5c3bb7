//! Text cleanup for transcript segments.
//!
//! The normalizer fixes spacing; the preprocessor strips filler words and
//! repairs the punctuation debris the removals leave behind.

mod normalizer;
mod preprocessor;

pub use normalizer::TextNormalizer;
pub use preprocessor::TextPreprocessor;
