//! Retrieval-augmented question answering over stored segments.

mod engine;
mod search;

pub use engine::RagEngine;
pub use search::VectorSearch;
