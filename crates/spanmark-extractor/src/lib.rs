//! spanmark Extractor - Entity span providers
//!
//! Implements rule-based Named Entity Recognition (NER) and a static
//! provider that replays externally produced spans. Both plug into
//! [`spanmark_core::markup::annotate`] through [`SpanProvider`].

use serde::{Deserialize, Serialize};
use spanmark_core::{EntitySpan, Result};

pub mod loader;
pub mod ner;
pub mod offset;

pub use loader::{load_gazetteer, load_spans, GazetteerEntry, StaticSpans};
pub use ner::{EntityType, RuleBasedNer};
pub use spanmark_core::SpanProvider;

/// Extracted entity from text (character offsets)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
}

impl ExtractedEntity {
    /// Drop the matched text and confidence
    pub fn to_span(&self) -> EntitySpan {
        EntitySpan::new(self.start, self.end, self.label.clone())
    }
}

/// Trait for entity extractors
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<ExtractedEntity>>;
}
