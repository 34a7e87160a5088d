//! spanmark Core - Entity spans, shared traits, and the markup interleaver
//!
//! This crate defines the core abstractions used throughout spanmark:
//! - Entity span model (character offsets + label)
//! - Common error types
//! - The span provider trait implemented by recognizers
//! - Configuration management
//! - Span markup rendering

pub mod config;
pub mod markup;

pub use config::{AppConfig, ConfigError, ExtractorConfig, LoggingConfig, MarkupConfig};
pub use markup::{annotate, paragraphed, render, render_with, AnnotatedText, OverlapPolicy};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for spanmark operations
#[derive(Error, Debug)]
pub enum SpanmarkError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Extraction error: {0}")]
    ExtractionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SpanmarkError>;

impl From<ConfigError> for SpanmarkError {
    fn from(err: ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

// ============================================================================
// Entity Spans
// ============================================================================

/// A labeled region of a text.
///
/// Offsets count characters (Unicode scalar values), not bytes. `start` is
/// inclusive and `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Inclusive start offset
    pub start: usize,

    /// Exclusive end offset
    pub end: usize,

    /// Entity class, e.g. "PERSON" or "ORG"
    pub label: String,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// Number of characters covered
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the two spans share at least one offset.
    ///
    /// Adjacent spans (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &EntitySpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check this span against a text of `text_len` characters
    pub fn validate(&self, text_len: usize) -> Result<()> {
        if self.start >= self.end {
            return Err(SpanmarkError::ValidationError(format!(
                "span {}..{} ({}) has start >= end",
                self.start, self.end, self.label
            )));
        }
        if self.end > text_len {
            return Err(SpanmarkError::ValidationError(format!(
                "span {}..{} ({}) exceeds text length {}",
                self.start, self.end, self.label, text_len
            )));
        }
        if self.label.is_empty() {
            return Err(SpanmarkError::ValidationError(format!(
                "span {}..{} has an empty label",
                self.start, self.end
            )));
        }
        if self.label.contains(&['"', '<', '>'][..]) {
            return Err(SpanmarkError::ValidationError(format!(
                "span {}..{} label {:?} contains markup characters",
                self.start, self.end, self.label
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for EntitySpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{} {}", self.start, self.end, self.label)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Anything that can locate entities in a text.
///
/// Implementations must return character offsets valid against `text`.
pub trait SpanProvider: Send + Sync {
    /// Find entity spans in `text`
    fn spans(&self, text: &str) -> Result<Vec<EntitySpan>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_overlap() {
        let a = EntitySpan::new(0, 4, "PERSON");
        let b = EntitySpan::new(3, 6, "ORG");
        let c = EntitySpan::new(4, 6, "ORG");

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c), "adjacent spans must not overlap");
    }

    #[test]
    fn test_span_validate_bounds() {
        assert!(EntitySpan::new(0, 2, "X").validate(2).is_ok());
        assert!(matches!(
            EntitySpan::new(1, 0, "X").validate(2),
            Err(SpanmarkError::ValidationError(_))
        ));
        assert!(matches!(
            EntitySpan::new(0, 5, "X").validate(2),
            Err(SpanmarkError::ValidationError(_))
        ));
        assert!(matches!(
            EntitySpan::new(1, 1, "X").validate(2),
            Err(SpanmarkError::ValidationError(_))
        ));
    }

    #[test]
    fn test_span_validate_label() {
        assert!(EntitySpan::new(0, 1, "").validate(2).is_err());
        assert!(EntitySpan::new(0, 1, "A\"B").validate(2).is_err());
        assert!(EntitySpan::new(0, 1, "<b>").validate(2).is_err());
        assert!(EntitySpan::new(0, 1, "WORK_OF_ART").validate(2).is_ok());
    }

    #[test]
    fn test_span_serde_shape() {
        let span: EntitySpan =
            serde_json::from_str(r#"{"start": 3, "end": 5, "label": "Y"}"#).unwrap();
        assert_eq!(span, EntitySpan::new(3, 5, "Y"));
        assert_eq!(span.len(), 2);
        assert_eq!(span.to_string(), "3..5 Y");
    }
}
