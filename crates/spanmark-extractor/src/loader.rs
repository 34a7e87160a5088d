//! Span and gazetteer loading
//!
//! Reads externally produced spans and gazetteer entries from JSON files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use spanmark_core::{EntitySpan, Result, SpanProvider, SpanmarkError};

use crate::EntityType;

// ============================================================================
// Static spans
// ============================================================================

/// Provider that returns a fixed span list for any text.
///
/// Offsets are checked against the text at render time, not here.
#[derive(Debug, Clone, Default)]
pub struct StaticSpans {
    spans: Vec<EntitySpan>,
}

impl StaticSpans {
    pub fn new(spans: Vec<EntitySpan>) -> Self {
        Self { spans }
    }

    /// Parse a JSON array of `{"start", "end", "label"}` objects
    pub fn from_json(json: &str) -> Result<Self> {
        let spans: Vec<EntitySpan> = serde_json::from_str(json)
            .map_err(|e| SpanmarkError::ExtractionError(format!("invalid span JSON: {e}")))?;
        Ok(Self::new(spans))
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl SpanProvider for StaticSpans {
    fn spans(&self, _text: &str) -> Result<Vec<EntitySpan>> {
        Ok(self.spans.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Load a span file into a [`StaticSpans`] provider
pub fn load_spans(path: impl AsRef<Path>) -> Result<StaticSpans> {
    let content = read(path.as_ref())?;
    let provider = StaticSpans::from_json(&content)?;
    tracing::debug!(path = %path.as_ref().display(), spans = provider.len(), "loaded spans");
    Ok(provider)
}

// ============================================================================
// Gazetteer
// ============================================================================

/// One known term and the label it maps to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazetteerEntry {
    pub term: String,
    pub label: EntityType,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Load gazetteer entries from a JSON array
pub fn load_gazetteer(path: impl AsRef<Path>) -> Result<Vec<GazetteerEntry>> {
    let content = read(path.as_ref())?;
    let entries: Vec<GazetteerEntry> = serde_json::from_str(&content).map_err(|e| {
        SpanmarkError::ExtractionError(format!(
            "invalid gazetteer {}: {e}",
            path.as_ref().display()
        ))
    })?;
    tracing::debug!(path = %path.as_ref().display(), entries = entries.len(), "loaded gazetteer");
    Ok(entries)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        SpanmarkError::ExtractionError(format!("failed to read {}: {e}", path.display()))
    })
}
