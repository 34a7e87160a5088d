//! Span markup rendering
//!
//! Interleaves entity tags with the characters of a text:
//!
//! ```text
//! "ab cd" + [3..5 Y]  ->  <markup>ab <entity class="Y">cd</entity></markup>
//! ```
//!
//! Rendering is a pure function of its inputs. Spans are validated before any
//! output is produced, so a failing call never yields partial markup.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::{EntitySpan, Result, SpanProvider, SpanmarkError};

pub const MARKUP_OPEN: &str = "<markup>";
pub const MARKUP_CLOSE: &str = "</markup>";
pub const ENTITY_CLOSE: &str = "</entity>";

/// How spans that share offsets are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Overlapping spans are a validation error
    #[default]
    Reject,
    /// A span evicts every earlier span it overlaps
    LastWins,
}

impl std::fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reject => write!(f, "reject"),
            Self::LastWins => write!(f, "last-wins"),
        }
    }
}

impl std::str::FromStr for OverlapPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "reject" => Ok(Self::Reject),
            "last-wins" | "lastwins" => Ok(Self::LastWins),
            _ => Err(ConfigError::InvalidValue {
                key: "overlap_policy".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Input text paired with its markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedText {
    pub input: String,
    pub output: String,
}

/// Render `text` with tags around each span, rejecting overlaps.
pub fn render(text: &str, spans: &[EntitySpan]) -> Result<String> {
    render_with(text, spans, OverlapPolicy::Reject)
}

/// Render `text` with tags around each span.
///
/// Every span must satisfy `start < end <= text.chars().count()` and carry a
/// non-empty label. Overlaps are resolved according to `policy`.
pub fn render_with(text: &str, spans: &[EntitySpan], policy: OverlapPolicy) -> Result<String> {
    let text_len = text.chars().count();
    for span in spans {
        span.validate(text_len)?;
    }

    let spans = resolve_overlaps(spans, policy)?;

    let mut starts: HashMap<usize, &str> = HashMap::with_capacity(spans.len());
    let mut ends: HashSet<usize> = HashSet::with_capacity(spans.len());
    for span in &spans {
        starts.insert(span.start, span.label.as_str());
        ends.insert(span.end);
    }

    let tag_bytes: usize = spans
        .iter()
        .map(|s| s.label.len() + r#"<entity class="">"#.len() + ENTITY_CLOSE.len())
        .sum();
    let mut out =
        String::with_capacity(MARKUP_OPEN.len() + text.len() + tag_bytes + MARKUP_CLOSE.len());

    out.push_str(MARKUP_OPEN);
    for (p, ch) in text.chars().enumerate() {
        if ends.contains(&p) {
            out.push_str(ENTITY_CLOSE);
        }
        if let Some(label) = starts.get(&p) {
            push_open_tag(&mut out, label);
        }
        out.push(ch);
    }
    // A span ending at the text end is never visited by the scan.
    if ends.contains(&text_len) {
        out.push_str(ENTITY_CLOSE);
    }
    out.push_str(MARKUP_CLOSE);

    tracing::debug!(
        chars = text_len,
        spans = spans.len(),
        %policy,
        "rendered markup"
    );

    Ok(out)
}

fn push_open_tag(out: &mut String, label: &str) {
    out.push_str(r#"<entity class=""#);
    out.push_str(label);
    out.push_str(r#"">"#);
}

/// Apply the overlap policy, returning the spans to render
fn resolve_overlaps(spans: &[EntitySpan], policy: OverlapPolicy) -> Result<Vec<&EntitySpan>> {
    match policy {
        OverlapPolicy::Reject => {
            let mut sorted: Vec<&EntitySpan> = spans.iter().collect();
            sorted.sort_by_key(|s| (s.start, s.end));
            if let Some(pair) = sorted.windows(2).find(|w| w[0].overlaps(w[1])) {
                return Err(SpanmarkError::ValidationError(format!(
                    "spans {} and {} overlap",
                    pair[0], pair[1]
                )));
            }
            Ok(sorted)
        }
        OverlapPolicy::LastWins => {
            let mut kept: Vec<&EntitySpan> = Vec::with_capacity(spans.len());
            for span in spans {
                let before = kept.len();
                kept.retain(|k| !k.overlaps(span));
                if kept.len() != before {
                    tracing::trace!(entity = %span, evicted = before - kept.len(), "span overrides earlier spans");
                }
                kept.push(span);
            }
            Ok(kept)
        }
    }
}

/// Find spans with `provider` and render them.
pub fn annotate(provider: &dyn SpanProvider, text: &str, policy: OverlapPolicy) -> Result<String> {
    let spans = provider.spans(text)?;
    tracing::debug!(provider = provider.name(), found = spans.len(), "spans provided");
    render_with(text, &spans, policy)
}

/// Reflow markup for display: blank lines become `<p/>` breaks.
///
/// Non-blank lines are concatenated with their line breaks removed.
pub fn paragraphed(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    for line in markup.split('\n') {
        if line.trim().is_empty() {
            out.push_str("<p/>\n");
        } else {
            out.push_str(line);
        }
    }
    out
}
