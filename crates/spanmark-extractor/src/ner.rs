//! Named Entity Recognition (NER) module
//!
//! Rule-based recognizer: regex patterns for dates, times, amounts and
//! percentages, plus a gazetteer of known names. Labels follow the
//! OntoNotes scheme (`PERSON`, `ORG`, `GPE`, ...) used by common NLP
//! pipelines, so spans from either source render identically.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use spanmark_core::{EntitySpan, ExtractorConfig, Result, SpanProvider, SpanmarkError};

use crate::loader::{load_gazetteer, GazetteerEntry};
use crate::offset::CharIndex;
use crate::{EntityExtractor, ExtractedEntity};

// ============================================================================
// Entity Types
// ============================================================================

/// Entity types recognized by the NER system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    // Names
    Person,
    Norp,
    Org,
    Gpe,
    Loc,
    Product,
    Event,

    // Time
    Date,
    Time,

    // Numeric
    Money,
    Percent,
    Ordinal,
    Cardinal,
}

impl EntityType {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Norp => "NORP",
            Self::Org => "ORG",
            Self::Gpe => "GPE",
            Self::Loc => "LOC",
            Self::Product => "PRODUCT",
            Self::Event => "EVENT",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Money => "MONEY",
            Self::Percent => "PERCENT",
            Self::Ordinal => "ORDINAL",
            Self::Cardinal => "CARDINAL",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Rule-based NER
// ============================================================================

/// Confidence for a gazetteer hit on the main term
const TERM_CONFIDENCE: f32 = 0.95;
/// Confidence for a gazetteer hit on an alias
const ALIAS_CONFIDENCE: f32 = 0.9;

/// Rule-based NER using regex patterns and a gazetteer
pub struct RuleBasedNer {
    /// Pattern rules (regex -> entity type)
    patterns: Vec<(Regex, EntityType, f32)>,
    /// Gazetteer entries by main term
    dictionary: HashMap<String, GazetteerEntry>,
    /// Compiled term and alias matchers
    matchers: Vec<(Regex, EntityType, f32)>,
    /// Entities below this confidence are dropped
    min_confidence: f32,
}

impl RuleBasedNer {
    /// Create a new rule-based NER with the default English rules
    pub fn new() -> Self {
        let mut ner = Self::empty();
        ner.init_patterns();
        ner.init_dictionary();
        ner
    }

    /// Create a recognizer with no rules at all
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            dictionary: HashMap::new(),
            matchers: Vec::new(),
            min_confidence: 0.0,
        }
    }

    /// Build from configuration: default rules, threshold, optional gazetteer
    pub fn from_config(config: &ExtractorConfig) -> Result<Self> {
        let mut ner = Self::new().with_threshold(config.min_confidence);
        if let Some(path) = &config.gazetteer_path {
            ner = ner.with_gazetteer_file(path)?;
        }
        Ok(ner)
    }

    /// Set the confidence threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.min_confidence = threshold.clamp(0.0, 1.0);
        self
    }

    /// Add every entry of a JSON gazetteer file
    pub fn with_gazetteer_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        for entry in load_gazetteer(path)? {
            let aliases: Vec<&str> = entry.aliases.iter().map(String::as_str).collect();
            self.add_term(&entry.term, entry.label, &aliases)?;
        }
        Ok(self)
    }

    /// Number of gazetteer terms (aliases not counted)
    pub fn term_count(&self) -> usize {
        self.dictionary.len()
    }

    /// Initialize regex patterns
    fn init_patterns(&mut self) {
        const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December";

        let rules: Vec<(String, EntityType, f32)> = vec![
            // Dates
            (r"\b\d{4}-\d{2}-\d{2}\b".into(), EntityType::Date, 0.95),
            (r"\b\d{1,2}/\d{1,2}/\d{4}\b".into(), EntityType::Date, 0.95),
            (
                format!(
                    r"\b(?:{months})(?: \d{{1,2}}(?:st|nd|rd|th)?)?,? \d{{4}}\b",
                    months = MONTHS
                ),
                EntityType::Date,
                0.95,
            ),
            (
                format!(
                    r"\b(?:{months}) \d{{1,2}}(?:st|nd|rd|th)?\b",
                    months = MONTHS
                ),
                EntityType::Date,
                0.9,
            ),
            (
                r"(?i)\b(?:earlier |later )?(?:this|last|next) (?:week|month|year)\b".into(),
                EntityType::Date,
                0.85,
            ),
            (
                r"\b(?:Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday)s?\b".into(),
                EntityType::Date,
                0.85,
            ),
            (r"(?i)\b(?:yesterday|today|tomorrow)\b".into(), EntityType::Date, 0.8),
            (r"\b(?:1\d|20)\d{2}s?\b".into(), EntityType::Date, 0.8),
            // Times
            (r"(?i)\b\d{1,2}:\d{2}(?:\s?[ap]m)?\b".into(), EntityType::Time, 0.9),
            (r"(?i)\b\d{1,2}\s?[ap]m\b".into(), EntityType::Time, 0.9),
            // Money
            (
                r"\$\d+(?:,\d{3})*(?:\.\d+)?(?: (?:million|billion|trillion)\b)?".into(),
                EntityType::Money,
                0.95,
            ),
            (
                r"(?i)\b\d+(?:\.\d+)? (?:dollars|euros|pounds|cents)\b".into(),
                EntityType::Money,
                0.9,
            ),
            // Percentages
            (r"\b\d+(?:\.\d+)?(?:%|\s?percent\b)".into(), EntityType::Percent, 0.95),
            // Ordinals
            (r"\b\d+(?:st|nd|rd|th)\b".into(), EntityType::Ordinal, 0.85),
        ];

        for (pattern, entity_type, confidence) in rules {
            if let Err(e) = self.add_pattern(&pattern, entity_type, confidence) {
                tracing::warn!(pattern = %pattern, error = %e, "skipping invalid pattern");
            }
        }
    }

    /// Initialize the built-in gazetteer
    fn init_dictionary(&mut self) {
        let terms: [(&str, EntityType, &[&str]); 16] = [
            // People
            ("Sebastian Thrun", EntityType::Person, &["Thrun"]),
            ("Ada Lovelace", EntityType::Person, &["Lovelace"]),
            ("Alan Turing", EntityType::Person, &["Turing"]),
            // Organizations
            ("Google", EntityType::Org, &["Alphabet"]),
            ("Microsoft", EntityType::Org, &[]),
            ("Recode", EntityType::Org, &[]),
            ("United Nations", EntityType::Org, &["UN"]),
            // Places
            ("United States", EntityType::Gpe, &["USA", "U.S."]),
            ("United Kingdom", EntityType::Gpe, &["UK", "Britain"]),
            ("London", EntityType::Gpe, &[]),
            ("Paris", EntityType::Gpe, &[]),
            ("California", EntityType::Gpe, &[]),
            ("Europe", EntityType::Loc, &[]),
            // Nationalities and groups
            ("American", EntityType::Norp, &["Americans"]),
            ("British", EntityType::Norp, &[]),
            ("European", EntityType::Norp, &["Europeans"]),
        ];

        for (term, entity_type, aliases) in terms {
            if let Err(e) = self.add_term(term, entity_type, aliases) {
                tracing::warn!(term, error = %e, "skipping gazetteer term");
            }
        }
    }

    /// Add a regex pattern
    pub fn add_pattern(
        &mut self,
        pattern: &str,
        entity_type: EntityType,
        confidence: f32,
    ) -> Result<()> {
        let regex = Regex::new(pattern)
            .map_err(|e| SpanmarkError::ExtractionError(format!("invalid pattern: {e}")))?;
        self.patterns.push((regex, entity_type, confidence));
        Ok(())
    }

    /// Add a gazetteer term with aliases, matched case-insensitively on word boundaries
    pub fn add_term(&mut self, term: &str, entity_type: EntityType, aliases: &[&str]) -> Result<()> {
        self.matchers
            .push((term_regex(term)?, entity_type, TERM_CONFIDENCE));
        for alias in aliases {
            self.matchers
                .push((term_regex(alias)?, entity_type, ALIAS_CONFIDENCE));
        }

        let entry = GazetteerEntry {
            term: term.to_string(),
            label: entity_type,
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
        };
        self.dictionary.insert(term.to_string(), entry);
        Ok(())
    }

    /// Extract entities matching `rules`, converting offsets to characters
    fn extract_with(
        rules: &[(Regex, EntityType, f32)],
        text: &str,
        index: &CharIndex,
    ) -> Vec<ExtractedEntity> {
        let mut entities = Vec::new();

        for (regex, entity_type, confidence) in rules {
            for mat in regex.find_iter(text) {
                let (start, end) = index.char_range(mat.start(), mat.end());
                entities.push(ExtractedEntity {
                    text: mat.as_str().to_string(),
                    label: entity_type.to_string(),
                    start,
                    end,
                    confidence: *confidence,
                });
            }
        }

        entities
    }

    /// Remove overlapping entities, keeping earliest then most confident then longest
    fn deduplicate(&self, mut entities: Vec<ExtractedEntity>) -> Vec<ExtractedEntity> {
        entities.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(
                    b.confidence
                        .partial_cmp(&a.confidence)
                        .unwrap_or(Ordering::Equal),
                )
                .then((b.end - b.start).cmp(&(a.end - a.start)))
        });

        let mut result = Vec::new();
        let mut covered: HashSet<usize> = HashSet::new();

        for entity in entities {
            let overlaps = (entity.start..entity.end).any(|i| covered.contains(&i));

            if !overlaps {
                covered.extend(entity.start..entity.end);
                result.push(entity);
            }
        }

        result.sort_by_key(|e| e.start);
        result
    }
}

/// Case-insensitive matcher for a literal term.
///
/// Word boundaries are only required on sides where the term starts or ends
/// with a word character, so terms like "U.S." still match.
fn term_regex(term: &str) -> Result<Regex> {
    let term = term.trim();
    if term.is_empty() {
        return Err(SpanmarkError::ExtractionError(
            "gazetteer term is empty".to_string(),
        ));
    }

    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let leading = if term.starts_with(is_word) { r"\b" } else { "" };
    let trailing = if term.ends_with(is_word) { r"\b" } else { "" };

    Regex::new(&format!("(?i){leading}{}{trailing}", regex::escape(term)))
        .map_err(|e| SpanmarkError::ExtractionError(format!("invalid term {term:?}: {e}")))
}

impl Default for RuleBasedNer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor for RuleBasedNer {
    fn extract(&self, text: &str) -> Result<Vec<ExtractedEntity>> {
        let index = CharIndex::new(text);

        let mut entities = Self::extract_with(&self.patterns, text, &index);
        entities.extend(Self::extract_with(&self.matchers, text, &index));
        entities.retain(|e| e.confidence >= self.min_confidence);

        let entities = self.deduplicate(entities);
        tracing::debug!(found = entities.len(), "rule-based extraction finished");

        Ok(entities)
    }
}

impl SpanProvider for RuleBasedNer {
    fn spans(&self, text: &str) -> Result<Vec<EntitySpan>> {
        Ok(self
            .extract(text)?
            .iter()
            .map(ExtractedEntity::to_span)
            .collect())
    }

    fn name(&self) -> &str {
        "rule-based"
    }
}

// ============================================================================
// Tests
// ============================================================================
