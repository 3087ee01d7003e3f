//! Field validation engine
//!
//! Applies the per-field rule set to normalized records and accumulates
//! structured findings. The engine is a pure function of the record, the
//! loaded [`VocabularyIndex`] and a read-only privacy context; it never
//! fails on bad data, so one broken field or record cannot abort a batch.
//! Cross-record concerns (placeholder-privacy propagation, duplicate
//! identifiers) live in the two-pass [`ValidationRun`] orchestration.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{Record, ResourceKind, ValueKind};
use crate::schema::{self, Requirement, SemanticType};
use crate::vocabulary::VocabularyIndex;

/// Severity of a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One validation outcome for one field occurrence on one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFinding {
    pub resource_kind: ResourceKind,
    pub resource_id: u64,
    pub field_name: String,
    pub occurrence_index: Option<usize>,
    pub severity: Severity,
    pub message: String,
}

impl FieldFinding {
    fn new(
        record: &Record,
        field_name: &str,
        occurrence_index: Option<usize>,
        severity: Severity,
        message: String,
    ) -> Self {
        Self {
            resource_kind: record.kind,
            resource_id: record.id,
            field_name: field_name.to_string(),
            occurrence_index,
            severity,
            message,
        }
    }
}

impl fmt::Display for FieldFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}", self.resource_kind, self.resource_id, self.field_name)?;
        if let Some(index) = self.occurrence_index {
            write!(f, "[{index}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Filename fragment marking a non-public placeholder media file.
const PLACEHOLDER_MARKER: &str = "sgb-fdp-platzhalter";

/// Whether a media record carries a placeholder file that should be private.
pub fn has_placeholder_media(record: &Record) -> bool {
    record
        .filename
        .as_deref()
        .is_some_and(|name| name.to_lowercase().contains(PLACEHOLDER_MARKER))
}

/// Read-only cross-record context for a validation pass: which items own at
/// least one placeholder media, and which items have media at all.
#[derive(Debug, Default, Clone)]
pub struct PrivacyContext {
    placeholder_items: HashSet<u64>,
    items_with_media: HashSet<u64>,
}

impl PrivacyContext {
    /// First pass: scan all media, grouped by parent item.
    pub fn from_media(media: &[Record]) -> Self {
        let mut ctx = Self::default();
        for record in media {
            let Some(parent) = record.parent_item else {
                continue;
            };
            ctx.items_with_media.insert(parent);
            if has_placeholder_media(record) {
                ctx.placeholder_items.insert(parent);
            }
        }
        ctx
    }

    pub fn item_has_placeholder(&self, item_id: u64) -> bool {
        self.placeholder_items.contains(&item_id)
    }

    pub fn item_has_media(&self, item_id: u64) -> bool {
        self.items_with_media.contains(&item_id)
    }
}

fn url_in_text_regex() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| {
        Regex::new(r"(?:https?://|ftp://|www\.)\S+").expect("Failed to compile URL regex")
    })
}

/// Record-level validation logic.
///
/// Holds only shared read-only references, so a single engine can be used
/// from many threads at once; each call produces an independent findings
/// list.
pub struct FieldValidationEngine<'a> {
    vocabulary: &'a VocabularyIndex,
}

impl<'a> FieldValidationEngine<'a> {
    pub fn new(vocabulary: &'a VocabularyIndex) -> Self {
        Self { vocabulary }
    }

    /// Validate one record against the schema for its kind.
    ///
    /// Deterministic: two calls with the same inputs produce element-wise
    /// equal findings lists.
    pub fn validate_record(&self, record: &Record, privacy: &PrivacyContext) -> Vec<FieldFinding> {
        let mut findings = Vec::new();

        self.check_title(record, &mut findings);

        for rule in schema::rules_for(record.kind) {
            let occurrences = record.fields.get(rule.name);
            let has_content = occurrences.is_some_and(|occ| {
                occ.iter().any(|value| !value.value.trim().is_empty())
            });

            if !has_content {
                match rule.requirement {
                    Requirement::Required => findings.push(FieldFinding::new(
                        record,
                        rule.name,
                        None,
                        Severity::Error,
                        "Field is required".to_string(),
                    )),
                    Requirement::Recommended => findings.push(FieldFinding::new(
                        record,
                        rule.name,
                        None,
                        Severity::Warning,
                        format!("Missing {}", rule.name),
                    )),
                    Requirement::Optional => {}
                }
            }

            let Some(occurrences) = occurrences else {
                continue;
            };
            for (index, occurrence) in occurrences.iter().enumerate() {
                let value = occurrence.value.trim();
                if value.is_empty() {
                    continue;
                }
                if let Some(semantic) = rule.semantic {
                    self.check_vocabulary(record, rule.name, index, semantic, value, &mut findings);
                }
                match occurrence.kind {
                    ValueKind::Uri => {
                        self.check_uri_form(record, rule.name, index, value, &mut findings)
                    }
                    // License values are URLs by definition and already
                    // vocabulary-checked, so they are exempt from the
                    // URL-in-literal warning.
                    ValueKind::Literal if rule.semantic != Some(SemanticType::License) => {
                        self.check_url_in_literal(record, rule.name, index, value, &mut findings)
                    }
                    ValueKind::Literal => {}
                }
            }
        }

        self.check_thumbnails(record, privacy, &mut findings);

        if record.kind == ResourceKind::Item && privacy.item_has_placeholder(record.id) {
            findings.push(FieldFinding::new(
                record,
                "o:is_public",
                None,
                Severity::Warning,
                "Item inherits private flag from placeholder media".to_string(),
            ));
        }

        findings
    }

    /// Field names present on the record but not declared in its schema.
    /// These are tolerated superset data: recorded, never rejected.
    pub fn unexpected_fields(&self, record: &Record) -> Vec<String> {
        record
            .fields
            .keys()
            .filter(|name| !schema::is_declared(record.kind, name))
            .cloned()
            .collect()
    }

    fn check_title(&self, record: &Record, findings: &mut Vec<FieldFinding>) {
        let missing = record
            .title
            .as_deref()
            .map(|t| t.trim().is_empty())
            .unwrap_or(true);
        if missing {
            findings.push(FieldFinding::new(
                record,
                "o:title",
                None,
                Severity::Error,
                "Field is required".to_string(),
            ));
        }
    }

    fn check_vocabulary(
        &self,
        record: &Record,
        field_name: &str,
        index: usize,
        semantic: SemanticType,
        value: &str,
        findings: &mut Vec<FieldFinding>,
    ) {
        let (valid, message) = match semantic {
            SemanticType::Era => (
                self.vocabulary.is_valid_era(value),
                format!("Value must be from Era vocabulary: {value}"),
            ),
            SemanticType::MediaType => (
                self.vocabulary.is_valid_media_type(value),
                format!("Value must be from media type vocabulary: {value}"),
            ),
            SemanticType::License => (
                self.vocabulary.is_valid_license(value),
                format!("Invalid license URI: {value}"),
            ),
            SemanticType::Language => (
                self.vocabulary.is_valid_language(value),
                format!("Invalid language code (must be a two-letter ISO 639-1 code): {value}"),
            ),
            SemanticType::Classification => {
                // Free-text subjects are allowed; only values that look like
                // a notation (leading digit) are checked.
                if !value.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    return;
                }
                (
                    self.vocabulary.is_valid_classification(value),
                    format!("Invalid classification notation: {value}"),
                )
            }
        };
        if !valid {
            findings.push(FieldFinding::new(
                record,
                field_name,
                Some(index),
                Severity::Error,
                message,
            ));
        }
    }

    fn check_uri_form(
        &self,
        record: &Record,
        field_name: &str,
        index: usize,
        value: &str,
        findings: &mut Vec<FieldFinding>,
    ) {
        if !(value.starts_with("http://") || value.starts_with("https://")) {
            findings.push(FieldFinding::new(
                record,
                field_name,
                Some(index),
                Severity::Error,
                format!("URI must start with http:// or https://: {value}"),
            ));
        }
    }

    fn check_url_in_literal(
        &self,
        record: &Record,
        field_name: &str,
        index: usize,
        value: &str,
        findings: &mut Vec<FieldFinding>,
    ) {
        for matched in url_in_text_regex().find_iter(value) {
            findings.push(FieldFinding::new(
                record,
                field_name,
                Some(index),
                Severity::Warning,
                format!("Literal field contains URL: {}", matched.as_str()),
            ));
        }
    }

    fn check_thumbnails(
        &self,
        record: &Record,
        privacy: &PrivacyContext,
        findings: &mut Vec<FieldFinding>,
    ) {
        let has_media = match record.kind {
            ResourceKind::Item => record.has_media_refs || privacy.item_has_media(record.id),
            ResourceKind::Media => record.has_media_refs,
        };
        if !record.has_thumbnails && !has_media {
            findings.push(FieldFinding::new(
                record,
                "thumbnail_display_urls",
                None,
                Severity::Warning,
                "Missing thumbnails (large, medium, small) or media".to_string(),
            ));
        }
    }
}

/// Aggregation of findings across a whole validation run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub items_validated: usize,
    pub items_valid: usize,
    pub items_invalid: usize,
    pub media_validated: usize,
    pub media_valid: usize,
    pub media_invalid: usize,
    pub findings: Vec<FieldFinding>,
    /// Census of undeclared field names seen, with occurrence counts.
    pub unexpected_fields: BTreeMap<String, usize>,
}

impl ValidationReport {
    /// Derive counts from the findings list so the two can never disagree.
    fn build(
        items: &[Record],
        media: &[Record],
        findings: Vec<FieldFinding>,
        unexpected_fields: BTreeMap<String, usize>,
    ) -> Self {
        let mut invalid: HashSet<(ResourceKind, u64)> = HashSet::new();
        for finding in &findings {
            if finding.severity == Severity::Error {
                invalid.insert((finding.resource_kind, finding.resource_id));
            }
        }
        let items_invalid = items
            .iter()
            .filter(|r| invalid.contains(&(ResourceKind::Item, r.id)))
            .count();
        let media_invalid = media
            .iter()
            .filter(|r| invalid.contains(&(ResourceKind::Media, r.id)))
            .count();

        Self {
            items_validated: items.len(),
            items_valid: items.len() - items_invalid,
            items_invalid,
            media_validated: media.len(),
            media_valid: media.len() - media_invalid,
            media_invalid,
            findings,
            unexpected_fields,
        }
    }

    /// Fold in findings produced outside the batch pass (URI checks, fetch
    /// degradations) and recompute the per-kind invalid counts.
    pub fn merge_findings(
        &mut self,
        extra: Vec<FieldFinding>,
        items: &[Record],
        media: &[Record],
    ) {
        self.findings.extend(extra);
        let mut invalid: HashSet<(ResourceKind, u64)> = HashSet::new();
        for finding in &self.findings {
            if finding.severity == Severity::Error {
                invalid.insert((finding.resource_kind, finding.resource_id));
            }
        }
        self.items_invalid = items
            .iter()
            .filter(|r| invalid.contains(&(ResourceKind::Item, r.id)))
            .count();
        self.items_valid = self.items_validated - self.items_invalid;
        self.media_invalid = media
            .iter()
            .filter(|r| invalid.contains(&(ResourceKind::Media, r.id)))
            .count();
        self.media_valid = self.media_validated - self.media_invalid;
    }

    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn errors(&self) -> impl Iterator<Item = &FieldFinding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &FieldFinding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }
}

/// Two-pass batch orchestration: build the cross-record privacy context,
/// then run the pure per-record engine, then the cross-record duplicate and
/// no-media checks.
pub struct ValidationRun<'a> {
    engine: FieldValidationEngine<'a>,
}

impl<'a> ValidationRun<'a> {
    pub fn new(vocabulary: &'a VocabularyIndex) -> Self {
        Self {
            engine: FieldValidationEngine::new(vocabulary),
        }
    }

    pub fn engine(&self) -> &FieldValidationEngine<'a> {
        &self.engine
    }

    pub fn validate_batch(&self, items: &[Record], media: &[Record]) -> ValidationReport {
        let privacy = PrivacyContext::from_media(media);

        let mut findings = Vec::new();
        let mut unexpected: BTreeMap<String, usize> = BTreeMap::new();

        for record in items.iter().chain(media.iter()) {
            findings.extend(self.engine.validate_record(record, &privacy));
            for name in self.engine.unexpected_fields(record) {
                *unexpected.entry(name).or_insert(0) += 1;
            }
        }

        for record in items {
            if !record.has_media_refs && !privacy.item_has_media(record.id) {
                findings.push(FieldFinding {
                    resource_kind: ResourceKind::Item,
                    resource_id: record.id,
                    field_name: "o:media".to_string(),
                    occurrence_index: None,
                    severity: Severity::Warning,
                    message: "No media/children found for this item".to_string(),
                });
            }
        }

        findings.extend(duplicate_identifier_findings(items));
        findings.extend(duplicate_identifier_findings(media));

        ValidationReport::build(items, media, findings, unexpected)
    }
}

/// First non-empty `dcterms:identifier` value of a record.
fn identifier_value(record: &Record) -> Option<&str> {
    record
        .fields
        .get("dcterms:identifier")?
        .iter()
        .map(|occ| occ.value.trim())
        .find(|v| !v.is_empty())
}

/// Every participant in a duplicate-identifier group gets an error finding.
fn duplicate_identifier_findings(records: &[Record]) -> Vec<FieldFinding> {
    let mut by_identifier: HashMap<&str, Vec<&Record>> = HashMap::new();
    for record in records {
        if let Some(identifier) = identifier_value(record) {
            by_identifier.entry(identifier).or_default().push(record);
        }
    }

    let mut findings = Vec::new();
    let mut groups: Vec<_> = by_identifier
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .collect();
    groups.sort_by_key(|(identifier, _)| identifier.to_string());

    for (identifier, group) in groups {
        let ids: Vec<u64> = group.iter().map(|r| r.id).collect();
        for record in group {
            findings.push(FieldFinding {
                resource_kind: record.kind,
                resource_id: record.id,
                field_name: "dcterms:identifier".to_string(),
                occurrence_index: None,
                severity: Severity::Error,
                message: format!("Duplicate identifier '{identifier}' found in: {ids:?}"),
            });
        }
    }
    findings
}
