//! Controlled-vocabulary index
//!
//! Single source of truth for membership in the five controlled
//! vocabularies: era labels, internet media types, license identifiers,
//! classification notations and language codes. The index is built once at
//! startup from a JSON dataset, is immutable afterwards, and is safe to
//! share across threads. Every membership check is an O(1) hash probe.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::VocabularyLoadError;
use crate::iso639;
use crate::notation::ClassificationNotation;

/// One named section of the vocabulary dataset: a label and its flat list of
/// canonical terms.
#[derive(Debug, Clone, Deserialize)]
pub struct VocabularySection {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub terms: Vec<String>,
}

/// A named, immutable set of valid keys for one controlled vocabulary.
#[derive(Debug, Clone)]
pub struct VocabularySet {
    name: &'static str,
    members: HashSet<String>,
    case_insensitive: bool,
}

impl VocabularySet {
    fn new(name: &'static str, case_insensitive: bool) -> Self {
        Self {
            name,
            members: HashSet::new(),
            case_insensitive,
        }
    }

    fn normalize(&self, value: &str) -> String {
        if self.case_insensitive {
            value.to_lowercase()
        } else {
            value.to_string()
        }
    }

    fn insert(&mut self, term: &str) {
        let normalized = self.normalize(term.trim());
        if !normalized.is_empty() {
            self.members.insert(normalized);
        }
    }

    /// O(1) membership check. Empty input is never a member.
    pub fn contains(&self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        self.members.contains(&self.normalize(value))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Immutable index over all controlled vocabularies.
///
/// Constructed once before any validation begins and passed by reference
/// into every component that needs it; no global state.
#[derive(Debug, Clone)]
pub struct VocabularyIndex {
    eras: VocabularySet,
    media_types: VocabularySet,
    licenses: VocabularySet,
    classifications: VocabularySet,
    languages: VocabularySet,
}

/// Dataset section labels, matched by substring as in the source dataset.
mod section {
    pub const ERAS: &str = "Epoche";
    pub const MEDIA_TYPES: &str = "Media Type";
    pub const LICENSES: &str = "Licenses";
    pub const CLASSIFICATIONS: &str = "Iconclass";
    pub const LANGUAGES: &str = "Languages";
}

impl VocabularyIndex {
    /// Load the index from a JSON dataset file.
    ///
    /// The dataset is an array of `{ "label": ..., "terms": [...] }`
    /// sections. Fails if the file is missing or unreadable, the JSON is
    /// malformed, or any of the five sections is absent; partial loads are
    /// not permitted.
    pub fn load(path: &Path) -> Result<Self, VocabularyLoadError> {
        if !path.exists() {
            return Err(VocabularyLoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| VocabularyLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let sections: Vec<VocabularySection> = serde_json::from_str(&raw)?;
        Self::from_sections(&sections)
    }

    /// Build the index from already-parsed dataset sections.
    pub fn from_sections(sections: &[VocabularySection]) -> Result<Self, VocabularyLoadError> {
        let mut eras = VocabularySet::new("eras", true);
        let mut media_types = VocabularySet::new("media_types", true);
        let mut licenses = VocabularySet::new("licenses", true);
        let mut classifications = VocabularySet::new("classifications", false);
        let mut languages = VocabularySet::new("languages", true);

        let mut seen: HashSet<&'static str> = HashSet::new();

        for sec in sections {
            if sec.label.contains(section::ERAS) {
                seen.insert(section::ERAS);
                for term in &sec.terms {
                    eras.insert(term);
                }
            } else if sec.label.contains(section::MEDIA_TYPES) {
                seen.insert(section::MEDIA_TYPES);
                for term in &sec.terms {
                    media_types.insert(term);
                }
            } else if sec.label.contains(section::LICENSES) {
                seen.insert(section::LICENSES);
                for term in &sec.terms {
                    licenses.insert(term);
                }
            } else if sec.label.contains(section::CLASSIFICATIONS) {
                seen.insert(section::CLASSIFICATIONS);
                for term in &sec.terms {
                    // Dataset terms are "CODE|description"; only the code
                    // part is a member.
                    if let Some(code) = term.split('|').next() {
                        classifications.insert(code);
                    }
                }
            } else if sec.label.contains(section::LANGUAGES) {
                seen.insert(section::LANGUAGES);
                for term in &sec.terms {
                    languages.insert(term);
                }
            }
        }

        for required in [
            section::ERAS,
            section::MEDIA_TYPES,
            section::LICENSES,
            section::CLASSIFICATIONS,
            section::LANGUAGES,
        ] {
            if !seen.contains(required) {
                return Err(VocabularyLoadError::MissingSection { section: required });
            }
        }

        Ok(Self {
            eras,
            media_types,
            licenses,
            classifications,
            languages,
        })
    }

    pub fn is_valid_era(&self, value: &str) -> bool {
        self.eras.contains(value)
    }

    pub fn is_valid_media_type(&self, value: &str) -> bool {
        self.media_types.contains(value)
    }

    pub fn is_valid_license(&self, value: &str) -> bool {
        self.licenses.contains(value)
    }

    /// The dataset may omit standard codes; the fixed ISO 639-1 enumeration
    /// is always accepted as a secondary source.
    pub fn is_valid_language(&self, value: &str) -> bool {
        self.languages.contains(value) || iso639::is_iso639_1(value)
    }

    /// Check a classification notation: structural validation first, then
    /// case-sensitive membership of the canonical form, falling back to the
    /// hierarchical parts. Structural invalidity means the value simply is
    /// not in the vocabulary; this never fails.
    pub fn is_valid_classification(&self, value: &str) -> bool {
        let notation = match ClassificationNotation::validate(value) {
            Ok(notation) => notation,
            Err(_) => return false,
        };
        if self.classifications.contains(notation.canonical()) {
            return true;
        }
        notation
            .parts()
            .iter()
            .any(|part| self.classifications.contains(part))
    }

    pub fn classifications(&self) -> &VocabularySet {
        &self.classifications
    }
}
