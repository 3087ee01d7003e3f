//! Field schema tables
//!
//! Fixed, per-resource-kind tables declaring which property fields are
//! validated and how: requirement level and, where applicable, the
//! controlled vocabulary backing the field. Fields outside these tables are
//! tolerated as superset data and only recorded, never rejected.

use crate::model::ResourceKind;

/// How strongly a field is expected on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Absent or content-free occurrences are an error.
    Required,
    /// Absence is a warning.
    Recommended,
    /// Only validated when present.
    Optional,
}

/// Controlled vocabulary backing a field's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    Era,
    MediaType,
    License,
    Language,
    Classification,
}

/// One declared field and its rules.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub requirement: Requirement,
    pub semantic: Option<SemanticType>,
}

const fn rule(
    name: &'static str,
    requirement: Requirement,
    semantic: Option<SemanticType>,
) -> FieldRule {
    FieldRule {
        name,
        requirement,
        semantic,
    }
}

const ITEM_RULES: &[FieldRule] = &[
    rule("dcterms:identifier", Requirement::Required, None),
    rule("dcterms:title", Requirement::Required, None),
    rule("dcterms:description", Requirement::Required, None),
    rule(
        "dcterms:temporal",
        Requirement::Required,
        Some(SemanticType::Era),
    ),
    rule(
        "dcterms:language",
        Requirement::Recommended,
        Some(SemanticType::Language),
    ),
    rule("dcterms:isPartOf", Requirement::Recommended, None),
    rule(
        "dcterms:subject",
        Requirement::Optional,
        Some(SemanticType::Classification),
    ),
    rule(
        "dcterms:format",
        Requirement::Optional,
        Some(SemanticType::MediaType),
    ),
    rule(
        "dcterms:license",
        Requirement::Optional,
        Some(SemanticType::License),
    ),
];

const MEDIA_RULES: &[FieldRule] = &[
    rule("dcterms:identifier", Requirement::Required, None),
    rule("dcterms:title", Requirement::Required, None),
    rule("dcterms:description", Requirement::Required, None),
    rule("dcterms:rights", Requirement::Required, None),
    rule(
        "dcterms:license",
        Requirement::Required,
        Some(SemanticType::License),
    ),
    rule("dcterms:creator", Requirement::Recommended, None),
    rule("dcterms:publisher", Requirement::Recommended, None),
    rule(
        "dcterms:temporal",
        Requirement::Recommended,
        Some(SemanticType::Era),
    ),
    rule("dcterms:type", Requirement::Recommended, None),
    rule(
        "dcterms:format",
        Requirement::Recommended,
        Some(SemanticType::MediaType),
    ),
    rule("dcterms:extent", Requirement::Recommended, None),
    rule("dcterms:source", Requirement::Recommended, None),
    rule(
        "dcterms:language",
        Requirement::Recommended,
        Some(SemanticType::Language),
    ),
    rule(
        "dcterms:subject",
        Requirement::Optional,
        Some(SemanticType::Classification),
    ),
    rule("dcterms:date", Requirement::Optional, None),
    rule("dcterms:relation", Requirement::Optional, None),
];

/// The declared rules for one resource kind.
pub fn rules_for(kind: ResourceKind) -> &'static [FieldRule] {
    match kind {
        ResourceKind::Item => ITEM_RULES,
        ResourceKind::Media => MEDIA_RULES,
    }
}

/// Whether a field name is declared in the schema for `kind`.
pub fn is_declared(kind: ResourceKind, field_name: &str) -> bool {
    rules_for(kind).iter().any(|r| r.name == field_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_required_fields() {
        let required: Vec<_> = rules_for(ResourceKind::Item)
            .iter()
            .filter(|r| r.requirement == Requirement::Required)
            .map(|r| r.name)
            .collect();
        assert_eq!(
            required,
            vec![
                "dcterms:identifier",
                "dcterms:title",
                "dcterms:description",
                "dcterms:temporal"
            ]
        );
    }

    #[test]
    fn test_media_requires_rights_and_license() {
        assert!(
            rules_for(ResourceKind::Media)
                .iter()
                .any(|r| r.name == "dcterms:rights" && r.requirement == Requirement::Required)
        );
        assert!(
            rules_for(ResourceKind::Media)
                .iter()
                .any(|r| r.name == "dcterms:license" && r.requirement == Requirement::Required)
        );
    }

    #[test]
    fn test_no_duplicate_rules() {
        for kind in [ResourceKind::Item, ResourceKind::Media] {
            let rules = rules_for(kind);
            for rule in rules {
                assert_eq!(
                    rules.iter().filter(|r| r.name == rule.name).count(),
                    1,
                    "duplicate rule for {}",
                    rule.name
                );
            }
        }
    }

    #[test]
    fn test_undeclared_field_not_in_schema() {
        assert!(!is_declared(ResourceKind::Item, "dcterms:spatial"));
        assert!(is_declared(ResourceKind::Item, "dcterms:subject"));
        assert!(!is_declared(ResourceKind::Item, "dcterms:rights"));
        assert!(is_declared(ResourceKind::Media, "dcterms:rights"));
    }
}
