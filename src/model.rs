//! Record data model for items and media
//!
//! Deserializes the content-management API's JSON-LD payloads into typed
//! records and normalizes them into the flat field view the validation
//! engine consumes. Each property occurrence is tagged with an explicit
//! [`ValueKind`] at ingestion time; the engine dispatches on that tag
//! instead of re-inspecting type strings.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The two record types being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Item,
    Media,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Item => write!(f, "Item"),
            ResourceKind::Media => write!(f, "Media"),
        }
    }
}

/// Value-type discriminator of one field occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// Plain text, not meant to hold links.
    Literal,
    /// A URI reference.
    Uri,
}

/// One typed occurrence of a repeatable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub kind: ValueKind,
    pub value: String,
    pub language: Option<String>,
}

impl FieldValue {
    pub fn literal(value: &str) -> Self {
        Self {
            kind: ValueKind::Literal,
            value: value.to_string(),
            language: None,
        }
    }

    pub fn uri(value: &str) -> Self {
        Self {
            kind: ValueKind::Uri,
            value: value.to_string(),
            language: None,
        }
    }
}

/// Reference to another API resource.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
    #[serde(rename = "o:id", default)]
    pub o_id: Option<u64>,
}

/// Raw property occurrence as delivered by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyValue {
    #[serde(rename = "type", default)]
    pub value_type: String,
    #[serde(rename = "@value", default)]
    pub value: Option<String>,
    #[serde(rename = "@id", default)]
    pub id: Option<String>,
    #[serde(rename = "@language", default)]
    pub language: Option<String>,
}

impl From<PropertyValue> for FieldValue {
    fn from(prop: PropertyValue) -> Self {
        let is_uri = prop.value_type == "uri" || (prop.value.is_none() && prop.id.is_some());
        if is_uri {
            FieldValue {
                kind: ValueKind::Uri,
                value: prop.id.or(prop.value).unwrap_or_default(),
                language: prop.language,
            }
        } else {
            FieldValue {
                kind: ValueKind::Literal,
                value: prop.value.unwrap_or_default(),
                language: prop.language,
            }
        }
    }
}

/// An item as delivered by the API. Unknown keys land in `extra`; the
/// `dcterms:` entries among them are the validated property fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRecord {
    #[serde(rename = "o:id")]
    pub id: u64,
    #[serde(rename = "o:title", default)]
    pub title: Option<String>,
    #[serde(rename = "o:is_public", default)]
    pub is_public: bool,
    #[serde(rename = "thumbnail_display_urls", default)]
    pub thumbnails: Option<BTreeMap<String, Value>>,
    #[serde(rename = "o:media", default)]
    pub media: Vec<ResourceRef>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A media resource as delivered by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaRecord {
    #[serde(rename = "o:id")]
    pub id: u64,
    #[serde(rename = "o:title", default)]
    pub title: Option<String>,
    #[serde(rename = "o:is_public", default)]
    pub is_public: bool,
    #[serde(rename = "o:filename", default)]
    pub filename: Option<String>,
    #[serde(rename = "o:item", default)]
    pub item: Option<ResourceRef>,
    #[serde(rename = "o:media_type", default)]
    pub media_type: Option<String>,
    #[serde(rename = "o:original_url", default)]
    pub original_url: Option<String>,
    #[serde(rename = "thumbnail_display_urls", default)]
    pub thumbnails: Option<BTreeMap<String, Value>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Normalized record view consumed by the validation engine: identity,
/// a handful of administrative flags, and the typed field map.
#[derive(Debug, Clone)]
pub struct Record {
    pub kind: ResourceKind,
    pub id: u64,
    pub title: Option<String>,
    pub is_public: bool,
    pub has_thumbnails: bool,
    pub has_media_refs: bool,
    pub filename: Option<String>,
    pub parent_item: Option<u64>,
    pub fields: BTreeMap<String, Vec<FieldValue>>,
}

impl Record {
    pub fn from_item(item: &ItemRecord) -> Self {
        Self {
            kind: ResourceKind::Item,
            id: item.id,
            title: item.title.clone(),
            is_public: item.is_public,
            has_thumbnails: has_any_thumbnail(item.thumbnails.as_ref()),
            has_media_refs: !item.media.is_empty(),
            filename: None,
            parent_item: None,
            fields: extract_fields(&item.extra),
        }
    }

    pub fn from_media(media: &MediaRecord) -> Self {
        Self {
            kind: ResourceKind::Media,
            id: media.id,
            title: media.title.clone(),
            is_public: media.is_public,
            has_thumbnails: has_any_thumbnail(media.thumbnails.as_ref()),
            has_media_refs: media.original_url.is_some(),
            filename: media.filename.clone(),
            parent_item: media.item.as_ref().and_then(|r| r.o_id),
            fields: extract_fields(&media.extra),
        }
    }

    /// Deserialize and normalize an item payload in one step.
    pub fn item_from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let item: ItemRecord = serde_json::from_value(value.clone())?;
        Ok(Self::from_item(&item))
    }

    /// Deserialize and normalize a media payload in one step.
    pub fn media_from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let media: MediaRecord = serde_json::from_value(value.clone())?;
        Ok(Self::from_media(&media))
    }
}

fn has_any_thumbnail(thumbnails: Option<&BTreeMap<String, Value>>) -> bool {
    let Some(map) = thumbnails else {
        return false;
    };
    ["large", "medium", "small"].iter().any(|size| {
        map.get(*size)
            .and_then(Value::as_str)
            .is_some_and(|url| !url.is_empty())
    })
}

/// Pull the `dcterms:` property lists out of the flattened extras.
/// Non-array values and unparsable occurrences are skipped, not rejected;
/// the engine reports absent required fields regardless.
fn extract_fields(extra: &BTreeMap<String, Value>) -> BTreeMap<String, Vec<FieldValue>> {
    let mut fields = BTreeMap::new();
    for (key, value) in extra {
        if !key.starts_with("dcterms:") {
            continue;
        }
        let Some(list) = value.as_array() else {
            continue;
        };
        let occurrences: Vec<FieldValue> = list
            .iter()
            .filter_map(|entry| serde_json::from_value::<PropertyValue>(entry.clone()).ok())
            .map(FieldValue::from)
            .collect();
        fields.insert(key.clone(), occurrences);
    }
    fields
}
