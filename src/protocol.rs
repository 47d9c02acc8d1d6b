//! Reconciliation Service API wire types.
//!
//! Field names here are part of an external protocol and are matched
//! verbatim by clients; rename with care.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::graph::SkosPattern;

// ---------------------------------------------------------------------------
// Shared records
// ---------------------------------------------------------------------------

/// An `{id, name}` pair: a type, a notable type, or a linked entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub name: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate search
// ---------------------------------------------------------------------------

/// Type restriction of a query: a single URI or a list (first one wins).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TypeFilter {
    One(String),
    Many(Vec<String>),
}

impl TypeFilter {
    pub fn first(&self) -> Option<&str> {
        let first = match self {
            TypeFilter::One(t) => Some(t.as_str()),
            TypeFilter::Many(ts) => ts.first().map(String::as_str),
        };
        first.filter(|t| !t.is_empty())
    }
}

/// One query of a batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReconciliationQuery {
    pub query: String,
    #[serde(rename = "type", default)]
    pub type_filter: Option<TypeFilter>,
    #[serde(default, deserialize_with = "lenient_limit")]
    pub limit: Option<usize>,
}

/// The `queries` payload: client key → query.
pub type BatchQueries = BTreeMap<String, ReconciliationQuery>;

/// One proposed match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub score: u32,
    #[serde(rename = "match")]
    pub is_exact_match: bool,
    #[serde(rename = "type")]
    pub types: Vec<EntityRef>,
}

/// Results for one batch key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub result: Vec<Candidate>,
}

pub type BatchResults = BTreeMap<String, QueryResult>;

// ---------------------------------------------------------------------------
// Suggest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub id: String,
    pub name: String,
    pub notable: Vec<EntityRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestResponse {
    pub result: Vec<Suggestion>,
}

// ---------------------------------------------------------------------------
// Properties and extension
// ---------------------------------------------------------------------------

/// Extension properties the service offers, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyId {
    Uri,
    Narrower,
    Broader,
    AltLabel,
    PrefLabel,
}

impl PropertyId {
    pub const CATALOG: [PropertyId; 5] = [
        PropertyId::Uri,
        PropertyId::Narrower,
        PropertyId::Broader,
        PropertyId::AltLabel,
        PropertyId::PrefLabel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyId::Uri => "uri",
            PropertyId::Narrower => "narrower",
            PropertyId::Broader => "broader",
            PropertyId::AltLabel => "altLabel",
            PropertyId::PrefLabel => "prefLabel",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PropertyId::Uri => "URI",
            PropertyId::Narrower => "Narrower concepts",
            PropertyId::Broader => "Broader concepts",
            PropertyId::AltLabel => "Alternative labels",
            // Labels in every language except the active one.
            PropertyId::PrefLabel => "Preferred labels in other languages",
        }
    }

    /// Parse a wire id; unknown ids yield `None`.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::CATALOG.into_iter().find(|p| p.as_str() == id)
    }

    /// Graph pattern backing this property; `None` when no lookup is needed.
    pub fn pattern(self) -> Option<SkosPattern> {
        match self {
            PropertyId::Uri => None,
            PropertyId::Narrower => Some(SkosPattern::Narrower),
            PropertyId::Broader => Some(SkosPattern::Broader),
            PropertyId::AltLabel => Some(SkosPattern::AltLabels),
            PropertyId::PrefLabel => Some(SkosPattern::OtherPrefLabels),
        }
    }

    pub fn descriptor(self) -> PropertyDescriptor {
        PropertyDescriptor {
            id: self.as_str().to_string(),
            name: self.name().to_string(),
        }
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{id, name}` of an offered property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDescriptor {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PropertySettings {
    #[serde(default, deserialize_with = "lenient_limit")]
    pub limit: Option<usize>,
}

/// A property requested in an extend payload. The id is kept as sent so
/// that unknown ids can be skipped rather than rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyRequest {
    pub id: String,
    #[serde(default)]
    pub settings: Option<PropertySettings>,
}

impl PropertyRequest {
    pub fn limit(&self) -> Option<usize> {
        self.settings.as_ref().and_then(|s| s.limit)
    }
}

/// The `extend` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtendRequest {
    pub ids: Vec<String>,
    pub properties: Vec<PropertyRequest>,
}

/// One value of an extended property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ValueRecord {
    Literal {
        #[serde(rename = "str")]
        text: String,
    },
    Entity(EntityRef),
}

impl ValueRecord {
    pub fn literal(text: impl Into<String>) -> Self {
        ValueRecord::Literal { text: text.into() }
    }

    pub fn entity(id: impl Into<String>, name: impl Into<String>) -> Self {
        ValueRecord::Entity(EntityRef::new(id, name))
    }
}

/// Property id → values, for one entity.
pub type ExtensionRow = BTreeMap<String, Vec<ValueRecord>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionResult {
    pub meta: Vec<PropertyDescriptor>,
    pub rows: BTreeMap<String, ExtensionRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposeResponse {
    #[serde(rename = "type")]
    pub type_id: Option<String>,
    pub properties: Vec<PropertyDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Service metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceMetadata {
    pub name: String,
    #[serde(rename = "identifierSpace")]
    pub identifier_space: String,
    #[serde(rename = "schemaSpace")]
    pub schema_space: String,
    #[serde(rename = "defaultTypes")]
    pub default_types: Vec<EntityRef>,
    pub view: ViewSpec,
    pub preview: PreviewSpec,
    pub suggest: SuggestSpec,
    pub extend: ExtendSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSpec {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewSpec {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceEndpoint {
    pub service_url: String,
    pub service_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestSpec {
    pub entity: ServiceEndpoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendSpec {
    pub propose_properties: ServiceEndpoint,
    pub property_settings: Vec<PropertySetting>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySetting {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub default: u64,
    pub help_text: String,
}

impl PropertySetting {
    /// The per-property value limit.
    pub fn limit() -> Self {
        Self {
            name: "limit".into(),
            label: "Limit".into(),
            kind: "number".into(),
            default: 10,
            help_text: "Maximum number of values to return per row".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient numbers
// ---------------------------------------------------------------------------

/// Accept a non-negative limit as a JSON integer, a decimal string, or null.
/// Form-driven clients send settings as strings.
fn lenient_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(n)) => usize::try_from(n).map(Some).map_err(de::Error::custom),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid limit \"{s}\""))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn catalog_order_and_round_trip_ids() {
        let ids: Vec<_> = PropertyId::CATALOG.iter().map(|p| p.as_str()).collect();
        assert_eq!(ids, vec!["uri", "narrower", "broader", "altLabel", "prefLabel"]);
        for p in PropertyId::CATALOG {
            assert_eq!(PropertyId::from_id(p.as_str()), Some(p));
        }
        assert_eq!(PropertyId::from_id("fooBar"), None);
        assert_eq!(PropertyId::from_id("PrefLabel"), None);
        assert!(PropertyId::Uri < PropertyId::PrefLabel);
    }

    #[test]
    fn candidate_wire_names() {
        let c = Candidate {
            id: "http://www.yso.fi/onto/yso/p1".into(),
            name: "cats".into(),
            score: 1,
            is_exact_match: true,
            types: vec![EntityRef::new("t", "t")],
        };
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["match"], json!(true));
        assert_eq!(v["type"][0]["id"], json!("t"));
        assert_eq!(v["score"], json!(1));
        assert!(serde_json::to_string(&c).unwrap().contains(r#""score":1,"#));
    }

    #[test]
    fn value_records_serialize_by_variant() {
        assert_eq!(
            serde_json::to_value(ValueRecord::literal("kissat")).unwrap(),
            json!({"str": "kissat"})
        );
        assert_eq!(
            serde_json::to_value(ValueRecord::entity("http://x/p2", "pets")).unwrap(),
            json!({"id": "http://x/p2", "name": "pets"})
        );
    }

    #[test]
    fn query_accepts_type_string_or_list() {
        let q: ReconciliationQuery =
            serde_json::from_str(r#"{"query":"cats","type":"skos:Concept","limit":"5"}"#).unwrap();
        assert_eq!(q.type_filter.as_ref().and_then(TypeFilter::first), Some("skos:Concept"));
        assert_eq!(q.limit, Some(5));

        let q: ReconciliationQuery =
            serde_json::from_str(r#"{"query":"cats","type":["a","b"],"type_strict":"any"}"#)
                .unwrap();
        assert_eq!(q.type_filter.as_ref().and_then(TypeFilter::first), Some("a"));
        assert_eq!(q.limit, None);

        assert!(serde_json::from_str::<ReconciliationQuery>(r#"{"type":"x"}"#).is_err());
    }

    #[test]
    fn settings_limit_is_lenient_but_not_sloppy() {
        let p: PropertyRequest =
            serde_json::from_str(r#"{"id":"broader","settings":{"limit":"3"}}"#).unwrap();
        assert_eq!(p.limit(), Some(3));

        let p: PropertyRequest =
            serde_json::from_str(r#"{"id":"broader","settings":{"limit":0}}"#).unwrap();
        assert_eq!(p.limit(), Some(0));

        let p: PropertyRequest = serde_json::from_str(r#"{"id":"broader"}"#).unwrap();
        assert_eq!(p.limit(), None);

        assert!(
            serde_json::from_str::<PropertyRequest>(r#"{"id":"x","settings":{"limit":-1}}"#)
                .is_err()
        );
        assert!(
            serde_json::from_str::<PropertyRequest>(r#"{"id":"x","settings":{"limit":"lots"}}"#)
                .is_err()
        );
    }

    #[test]
    fn propose_response_echoes_limit_only_when_given() {
        let without = ProposeResponse {
            type_id: Some("skos:Concept".into()),
            properties: vec![],
            limit: None,
        };
        assert!(serde_json::to_value(&without).unwrap().get("limit").is_none());

        let with = ProposeResponse { limit: Some(2), ..without };
        assert_eq!(serde_json::to_value(&with).unwrap()["limit"], json!(2));
    }
}
