//! Vocabulary API access.
//!
//! [`VocabularySource`] is the seam between the protocol engine and the
//! remote vocabulary service. [`client::VocabularyClient`] implements it over
//! HTTP; tests substitute in-memory sources.

pub mod client;

use serde::{Deserialize, Serialize};

use crate::error::VocabResult;

pub use client::VocabularyClient;

/// Parameters of a vocabulary search call.
#[derive(Debug, Clone, Copy)]
pub struct SearchQuery<'a> {
    /// Query text, passed through verbatim (wildcards included).
    pub text: &'a str,
    pub lang: &'a str,
    /// Restrict hits to this type URI.
    pub type_filter: Option<&'a str>,
    pub max_hits: Option<usize>,
    /// Collapse multiple label matches of one concept into a single hit.
    pub unique: bool,
}

/// One hit of a vocabulary search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    pub uri: String,
    #[serde(rename = "prefLabel")]
    pub pref_label: String,
    /// Type identifiers in upstream order, possibly prefixed (`skos:Concept`).
    #[serde(rename = "type")]
    pub types: Vec<String>,
}

/// Vocabulary-level metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VocabularyInfo {
    pub title: String,
    #[serde(rename = "conceptschemes")]
    pub concept_schemes: Vec<ConceptSchemeRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConceptSchemeRef {
    pub uri: String,
}

/// A concept type the vocabulary declares.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VocabularyType {
    pub uri: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl VocabularyType {
    /// Display name, falling back to the URI for unlabelled types.
    pub fn name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.uri)
    }
}

/// A concept linked from another one (broader/narrower lookups).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedConcept {
    pub uri: String,
    #[serde(rename = "prefLabel", default, skip_serializing_if = "Option::is_none")]
    pub pref_label: Option<String>,
}

/// Typed access to a remote SKOS vocabulary service.
///
/// Implementations must be safe to share between concurrent requests and
/// must not cache: every call reflects the upstream state at call time.
pub trait VocabularySource: Send + Sync {
    /// Full-text search over concept labels.
    fn search(&self, vocid: &str, query: &SearchQuery<'_>) -> VocabResult<Vec<SearchHit>>;

    /// Vocabulary title and concept schemes.
    fn metadata(&self, vocid: &str, lang: &str) -> VocabResult<VocabularyInfo>;

    /// Concept types declared by the vocabulary.
    fn types(&self, vocid: &str, lang: &str) -> VocabResult<Vec<VocabularyType>>;

    /// RDF/XML description of one entity.
    fn entity_rdf(&self, vocid: &str, uri: &str, lang: &str) -> VocabResult<Vec<u8>>;

    /// Preferred label of one entity, if it has one in `lang`.
    fn label(&self, vocid: &str, uri: &str, lang: &str) -> VocabResult<Option<String>>;

    /// Direct broader concepts.
    fn broader(&self, vocid: &str, uri: &str, lang: &str) -> VocabResult<Vec<RelatedConcept>>;

    /// Direct narrower concepts.
    fn narrower(&self, vocid: &str, uri: &str, lang: &str) -> VocabResult<Vec<RelatedConcept>>;
}

impl<T: VocabularySource + ?Sized> VocabularySource for std::sync::Arc<T> {
    fn search(&self, vocid: &str, query: &SearchQuery<'_>) -> VocabResult<Vec<SearchHit>> {
        (**self).search(vocid, query)
    }

    fn metadata(&self, vocid: &str, lang: &str) -> VocabResult<VocabularyInfo> {
        (**self).metadata(vocid, lang)
    }

    fn types(&self, vocid: &str, lang: &str) -> VocabResult<Vec<VocabularyType>> {
        (**self).types(vocid, lang)
    }

    fn entity_rdf(&self, vocid: &str, uri: &str, lang: &str) -> VocabResult<Vec<u8>> {
        (**self).entity_rdf(vocid, uri, lang)
    }

    fn label(&self, vocid: &str, uri: &str, lang: &str) -> VocabResult<Option<String>> {
        (**self).label(vocid, uri, lang)
    }

    fn broader(&self, vocid: &str, uri: &str, lang: &str) -> VocabResult<Vec<RelatedConcept>> {
        (**self).broader(vocid, uri, lang)
    }

    fn narrower(&self, vocid: &str, uri: &str, lang: &str) -> VocabResult<Vec<RelatedConcept>> {
        (**self).narrower(vocid, uri, lang)
    }
}
