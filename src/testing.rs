//! In-memory vocabulary for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{VocabError, VocabResult};
use crate::graph::skos;
use crate::vocab::{
    ConceptSchemeRef, RelatedConcept, SearchHit, SearchQuery, VocabularyInfo, VocabularySource,
    VocabularyType,
};

pub(crate) const CATS: &str = "http://www.yso.fi/onto/yso/p1";
pub(crate) const PETS: &str = "http://www.yso.fi/onto/yso/p2";

pub(crate) const CATS_RDF: &[u8] = include_bytes!("../tests/fixtures/cats.rdf");
pub(crate) const PETS_RDF: &[u8] = include_bytes!("../tests/fixtures/pets.rdf");

const YSO_META_CONCEPT: &str = "http://www.yso.fi/onto/yso-meta/Concept";

/// A search call as the source received it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedSearch {
    pub text: String,
    pub lang: String,
    pub type_filter: Option<String>,
    pub max_hits: Option<usize>,
    pub unique: bool,
}

pub(crate) struct FakeVocabulary {
    pub hits: Vec<SearchHit>,
    pub rdf: HashMap<String, Vec<u8>>,
    pub info: VocabularyInfo,
    pub types: Vec<VocabularyType>,
    searches: Mutex<Vec<RecordedSearch>>,
    fetches: Mutex<Vec<String>>,
}

fn hit(uri: &str, label: &str, types: &[&str]) -> SearchHit {
    SearchHit {
        uri: uri.to_string(),
        pref_label: label.to_string(),
        types: types.iter().map(|t| t.to_string()).collect(),
    }
}

impl FakeVocabulary {
    fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            rdf: HashMap::new(),
            info: VocabularyInfo {
                title: "YSO - General Finnish ontology".into(),
                concept_schemes: vec![ConceptSchemeRef {
                    uri: "http://www.yso.fi/onto/yso/".into(),
                }],
            },
            types: vec![
                VocabularyType {
                    uri: format!("{}Concept", skos::NAMESPACE),
                    label: Some("Concept".into()),
                },
                VocabularyType {
                    uri: YSO_META_CONCEPT.into(),
                    label: None,
                },
            ],
            searches: Mutex::new(Vec::new()),
            fetches: Mutex::new(Vec::new()),
        }
    }

    /// The cats/pets fixture vocabulary.
    pub fn cats() -> Self {
        let mut vocab = Self::new(vec![
            hit(CATS, "cats", &["skos:Concept", YSO_META_CONCEPT]),
            hit("http://www.yso.fi/onto/yso/p3", "Persian cats", &["skos:Concept"]),
            hit(PETS, "pets", &["skos:Concept", YSO_META_CONCEPT]),
            hit(
                "http://www.yso.fi/onto/yso/p90",
                "Cats (musical)",
                &["http://www.yso.fi/onto/yso-meta/Individual"],
            ),
        ]);
        vocab.rdf.insert(CATS.to_string(), CATS_RDF.to_vec());
        vocab.rdf.insert(PETS.to_string(), PETS_RDF.to_vec());
        vocab
    }

    /// `count` hits labelled `"{prefix} 0"`, `"{prefix} 1"`, ...
    pub fn numbered(prefix: &str, count: usize) -> Self {
        Self::new(
            (0..count)
                .map(|i| {
                    hit(
                        &format!("http://example.org/{prefix}/{i}"),
                        &format!("{prefix} {i}"),
                        &["skos:Concept"],
                    )
                })
                .collect(),
        )
    }

    pub fn search_calls(&self) -> Vec<RecordedSearch> {
        self.searches.lock().unwrap().clone()
    }

    /// Entity URIs whose RDF was requested, in call order.
    pub fn rdf_calls(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    fn not_found(uri: &str) -> VocabError {
        VocabError::Status {
            url: uri.to_string(),
            status: 404,
        }
    }
}

impl VocabularySource for FakeVocabulary {
    fn search(&self, _vocid: &str, query: &SearchQuery<'_>) -> VocabResult<Vec<SearchHit>> {
        self.searches.lock().unwrap().push(RecordedSearch {
            text: query.text.to_string(),
            lang: query.lang.to_string(),
            type_filter: query.type_filter.map(str::to_string),
            max_hits: query.max_hits,
            unique: query.unique,
        });

        let prefix = query.text.trim_end_matches('*').to_lowercase();
        let wanted = query.type_filter.map(skos::expand);
        Ok(self
            .hits
            .iter()
            .filter(|h| h.pref_label.to_lowercase().starts_with(&prefix))
            .filter(|h| match &wanted {
                Some(ty) => h.types.iter().any(|t| skos::expand(t) == *ty),
                None => true,
            })
            .take(query.max_hits.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn metadata(&self, _vocid: &str, _lang: &str) -> VocabResult<VocabularyInfo> {
        Ok(self.info.clone())
    }

    fn types(&self, _vocid: &str, _lang: &str) -> VocabResult<Vec<VocabularyType>> {
        Ok(self.types.clone())
    }

    fn entity_rdf(&self, _vocid: &str, uri: &str, _lang: &str) -> VocabResult<Vec<u8>> {
        self.fetches.lock().unwrap().push(uri.to_string());
        self.rdf.get(uri).cloned().ok_or_else(|| Self::not_found(uri))
    }

    fn label(&self, _vocid: &str, uri: &str, _lang: &str) -> VocabResult<Option<String>> {
        Ok(self
            .hits
            .iter()
            .find(|h| h.uri == uri)
            .map(|h| h.pref_label.clone()))
    }

    // The engine reads relations from entity RDF; these lookups only serve the CLI.
    fn broader(
        &self,
        _vocid: &str,
        _uri: &str,
        _lang: &str,
    ) -> VocabResult<Vec<RelatedConcept>> {
        Ok(Vec::new())
    }

    fn narrower(
        &self,
        _vocid: &str,
        _uri: &str,
        _lang: &str,
    ) -> VocabResult<Vec<RelatedConcept>> {
        Ok(Vec::new())
    }
}
