//! In-memory vocabulary shared by the end-to-end test crates.
//!
//! Serves the RDF/XML fixtures and a fixed hit list. The `down` and `slow`
//! vocabulary ids simulate an unreachable and a timed-out upstream.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use skos_reconcile::error::{VocabError, VocabResult};
use skos_reconcile::vocab::{
    ConceptSchemeRef, RelatedConcept, SearchHit, SearchQuery, VocabularyInfo, VocabularySource,
    VocabularyType,
};

pub const CATS: &str = "http://www.yso.fi/onto/yso/p1";
pub const PETS: &str = "http://www.yso.fi/onto/yso/p2";

/// Vocabulary id the fake treats as unreachable.
pub const DOWN: &str = "down";

/// Vocabulary id whose calls time out.
pub const SLOW: &str = "slow";

pub struct InMemoryVocabulary {
    hits: Vec<SearchHit>,
    rdf: HashMap<String, Vec<u8>>,
    /// Search texts, in call order.
    pub searches: Mutex<Vec<String>>,
    /// Entity URIs whose RDF was requested, in call order.
    pub fetches: Mutex<Vec<String>>,
}

impl InMemoryVocabulary {
    pub fn new() -> Self {
        let concept = |uri: &str, label: &str| SearchHit {
            uri: uri.to_string(),
            pref_label: label.to_string(),
            types: vec!["skos:Concept".to_string()],
        };
        let mut hits = vec![
            concept(CATS, "cats"),
            concept("http://www.yso.fi/onto/yso/p3", "Persian cats"),
            concept(PETS, "pets"),
            concept("http://www.yso.fi/onto/yso/p90", "Cats (musical)"),
        ];
        hits.extend((0..45).map(|i| {
            concept(&format!("http://example.org/breed/{i}"), &format!("breed {i}"))
        }));

        let rdf = HashMap::from([
            (CATS.to_string(), include_bytes!("../fixtures/cats.rdf").to_vec()),
            (PETS.to_string(), include_bytes!("../fixtures/pets.rdf").to_vec()),
        ]);

        Self {
            hits,
            rdf,
            searches: Mutex::new(Vec::new()),
            fetches: Mutex::new(Vec::new()),
        }
    }

    fn check_up(vocid: &str) -> VocabResult<()> {
        let url = format!("http://vocab.test/{vocid}/");
        match vocid {
            DOWN => Err(VocabError::Unreachable {
                url,
                message: "connection refused".into(),
            }),
            SLOW => Err(VocabError::Timeout {
                url,
                timeout_secs: 10,
            }),
            _ => Ok(()),
        }
    }
}

impl VocabularySource for InMemoryVocabulary {
    fn search(&self, vocid: &str, query: &SearchQuery<'_>) -> VocabResult<Vec<SearchHit>> {
        Self::check_up(vocid)?;
        self.searches.lock().unwrap().push(query.text.to_string());
        let prefix = query.text.trim_end_matches('*').to_lowercase();
        Ok(self
            .hits
            .iter()
            .filter(|h| h.pref_label.to_lowercase().starts_with(&prefix))
            .take(query.max_hits.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn metadata(&self, vocid: &str, _lang: &str) -> VocabResult<VocabularyInfo> {
        Self::check_up(vocid)?;
        Ok(VocabularyInfo {
            title: "YSO".into(),
            concept_schemes: vec![ConceptSchemeRef {
                uri: "http://www.yso.fi/onto/yso/".into(),
            }],
        })
    }

    fn types(&self, vocid: &str, _lang: &str) -> VocabResult<Vec<VocabularyType>> {
        Self::check_up(vocid)?;
        Ok(vec![VocabularyType {
            uri: "http://www.w3.org/2004/02/skos/core#Concept".into(),
            label: Some("Concept".into()),
        }])
    }

    fn entity_rdf(&self, vocid: &str, uri: &str, _lang: &str) -> VocabResult<Vec<u8>> {
        Self::check_up(vocid)?;
        self.fetches.lock().unwrap().push(uri.to_string());
        self.rdf.get(uri).cloned().ok_or_else(|| VocabError::Status {
            url: uri.to_string(),
            status: 404,
        })
    }

    fn label(&self, _vocid: &str, uri: &str, _lang: &str) -> VocabResult<Option<String>> {
        Ok(self.hits.iter().find(|h| h.uri == uri).map(|h| h.pref_label.clone()))
    }

    fn broader(&self, _: &str, _: &str, _: &str) -> VocabResult<Vec<RelatedConcept>> {
        Ok(Vec::new())
    }

    fn narrower(&self, _: &str, _: &str, _: &str) -> VocabResult<Vec<RelatedConcept>> {
        Ok(Vec::new())
    }
}
