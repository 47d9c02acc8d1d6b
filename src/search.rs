//! Candidate search: vocabulary search hits → reconciliation candidates.
//!
//! Ranking is left to the upstream search engine. The only local signal is
//! the exact-match flag, which compares the preferred label to the raw query
//! text byte-for-byte.

use crate::error::VocabResult;
use crate::graph::skos;
use crate::protocol::{
    BatchQueries, BatchResults, Candidate, EntityRef, QueryResult, Suggestion, TypeFilter,
};
use crate::vocab::{SearchHit, SearchQuery, VocabularySource};

/// Score assigned to every candidate.
pub const CANDIDATE_SCORE: u32 = 1;

/// Wildcard appended to query text for prefix matching.
const WILDCARD: char = '*';

fn prefix_query(text: &str) -> String {
    format!("{text}{WILDCARD}")
}

fn types_of(hit: &SearchHit) -> Vec<EntityRef> {
    hit.types
        .iter()
        .map(|t| {
            let uri = skos::expand(t);
            EntityRef::new(uri.clone(), uri)
        })
        .collect()
}

/// Map one search hit to a candidate for `raw_query`.
pub fn to_candidate(hit: &SearchHit, raw_query: &str) -> Candidate {
    Candidate {
        id: hit.uri.clone(),
        name: hit.pref_label.clone(),
        score: CANDIDATE_SCORE,
        is_exact_match: hit.pref_label == raw_query,
        types: types_of(hit),
    }
}

/// Search one query text and map the hits to candidates.
pub fn search_candidates<V: VocabularySource + ?Sized>(
    source: &V,
    vocid: &str,
    lang: &str,
    text: &str,
    type_filter: Option<&str>,
    limit: Option<usize>,
) -> VocabResult<Vec<Candidate>> {
    let query_text = prefix_query(text);
    let hits = source.search(
        vocid,
        &SearchQuery {
            text: &query_text,
            lang,
            type_filter,
            max_hits: limit,
            unique: true,
        },
    )?;
    Ok(hits.iter().map(|hit| to_candidate(hit, text)).collect())
}

/// Run every query of a batch. Any failing query fails the whole batch.
pub fn search_batch<V: VocabularySource + ?Sized>(
    source: &V,
    vocid: &str,
    lang: &str,
    queries: &BatchQueries,
) -> VocabResult<BatchResults> {
    let mut results = BatchResults::new();
    for (key, query) in queries {
        let type_filter = query.type_filter.as_ref().and_then(TypeFilter::first);
        let candidates =
            search_candidates(source, vocid, lang, &query.query, type_filter, query.limit)?;
        tracing::debug!(key = %key, hits = candidates.len(), "reconciled query");
        results.insert(key.clone(), QueryResult { result: candidates });
    }
    Ok(results)
}

/// Autocomplete: re-fetch a window of `cursor + page_size` hits and return
/// the part starting at `cursor`.
pub fn suggest<V: VocabularySource + ?Sized>(
    source: &V,
    vocid: &str,
    lang: &str,
    prefix: &str,
    cursor: usize,
    page_size: usize,
) -> VocabResult<Vec<Suggestion>> {
    let query_text = prefix_query(prefix);
    let hits = source.search(
        vocid,
        &SearchQuery {
            text: &query_text,
            lang,
            type_filter: None,
            max_hits: Some(cursor.saturating_add(page_size)),
            unique: true,
        },
    )?;
    Ok(hits
        .iter()
        .skip(cursor)
        .map(|hit| Suggestion {
            id: hit.uri.clone(),
            name: hit.pref_label.clone(),
            notable: types_of(hit),
        })
        .collect())
}
