//! Property extension.
//!
//! Resolves an [`ExtendRequest`] into the protocol's row/column shape. Each
//! distinct entity is fetched once, and every requested property is answered
//! from that one graph. Unknown property ids are skipped without error.

use std::collections::BTreeMap;

use crate::error::ReconcileResult;
use crate::graph::{self, Binding, EntityGraph, SkosPattern};
use crate::protocol::{
    ExtendRequest, ExtensionResult, ExtensionRow, PropertyDescriptor, PropertyId, ProposeResponse,
    ValueRecord,
};
use crate::vocab::VocabularySource;

/// Requested properties keyed in catalog order, with their limits.
/// A property listed twice keeps the settings of its last occurrence.
fn requested_properties(request: &ExtendRequest) -> BTreeMap<PropertyId, Option<usize>> {
    let mut requested = BTreeMap::new();
    for property in &request.properties {
        match PropertyId::from_id(&property.id) {
            Some(id) => {
                requested.insert(id, property.limit());
            }
            None => tracing::debug!(property = %property.id, "skipping unknown property"),
        }
    }
    requested
}

fn records(pattern: SkosPattern, rows: Vec<Binding>) -> Vec<ValueRecord> {
    rows.into_iter()
        .filter_map(|mut row| {
            let label = row.remove("label");
            if pattern.is_relation() {
                Some(ValueRecord::entity(row.remove("uri")?, label?))
            } else {
                Some(ValueRecord::literal(label.or_else(|| row.remove("uri"))?))
            }
        })
        .collect()
}

fn apply_limit(mut values: Vec<ValueRecord>, limit: Option<usize>) -> Vec<ValueRecord> {
    if let Some(limit) = limit {
        values.truncate(limit);
    }
    values
}

/// Values of one property for one entity.
fn property_values(
    id: PropertyId,
    entity: &str,
    graph: Option<&EntityGraph>,
    lang: &str,
) -> Vec<ValueRecord> {
    match (id.pattern(), graph) {
        (None, _) => vec![ValueRecord::literal(entity)],
        (Some(pattern), Some(graph)) => records(pattern, graph.query(pattern, lang)),
        (Some(_), None) => Vec::new(),
    }
}

/// Resolve an extend request against the vocabulary.
///
/// Fails as a whole if any entity cannot be fetched or parsed.
pub fn resolve_extension<V: VocabularySource + ?Sized>(
    source: &V,
    vocid: &str,
    lang: &str,
    request: &ExtendRequest,
) -> ReconcileResult<ExtensionResult> {
    let requested = requested_properties(request);
    let meta: Vec<PropertyDescriptor> = requested.keys().map(|id| id.descriptor()).collect();
    let needs_graph = requested.keys().any(|id| id.pattern().is_some());

    let mut rows: BTreeMap<String, ExtensionRow> = BTreeMap::new();
    for entity in &request.ids {
        if rows.contains_key(entity) {
            continue;
        }

        let graph = if needs_graph {
            let iri = graph::entity_iri(entity)?;
            let rdf = source.entity_rdf(vocid, entity, lang)?;
            Some(EntityGraph::parse(iri, &rdf)?)
        } else {
            None
        };
        tracing::debug!(entity = %entity, fetched = graph.is_some(), "extending entity");

        let row: ExtensionRow = requested
            .iter()
            .map(|(id, limit)| {
                let values = property_values(*id, entity, graph.as_ref(), lang);
                (id.as_str().to_string(), apply_limit(values, *limit))
            })
            .collect();
        rows.insert(entity.clone(), row);
    }

    Ok(ExtensionResult { meta, rows })
}

/// The first `limit` entries of the property catalog.
pub fn propose_properties(type_id: Option<&str>, limit: Option<usize>) -> ProposeResponse {
    ProposeResponse {
        type_id: type_id.map(str::to_string),
        properties: PropertyId::CATALOG
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|id| id.descriptor())
            .collect(),
        limit,
    }
}
