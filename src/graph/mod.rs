//! Per-entity RDF graphs.
//!
//! An [`EntityGraph`] holds the parsed RDF/XML description of one concept as
//! returned by the vocabulary API's data endpoint. Graphs live for one
//! request and are never shared or cached. Queries are evaluated with
//! [`pattern::SkosPattern`], which binds the entity IRI and language as typed
//! terms rather than splicing them into query text.

pub mod pattern;
pub mod skos;

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{Graph, NamedNode, NamedNodeRef, Triple};

use crate::error::{GraphError, GraphResult};

pub use pattern::{Binding, SkosPattern};

/// Validate a caller-supplied entity identifier as an absolute IRI.
pub fn entity_iri(uri: &str) -> GraphResult<NamedNode> {
    NamedNode::new(uri).map_err(|e| GraphError::InvalidIri {
        iri: uri.to_string(),
        message: e.to_string(),
    })
}

/// Parsed description of a single entity.
pub struct EntityGraph {
    subject: NamedNode,
    graph: Graph,
}

impl EntityGraph {
    /// Parse an RDF/XML document describing `subject`.
    ///
    /// Relative IRIs in the document resolve against the subject IRI.
    pub fn parse(subject: NamedNode, rdf_xml: &[u8]) -> GraphResult<Self> {
        let parse_err = |message: String| GraphError::Parse {
            uri: subject.as_str().to_string(),
            message,
        };

        let parser = RdfParser::from_format(RdfFormat::RdfXml)
            .with_base_iri(subject.as_str())
            .map_err(|e| parse_err(e.to_string()))?;

        let mut graph = Graph::new();
        for quad in parser.for_reader(rdf_xml) {
            let quad = quad.map_err(|e| parse_err(e.to_string()))?;
            graph.insert(&Triple::new(quad.subject, quad.predicate, quad.object));
        }

        tracing::trace!(entity = %subject, triples = graph.len(), "parsed entity description");
        Ok(Self { subject, graph })
    }

    pub fn subject(&self) -> NamedNodeRef<'_> {
        self.subject.as_ref()
    }

    /// Number of distinct triples in the description.
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Evaluate a SKOS pattern from this entity in the given language.
    pub fn query(&self, pattern: SkosPattern, lang: &str) -> Vec<Binding> {
        pattern.evaluate(&self.graph, self.subject.as_ref(), lang)
    }
}

impl std::fmt::Debug for EntityGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityGraph")
            .field("subject", &self.subject.as_str())
            .field("triples", &self.graph.len())
            .finish()
    }
}
