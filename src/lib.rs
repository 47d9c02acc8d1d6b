// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # skos-reconcile
//!
//! A Reconciliation Service API adapter for SKOS vocabularies published
//! through a Skosmos-style REST API.
//!
//! ## Architecture
//!
//! - **Vocabulary access** (`vocab`): typed HTTP client behind `VocabularySource`
//! - **Entity graphs** (`graph`): per-entity RDF/XML in an oxigraph graph,
//!   queried by fixed SKOS patterns
//! - **Candidate search** (`search`): search hits → candidates and suggestions
//! - **Property extension** (`extend`): SKOS properties as data-extension columns
//! - **Dispatch** (`dispatch`): request classification, metadata, JSONP
//! - **HTTP server** (`server`, feature `server`): axum routes over the dispatcher
//!
//! ## Library usage
//!
//! ```no_run
//! use skos_reconcile::config::ServiceConfig;
//! use skos_reconcile::dispatch::{Dispatcher, RequestParams, Scope};
//! use skos_reconcile::vocab::VocabularyClient;
//!
//! let config = ServiceConfig::default();
//! let client = VocabularyClient::new(&config).unwrap();
//! let dispatcher = Dispatcher::new(config, client);
//! let scope = Scope { vocid: "yso", lang: "en", service_url: "http://localhost:8300" };
//! let params = RequestParams::new().with("queries", r#"{"q0":{"query":"cats"}}"#);
//! let response = dispatcher.reconcile(&scope, &params).unwrap();
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod extend;
pub mod graph;
pub mod preview;
pub mod protocol;
pub mod search;
#[cfg(feature = "server")]
pub mod server;
pub mod vocab;

#[cfg(test)]
mod testing;
