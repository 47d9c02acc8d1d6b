//! Protocol dispatch.
//!
//! [`Dispatcher`] is the transport-independent entry point of the service.
//! A request arrives as a vocabulary id, a language and a bag of string
//! parameters (form body merged over query string). The `reconcile` operation
//! classifies the bag by payload key:
//!
//! 1. `queries` present → batch candidate search
//! 2. else `extend` present → property extension
//! 3. else → service metadata
//!
//! Suggest, propose-properties and preview are separate operations under the
//! same scope. JSON bodies can be wrapped for JSONP with [`render_json`].

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ServiceConfig;
use crate::error::{ProtocolError, ProtocolResult, ReconcileError, ReconcileResult, VocabError};
use crate::extend;
use crate::preview::{self, Preview};
use crate::protocol::{
    BatchQueries, BatchResults, EntityRef, ExtendRequest, ExtendSpec, ExtensionResult,
    PreviewSpec, PropertySetting, ProposeResponse, ServiceEndpoint, ServiceMetadata,
    SuggestResponse, SuggestSpec, ViewSpec,
};
use crate::search;
use crate::vocab::VocabularySource;

// ---------------------------------------------------------------------------
// Request parameters
// ---------------------------------------------------------------------------

/// Request parameters. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    values: HashMap<String, String>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge query-string and form parameters; form values win.
    pub fn merged(query: HashMap<String, String>, form: HashMap<String, String>) -> Self {
        let mut values = query;
        for (key, value) in form {
            if !value.is_empty() || !values.contains_key(&key) {
                values.insert(key, value);
            }
        }
        Self { values }
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, key: &str) -> ProtocolResult<&str> {
        self.get(key).ok_or_else(|| ProtocolError::MissingParameter {
            param: key.to_string(),
        })
    }

    /// Optional non-negative integer parameter.
    pub fn number(&self, key: &str) -> ProtocolResult<Option<usize>> {
        self.get(key)
            .map(|raw| {
                raw.trim().parse().map_err(|_| ProtocolError::InvalidNumber {
                    param: key.to_string(),
                    value: raw.to_string(),
                })
            })
            .transpose()
    }

    /// The JSONP callback name, validated.
    pub fn callback(&self) -> ProtocolResult<Option<&str>> {
        match self.get("callback") {
            None => Ok(None),
            Some(name) if is_callback_name(name) => Ok(Some(name)),
            Some(name) => Err(ProtocolError::InvalidCallback {
                callback: name.to_string(),
            }),
        }
    }
}

fn is_callback_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'))
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// What a `reconcile` request asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Metadata,
    Search(BatchQueries),
    Extend(ExtendRequest),
}

fn parse_payload<T: DeserializeOwned>(param: &str, raw: &str) -> ProtocolResult<T> {
    serde_json::from_str(raw).map_err(|e| ProtocolError::MalformedPayload {
        param: param.to_string(),
        message: e.to_string(),
    })
}

/// Classify a request. `queries` takes priority over `extend`.
pub fn classify(params: &RequestParams) -> ProtocolResult<Operation> {
    if let Some(raw) = params.get("queries") {
        return parse_payload("queries", raw).map(Operation::Search);
    }
    if let Some(raw) = params.get("extend") {
        return parse_payload("extend", raw).map(Operation::Extend);
    }
    Ok(Operation::Metadata)
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Body of a `reconcile` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReconcileResponse {
    Metadata(ServiceMetadata),
    Search(BatchResults),
    Extend(ExtensionResult),
}

/// A serialized response body and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBody {
    pub content_type: &'static str,
    pub body: String,
}

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const JSONP_CONTENT_TYPE: &str = "text/javascript";

/// Serialize `value` as JSON, wrapped as `callback(...)` when a callback is given.
pub fn render_json<T: Serialize>(
    value: &T,
    callback: Option<&str>,
) -> serde_json::Result<RenderedBody> {
    let json = serde_json::to_string(value)?;
    Ok(match callback {
        Some(name) => RenderedBody {
            content_type: JSONP_CONTENT_TYPE,
            body: format!("{name}({json})"),
        },
        None => RenderedBody {
            content_type: JSON_CONTENT_TYPE,
            body: json,
        },
    })
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Vocabulary and language a request is scoped to, plus the externally
/// visible base URL of this service.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub vocid: &'a str,
    pub lang: &'a str,
    pub service_url: &'a str,
}

impl Scope<'_> {
    fn reconcile_path(&self) -> String {
        format!("/{}/{}/reconcile", self.vocid, self.lang)
    }
}

/// The reconciliation protocol engine. Holds only immutable configuration
/// and the vocabulary source, so one instance serves concurrent requests.
pub struct Dispatcher<V> {
    config: ServiceConfig,
    source: V,
}

impl<V: VocabularySource> Dispatcher<V> {
    pub fn new(config: ServiceConfig, source: V) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn source(&self) -> &V {
        &self.source
    }

    /// The main protocol entry point.
    pub fn reconcile(
        &self,
        scope: &Scope<'_>,
        params: &RequestParams,
    ) -> ReconcileResult<ReconcileResponse> {
        match classify(params)? {
            Operation::Search(queries) => {
                tracing::info!(
                    vocid = scope.vocid,
                    lang = scope.lang,
                    queries = queries.len(),
                    "batch search"
                );
                Ok(ReconcileResponse::Search(search::search_batch(
                    &self.source,
                    scope.vocid,
                    scope.lang,
                    &queries,
                )?))
            }
            Operation::Extend(request) => {
                tracing::info!(
                    vocid = scope.vocid,
                    lang = scope.lang,
                    entities = request.ids.len(),
                    properties = request.properties.len(),
                    "extend"
                );
                Ok(ReconcileResponse::Extend(extend::resolve_extension(
                    &self.source,
                    scope.vocid,
                    scope.lang,
                    &request,
                )?))
            }
            Operation::Metadata => {
                tracing::info!(vocid = scope.vocid, lang = scope.lang, "service metadata");
                Ok(ReconcileResponse::Metadata(self.metadata(scope)?))
            }
        }
    }

    /// Service metadata built from the live vocabulary title and types.
    pub fn metadata(&self, scope: &Scope<'_>) -> ReconcileResult<ServiceMetadata> {
        let info = self.source.metadata(scope.vocid, scope.lang)?;
        let identifier_space = info
            .concept_schemes
            .first()
            .map(|scheme| scheme.uri.clone())
            .ok_or_else(|| {
                ReconcileError::from(VocabError::Shape {
                    endpoint: "vocabulary".into(),
                    message: "vocabulary declares no concept schemes".into(),
                })
            })?;
        let default_types = self
            .source
            .types(scope.vocid, scope.lang)?
            .iter()
            .map(|t| EntityRef::new(t.uri.clone(), t.name()))
            .collect();

        let base = scope.reconcile_path();
        Ok(ServiceMetadata {
            name: format!("SKOS reconciliation service for {}", info.title),
            identifier_space,
            schema_space: String::new(),
            default_types,
            view: ViewSpec {
                url: "{{id}}".into(),
            },
            preview: PreviewSpec {
                url: format!("{}{base}/preview?id={{{{id}}}}", scope.service_url),
                width: self.config.preview_width,
                height: self.config.preview_height,
            },
            suggest: SuggestSpec {
                entity: ServiceEndpoint {
                    service_url: scope.service_url.to_string(),
                    service_path: format!("{base}/suggest/entity"),
                },
            },
            extend: ExtendSpec {
                propose_properties: ServiceEndpoint {
                    service_url: scope.service_url.to_string(),
                    service_path: format!("{base}/propose_properties"),
                },
                property_settings: vec![PropertySetting::limit()],
            },
        })
    }

    /// Autocomplete for entity names (`prefix`, optional `cursor`).
    pub fn suggest(
        &self,
        scope: &Scope<'_>,
        params: &RequestParams,
    ) -> ReconcileResult<SuggestResponse> {
        let prefix = params.require("prefix")?;
        let cursor = params.number("cursor")?.unwrap_or(0);
        let result = search::suggest(
            &self.source,
            scope.vocid,
            scope.lang,
            prefix,
            cursor,
            self.config.suggest_page_size,
        )?;
        Ok(SuggestResponse { result })
    }

    /// Properties offered for a type (`type`, optional `limit`).
    pub fn propose_properties(&self, params: &RequestParams) -> ProtocolResult<ProposeResponse> {
        let limit = params.number("limit")?;
        Ok(extend::propose_properties(params.get("type"), limit))
    }

    /// Preview data for one entity (`id`).
    pub fn preview(&self, scope: &Scope<'_>, params: &RequestParams) -> ReconcileResult<Preview> {
        let id = params.require("id")?;
        preview::preview_entity(&self.source, scope.vocid, scope.lang, id)
    }
}
