//! HTTP client for a Skosmos-style vocabulary REST API.
//!
//! Uses `ureq` for synchronous requests. Every call carries the configured
//! timeout; nothing is retried or cached.

use std::io::Read;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ServiceConfig;
use crate::error::{VocabError, VocabResult};

use super::{
    RelatedConcept, SearchHit, SearchQuery, VocabularyInfo, VocabularySource, VocabularyType,
};

/// MIME type requested from the `data` endpoint.
const RDF_XML: &str = "application/rdf+xml";

/// Vocabulary API client. Cheap to share; holds no per-request state.
pub struct VocabularyClient {
    base_url: Url,
    timeout_secs: u64,
    http: ureq::Agent,
}

impl VocabularyClient {
    /// Build a client from the service configuration.
    pub fn new(config: &ServiceConfig) -> VocabResult<Self> {
        let base_url = Url::parse(&config.api_base_url).map_err(|e| VocabError::Unreachable {
            url: config.api_base_url.clone(),
            message: format!("invalid base URL: {e}"),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(VocabError::Unreachable {
                url: config.api_base_url.clone(),
                message: "base URL cannot carry path segments".into(),
            });
        }
        let http = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Ok(Self {
            base_url,
            timeout_secs: config.timeout_secs,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `{base}{vocid}/{endpoint}?{params}` with every segment escaped.
    pub(crate) fn endpoint_url(&self, vocid: &str, endpoint: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(vocid).push(endpoint);
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter().copied());
        }
        url
    }

    fn call(&self, endpoint: &str, url: &Url) -> VocabResult<ureq::Response> {
        tracing::debug!(endpoint, url = %url, "vocabulary API call");
        match self.http.get(url.as_str()).call() {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(status, _)) => {
                tracing::warn!(endpoint, status, url = %url, "vocabulary API rejected call");
                Err(VocabError::Status {
                    url: url.to_string(),
                    status,
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                if is_timeout(&transport) {
                    Err(VocabError::Timeout {
                        url: url.to_string(),
                        timeout_secs: self.timeout_secs,
                    })
                } else {
                    Err(VocabError::Unreachable {
                        url: url.to_string(),
                        message: transport.to_string(),
                    })
                }
            }
        }
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str, url: &Url) -> VocabResult<T> {
        let resp = self.call(endpoint, url)?;
        resp.into_json().map_err(|e| VocabError::Shape {
            endpoint: endpoint.to_string(),
            message: format!("failed to parse JSON: {e}"),
        })
    }
}

/// Walk the transport error's source chain looking for an I/O timeout.
fn is_timeout(transport: &ureq::Transport) -> bool {
    let mut source = std::error::Error::source(transport);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            ) {
                return true;
            }
        }
        source = err.source();
    }
    false
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct TypesResponse {
    types: Vec<VocabularyType>,
}

#[derive(Deserialize)]
struct LabelResponse {
    #[serde(rename = "prefLabel", default)]
    pref_label: Option<String>,
}

#[derive(Deserialize)]
struct BroaderResponse {
    broader: Vec<RelatedConcept>,
}

#[derive(Deserialize)]
struct NarrowerResponse {
    narrower: Vec<RelatedConcept>,
}

impl VocabularySource for VocabularyClient {
    fn search(&self, vocid: &str, query: &SearchQuery<'_>) -> VocabResult<Vec<SearchHit>> {
        let max_hits = query.max_hits.map(|n| n.to_string());
        let mut params = vec![("query", query.text), ("lang", query.lang)];
        if let Some(max_hits) = &max_hits {
            params.push(("maxhits", max_hits.as_str()));
        }
        if let Some(type_filter) = query.type_filter {
            params.push(("type", type_filter));
        }
        if query.unique {
            params.push(("unique", "true"));
        }
        let url = self.endpoint_url(vocid, "search", &params);
        let resp: SearchResponse = self.get_json("search", &url)?;
        Ok(resp.results)
    }

    fn metadata(&self, vocid: &str, lang: &str) -> VocabResult<VocabularyInfo> {
        let url = self.endpoint_url(vocid, "", &[("lang", lang)]);
        self.get_json("vocabulary", &url)
    }

    fn types(&self, vocid: &str, lang: &str) -> VocabResult<Vec<VocabularyType>> {
        let url = self.endpoint_url(vocid, "types", &[("lang", lang)]);
        let resp: TypesResponse = self.get_json("types", &url)?;
        Ok(resp.types)
    }

    fn entity_rdf(&self, vocid: &str, uri: &str, lang: &str) -> VocabResult<Vec<u8>> {
        let url = self.endpoint_url(
            vocid,
            "data",
            &[("uri", uri), ("format", RDF_XML), ("lang", lang)],
        );
        let resp = self.call("data", &url)?;
        let mut body = Vec::new();
        resp.into_reader()
            .read_to_end(&mut body)
            .map_err(|e| VocabError::Unreachable {
                url: url.to_string(),
                message: format!("failed to read response body: {e}"),
            })?;
        Ok(body)
    }

    fn label(&self, vocid: &str, uri: &str, lang: &str) -> VocabResult<Option<String>> {
        let url = self.endpoint_url(vocid, "label", &[("uri", uri), ("lang", lang)]);
        let resp: LabelResponse = self.get_json("label", &url)?;
        Ok(resp.pref_label)
    }

    fn broader(&self, vocid: &str, uri: &str, lang: &str) -> VocabResult<Vec<RelatedConcept>> {
        let url = self.endpoint_url(vocid, "broader", &[("uri", uri), ("lang", lang)]);
        let resp: BroaderResponse = self.get_json("broader", &url)?;
        Ok(resp.broader)
    }

    fn narrower(&self, vocid: &str, uri: &str, lang: &str) -> VocabResult<Vec<RelatedConcept>> {
        let url = self.endpoint_url(vocid, "narrower", &[("uri", uri), ("lang", lang)]);
        let resp: NarrowerResponse = self.get_json("narrower", &url)?;
        Ok(resp.narrower)
    }
}
