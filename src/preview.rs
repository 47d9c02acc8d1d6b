//! Entity previews for the protocol's preview sub-service.
//!
//! Unlike the `prefLabel` extension property (labels in *other* languages),
//! [`Preview::pref_label`] is the label in the active language.

use serde::Serialize;

use crate::error::ReconcileResult;
use crate::graph::{self, Binding, EntityGraph, SkosPattern};
use crate::protocol::EntityRef;
use crate::vocab::VocabularySource;

/// A label together with its language tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LangLabel {
    pub label: String,
    pub lang: String,
}

/// Everything shown in a human-facing preview of one concept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub uri: String,
    pub lang: String,
    #[serde(rename = "prefLabel")]
    pub pref_label: Option<String>,
    #[serde(rename = "otherPrefLabels")]
    pub other_pref_labels: Vec<LangLabel>,
    #[serde(rename = "altLabels")]
    pub alt_labels: Vec<String>,
    pub broader: Vec<EntityRef>,
    pub narrower: Vec<EntityRef>,
    pub definitions: Vec<String>,
    #[serde(rename = "exactMatches")]
    pub exact_matches: Vec<String>,
}

fn take(rows: Vec<Binding>, var: &str) -> Vec<String> {
    rows.into_iter()
        .filter_map(|mut row| row.remove(var))
        .collect()
}

fn linked(rows: Vec<Binding>) -> Vec<EntityRef> {
    rows.into_iter()
        .filter_map(|mut row| Some(EntityRef::new(row.remove("uri")?, row.remove("label")?)))
        .collect()
}

impl Preview {
    /// Build a preview from an already parsed entity graph.
    pub fn from_graph(graph: &EntityGraph, lang: &str) -> Self {
        let other_pref_labels = graph
            .query(SkosPattern::OtherPrefLabels, lang)
            .into_iter()
            .filter_map(|mut row| {
                Some(LangLabel {
                    label: row.remove("label")?,
                    lang: row.remove("lang").unwrap_or_default(),
                })
            })
            .collect();

        Self {
            uri: graph.subject().as_str().to_string(),
            lang: lang.to_string(),
            pref_label: take(graph.query(SkosPattern::PrefLabel, lang), "label")
                .into_iter()
                .next(),
            other_pref_labels,
            alt_labels: take(graph.query(SkosPattern::AltLabels, lang), "label"),
            broader: linked(graph.query(SkosPattern::Broader, lang)),
            narrower: linked(graph.query(SkosPattern::Narrower, lang)),
            definitions: take(graph.query(SkosPattern::Definitions, lang), "label"),
            exact_matches: take(graph.query(SkosPattern::ExactMatches, lang), "uri"),
        }
    }

    /// Render as a self-contained HTML fragment. All values are escaped.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"skosrec-preview\">\n");
        let title = self.pref_label.as_deref().unwrap_or(&self.uri);
        html.push_str(&format!(
            "  <h3><a href=\"{}\" target=\"_blank\">{}</a></h3>\n",
            escape(&self.uri),
            escape(title)
        ));
        for definition in &self.definitions {
            html.push_str(&format!("  <p class=\"definition\">{}</p>\n", escape(definition)));
        }

        let mut section = |heading: &str, items: Vec<String>| {
            if items.is_empty() {
                return;
            }
            html.push_str(&format!("  <h4>{}</h4>\n  <ul>\n", escape(heading)));
            for item in items {
                html.push_str(&format!("    <li>{item}</li>\n"));
            }
            html.push_str("  </ul>\n");
        };

        section(
            "Alternative labels",
            self.alt_labels.iter().map(|l| escape(l)).collect(),
        );
        section(
            "Other languages",
            self.other_pref_labels
                .iter()
                .map(|l| {
                    let (label, lang) = (escape(&l.label), escape(&l.lang));
                    format!("{label} <span class=\"lang\">({lang})</span>")
                })
                .collect(),
        );
        section("Broader concepts", self.broader.iter().map(link).collect());
        section("Narrower concepts", self.narrower.iter().map(link).collect());
        section(
            "Exact matches",
            self.exact_matches
                .iter()
                .map(|uri| format!("<a href=\"{0}\" target=\"_blank\">{0}</a>", escape(uri)))
                .collect(),
        );

        html.push_str("</div>\n");
        html
    }
}

fn link(entity: &EntityRef) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\">{}</a>",
        escape(&entity.id),
        escape(&entity.name)
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fetch one entity and build its preview.
pub fn preview_entity<V: VocabularySource + ?Sized>(
    source: &V,
    vocid: &str,
    lang: &str,
    uri: &str,
) -> ReconcileResult<Preview> {
    let iri = graph::entity_iri(uri)?;
    let rdf = source.entity_rdf(vocid, uri, lang)?;
    let graph = EntityGraph::parse(iri, &rdf)?;
    Ok(Preview::from_graph(&graph, lang))
}
