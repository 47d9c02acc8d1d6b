//! One-hop SKOS graph patterns.
//!
//! Each [`SkosPattern`] walks a single SKOS predicate from a bound entity and
//! projects a fixed set of variables:
//!
//! | pattern            | path                                          | variables        |
//! |--------------------|-----------------------------------------------|------------------|
//! | `PrefLabel`        | `skos:prefLabel` (same language)              | `label`          |
//! | `OtherPrefLabels`  | `skos:prefLabel` (any other language)         | `label`, `lang`  |
//! | `AltLabels`        | `skos:altLabel` (same language)               | `label`          |
//! | `Definitions`      | `skos:definition` (same language)             | `label`          |
//! | `Broader`          | `skos:broader ?uri . ?uri skos:prefLabel`     | `label`, `uri`   |
//! | `Narrower`         | `skos:narrower ?uri . ?uri skos:prefLabel`    | `label`, `uri`   |
//! | `ExactMatches`     | `skos:exactMatch`                             | `uri`            |
//!
//! The RDF graph is unordered, so result rows are sorted by the projected
//! variables in column order. Literal values are returned byte-for-byte.

use std::collections::BTreeMap;

use oxigraph::model::{Graph, LiteralRef, NamedNodeRef, TermRef};

use super::skos;

/// One result row: variable name → bound string value.
pub type Binding = BTreeMap<&'static str, String>;

/// Language constraint applied to literal objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LanguageFilter {
    /// Tag equals the active language (ASCII case-insensitive).
    Same,
    /// Tag differs from the active language; untagged literals qualify.
    Other,
}

impl LanguageFilter {
    fn accepts(self, literal: LiteralRef<'_>, lang: &str) -> bool {
        let same = literal
            .language()
            .is_some_and(|tag| tag.eq_ignore_ascii_case(lang));
        match self {
            LanguageFilter::Same => same,
            LanguageFilter::Other => !same,
        }
    }
}

/// The fixed set of patterns the service evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkosPattern {
    PrefLabel,
    OtherPrefLabels,
    AltLabels,
    Definitions,
    Broader,
    Narrower,
    ExactMatches,
}

impl SkosPattern {
    /// Projected variables, primary sort key first.
    pub fn variables(self) -> &'static [&'static str] {
        match self {
            SkosPattern::PrefLabel | SkosPattern::AltLabels | SkosPattern::Definitions => {
                &["label"]
            }
            SkosPattern::OtherPrefLabels => &["label", "lang"],
            SkosPattern::Broader | SkosPattern::Narrower => &["label", "uri"],
            SkosPattern::ExactMatches => &["uri"],
        }
    }

    /// Whether rows describe linked entities (`uri` + `label`) rather than literals.
    pub fn is_relation(self) -> bool {
        matches!(self, SkosPattern::Broader | SkosPattern::Narrower)
    }

    fn predicate(self) -> NamedNodeRef<'static> {
        match self {
            SkosPattern::PrefLabel | SkosPattern::OtherPrefLabels => skos::PREF_LABEL,
            SkosPattern::AltLabels => skos::ALT_LABEL,
            SkosPattern::Definitions => skos::DEFINITION,
            SkosPattern::Broader => skos::BROADER,
            SkosPattern::Narrower => skos::NARROWER,
            SkosPattern::ExactMatches => skos::EXACT_MATCH,
        }
    }

    pub(crate) fn evaluate(
        self,
        graph: &Graph,
        subject: NamedNodeRef<'_>,
        lang: &str,
    ) -> Vec<Binding> {
        let objects: Vec<TermRef<'_>> = graph
            .objects_for_subject_predicate(subject, self.predicate())
            .collect();

        let mut rows: Vec<Binding> = match self {
            SkosPattern::PrefLabel | SkosPattern::AltLabels | SkosPattern::Definitions => {
                literal_rows(&objects, LanguageFilter::Same, lang, false)
            }
            SkosPattern::OtherPrefLabels => {
                literal_rows(&objects, LanguageFilter::Other, lang, true)
            }
            SkosPattern::Broader | SkosPattern::Narrower => objects
                .iter()
                .filter_map(|term| named_node(*term))
                .flat_map(|related| {
                    graph
                        .objects_for_subject_predicate(related, skos::PREF_LABEL)
                        .filter_map(literal)
                        .filter(|label| LanguageFilter::Same.accepts(*label, lang))
                        .map(|label| {
                            Binding::from([
                                ("uri", related.as_str().to_string()),
                                ("label", label.value().to_string()),
                            ])
                        })
                        .collect::<Vec<_>>()
                })
                .collect(),
            SkosPattern::ExactMatches => objects
                .iter()
                .filter_map(|term| named_node(*term))
                .map(|target| Binding::from([("uri", target.as_str().to_string())]))
                .collect(),
        };

        let columns = self.variables();
        rows.sort_by(|a, b| {
            let key_a = columns.iter().map(|v| a.get(v));
            let key_b = columns.iter().map(|v| b.get(v));
            key_a.cmp(key_b)
        });
        rows.dedup();
        rows
    }
}

fn literal_rows(
    objects: &[TermRef<'_>],
    filter: LanguageFilter,
    lang: &str,
    with_lang: bool,
) -> Vec<Binding> {
    objects
        .iter()
        .filter_map(|term| literal(*term))
        .filter(|lit| filter.accepts(*lit, lang))
        .map(|lit| {
            let mut row = Binding::from([("label", lit.value().to_string())]);
            if with_lang {
                row.insert("lang", lit.language().unwrap_or_default().to_string());
            }
            row
        })
        .collect()
}

fn literal(term: TermRef<'_>) -> Option<LiteralRef<'_>> {
    match term {
        TermRef::Literal(lit) => Some(lit),
        _ => None,
    }
}

fn named_node(term: TermRef<'_>) -> Option<NamedNodeRef<'_>> {
    match term {
        TermRef::NamedNode(node) => Some(node),
        _ => None,
    }
}
