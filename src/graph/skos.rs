//! SKOS terms used by the graph patterns.

use oxigraph::model::NamedNodeRef;

pub const NAMESPACE: &str = "http://www.w3.org/2004/02/skos/core#";

pub const PREF_LABEL: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2004/02/skos/core#prefLabel");
pub const ALT_LABEL: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2004/02/skos/core#altLabel");
pub const DEFINITION: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2004/02/skos/core#definition");
pub const BROADER: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2004/02/skos/core#broader");
pub const NARROWER: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2004/02/skos/core#narrower");
pub const EXACT_MATCH: NamedNodeRef<'static> =
    NamedNodeRef::new_unchecked("http://www.w3.org/2004/02/skos/core#exactMatch");

/// Expand a `skos:`-prefixed compact name to a full URI; other values pass through.
pub fn expand(compact: &str) -> String {
    match compact.strip_prefix("skos:") {
        Some(local) => format!("{NAMESPACE}{local}"),
        None => compact.to_string(),
    }
}
