use log::info;
use scraper::{ElementRef, Html, Selector};

use crate::records::Candidate;

/// Literal heading text ChemIDplus renders on an empty result page.
const NO_RECORDS_PHRASE: &str = "The following query produced no records:";

/// Title prefix of a multi-result listing page.
const RESULTS_TITLE_PREFIX: &str = "ChemIDplus Results - Chemical information";

/// Identifiers shorter than this are placeholders, not real registry numbers.
const MIN_ID_LEN: usize = 5;

/// What a fetched search-results document represents.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    NotFound,
    DirectMatch,
    MultipleCandidates(Vec<Candidate>),
}

/// Decide whether a search-results document is an empty result, a results
/// listing, or already the substance detail page.
pub fn classify(doc: &Html) -> Classification {
    let headings = Selector::parse("h1, h2, h3").unwrap();
    let no_records = doc
        .select(&headings)
        .any(|h| h.text().collect::<String>().trim() == NO_RECORDS_PHRASE);
    if no_records {
        return Classification::NotFound;
    }

    let title_sel = Selector::parse("head title").unwrap();
    let title: String = doc
        .select(&title_sel)
        .next()
        .map(|t| t.text().collect::<String>())
        .unwrap_or_default();
    if title.trim().starts_with(RESULTS_TITLE_PREFIX) {
        let candidates = extract_candidates(doc);
        info!("Found {} listed candidates", candidates.len());
        return Classification::MultipleCandidates(candidates);
    }

    Classification::DirectMatch
}

/// Pull (display name, registry identifier) pairs off a listing page. The name
/// is the record-details anchor text; the identifier is the text node directly
/// after the anchor. Entries with placeholder identifiers are dropped.
fn extract_candidates(doc: &Html) -> Vec<Candidate> {
    let anchor_sel = Selector::parse(r#"a[title="Open record details"]"#).unwrap();
    let mut candidates = Vec::new();

    for anchor in doc.select(&anchor_sel) {
        let name = anchor.text().collect::<String>().trim().to_string();
        let registry_id = following_text(&anchor);
        if registry_id.chars().count() < MIN_ID_LEN {
            continue;
        }
        candidates.push(Candidate { name, registry_id });
    }

    candidates
}

fn following_text(anchor: &ElementRef) -> String {
    anchor
        .next_siblings()
        .find_map(|node| node.value().as_text().map(|t| t.trim().to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn no_records_heading_classifies_not_found() {
        let d = doc(
            "<html><head><title>ChemIDplus</title></head><body>\
             <h3>The following query produced no records:</h3>\
             </body></html>",
        );
        assert_eq!(classify(&d), Classification::NotFound);
    }

    #[test]
    fn results_title_classifies_multiple_and_extracts_candidates() {
        let d = doc(
            "<html><head><title>ChemIDplus Results - Chemical information</title></head>\
             <body><div>\
             <a title=\"Open record details\" href=\"/rn/50-00-0\">Formaldehyde</a> 50-00-0<br>\
             <a title=\"Open record details\" href=\"/rn/x\">Paraform</a> 123\
             <a title=\"Open record details\" href=\"/rn/30525-89-4\">Paraformaldehyde</a> 30525-89-4\
             </div></body></html>",
        );
        match classify(&d) {
            Classification::MultipleCandidates(c) => {
                // the 3-char identifier is filtered out
                assert_eq!(c.len(), 2);
                assert_eq!(c[0].name, "Formaldehyde");
                assert_eq!(c[0].registry_id, "50-00-0");
                assert_eq!(c[1].name, "Paraformaldehyde");
                assert_eq!(c[1].registry_id, "30525-89-4");
            }
            other => panic!("expected multiple candidates, got {:?}", other),
        }
    }

    #[test]
    fn detail_page_classifies_direct_match() {
        let d = doc(
            "<html><head><title>Formaldehyde - ChemIDplus</title></head>\
             <body><h2>Name of Substance</h2><div><ul><li>Formaldehyde</li></ul></div>\
             </body></html>",
        );
        assert_eq!(classify(&d), Classification::DirectMatch);
    }

    #[test]
    fn listing_without_usable_identifiers_yields_empty_list() {
        let d = doc(
            "<html><head><title>ChemIDplus Results - Chemical information</title></head>\
             <body><a title=\"Open record details\">Thing</a> 12</body></html>",
        );
        assert_eq!(
            classify(&d),
            Classification::MultipleCandidates(Vec::new())
        );
    }
}
