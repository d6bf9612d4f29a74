use scraper::{ElementRef, Html, Selector};

use crate::records::{DataTable, PropertyRow, PropertyTable, Provenance, SubstanceRecord};

#[derive(Debug, Clone, Copy, PartialEq)]
enum SectionKind {
    /// `<li>` items inside the container following the heading.
    ItemList,
    /// Text content of the container, embedded whitespace stripped.
    TextNode,
    /// First `<table>` in the section following the heading.
    Table,
    /// Table with its "Value" column coerced to numeric.
    NumericTable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Name,
    Synonyms,
    Cas,
    Inchi,
    InchiKey,
    Smiles,
    Toxicity,
    PhysProp,
}

struct Section {
    heading: &'static str,
    level: &'static str,
    kind: SectionKind,
    field: Field,
}

/// Declarative map of detail-page sections. Headings are matched by
/// case-sensitive substring in document order, so "InChI" resolves to the
/// InChI section because it precedes InChIKey on the page.
const SECTIONS: [Section; 8] = [
    Section { heading: "Name of Substance", level: "h2", kind: SectionKind::ItemList, field: Field::Name },
    Section { heading: "Synonyms", level: "h2", kind: SectionKind::ItemList, field: Field::Synonyms },
    Section { heading: "CAS Registry", level: "h2", kind: SectionKind::ItemList, field: Field::Cas },
    Section { heading: "InChIKey", level: "h2", kind: SectionKind::TextNode, field: Field::InchiKey },
    Section { heading: "InChI", level: "h2", kind: SectionKind::TextNode, field: Field::Inchi },
    Section { heading: "Smiles", level: "h2", kind: SectionKind::TextNode, field: Field::Smiles },
    Section { heading: "Toxicity", level: "h1", kind: SectionKind::Table, field: Field::Toxicity },
    Section { heading: "Physical Prop", level: "h1", kind: SectionKind::NumericTable, field: Field::PhysProp },
];

enum SectionValue {
    Items(Vec<String>),
    Text(String),
    Table(DataTable),
    Properties(PropertyTable),
    Absent,
}

/// Parse a substance detail document into a record. Parsing is a pure
/// function of the document; every missing section becomes `None`.
pub fn parse_detail(doc: &Html, source_url: &str, provenance: Provenance) -> SubstanceRecord {
    let mut record = SubstanceRecord {
        name: None,
        synonyms: None,
        cas: None,
        inchi: None,
        inchikey: None,
        smiles: None,
        toxicity: None,
        physprop: None,
        source_url: source_url.to_string(),
        provenance,
    };

    for section in &SECTIONS {
        match (section.field, extract_section(doc, section)) {
            (Field::Name, SectionValue::Items(v)) => record.name = Some(v),
            (Field::Synonyms, SectionValue::Items(v)) => record.synonyms = Some(v),
            (Field::Cas, SectionValue::Items(v)) => record.cas = Some(v),
            (Field::Inchi, SectionValue::Text(s)) => record.inchi = Some(s),
            (Field::InchiKey, SectionValue::Text(s)) => record.inchikey = Some(s),
            (Field::Smiles, SectionValue::Text(s)) => record.smiles = Some(s),
            (Field::Toxicity, SectionValue::Table(t)) => record.toxicity = Some(t),
            (Field::PhysProp, SectionValue::Properties(p)) => record.physprop = Some(p),
            _ => {}
        }
    }

    record
}

/// The principal listed name of a detail page, used as the matched name on
/// the direct-match path.
pub fn principal_name(doc: &Html) -> Option<String> {
    let section = &SECTIONS[0];
    match extract_section(doc, section) {
        SectionValue::Items(items) => items.into_iter().next(),
        _ => None,
    }
}

fn extract_section(doc: &Html, section: &Section) -> SectionValue {
    let Some(heading) = find_heading(doc, section.level, section.heading) else {
        return SectionValue::Absent;
    };

    match section.kind {
        SectionKind::ItemList => {
            let Some(container) = following_container(heading) else {
                return SectionValue::Absent;
            };
            let li = Selector::parse("li").unwrap();
            let items: Vec<String> = container
                .select(&li)
                .map(|e| e.text().collect::<String>().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if items.is_empty() {
                SectionValue::Absent
            } else {
                SectionValue::Items(items)
            }
        }
        SectionKind::TextNode => {
            let Some(container) = following_container(heading) else {
                return SectionValue::Absent;
            };
            let text: String = container
                .text()
                .collect::<String>()
                .chars()
                .filter(|c| !matches!(c, '\n' | '\t' | '\r'))
                .collect();
            let text = text.trim().to_string();
            if text.is_empty() {
                SectionValue::Absent
            } else {
                SectionValue::Text(text)
            }
        }
        SectionKind::Table => match section_table(heading) {
            Some(table) => SectionValue::Table(parse_table(table)),
            None => SectionValue::Absent,
        },
        SectionKind::NumericTable => match section_table(heading) {
            Some(table) => SectionValue::Properties(parse_property_table(table)),
            None => SectionValue::Absent,
        },
    }
}

/// First heading of the given level whose text contains `text`, in document
/// order. Case-sensitive.
fn find_heading<'a>(doc: &'a Html, level: &str, text: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(level).unwrap();
    doc.select(&sel)
        .find(|h| h.text().collect::<String>().contains(text))
}

/// The element sibling immediately following a heading.
fn following_container(heading: ElementRef) -> Option<ElementRef> {
    heading.next_siblings().find_map(ElementRef::wrap)
}

/// First table in the section after `heading`, stopping at the next heading
/// of the same level.
fn section_table(heading: ElementRef) -> Option<ElementRef> {
    let table_sel = Selector::parse("table").unwrap();
    let level = heading.value().name().to_string();

    for node in heading.next_siblings() {
        if let Some(el) = ElementRef::wrap(node) {
            if el.value().name() == level {
                return None;
            }
            if el.value().name() == "table" {
                return Some(el);
            }
            if let Some(table) = el.select(&table_sel).next() {
                return Some(table);
            }
        }
    }
    None
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn parse_table(table: ElementRef) -> DataTable {
    let tr = Selector::parse("tr").unwrap();
    let th = Selector::parse("th").unwrap();
    let td = Selector::parse("td").unwrap();

    let mut columns = Vec::new();
    let mut rows = Vec::new();
    for row in table.select(&tr) {
        let headers: Vec<String> = row.select(&th).map(cell_text).collect();
        if columns.is_empty() && !headers.is_empty() {
            columns = headers;
            continue;
        }
        let cells: Vec<String> = row.select(&td).map(cell_text).collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }

    DataTable { columns, rows }
}

/// Like [`parse_table`], additionally coercing the "Value" column to `f64`.
/// A cell that fails to parse keeps its text and gets a missing value; the
/// rest of the table is untouched.
fn parse_property_table(table: ElementRef) -> PropertyTable {
    let raw = parse_table(table);
    let value_idx = raw.columns.iter().position(|c| c == "Value");

    let rows = raw
        .rows
        .into_iter()
        .map(|cells| {
            let value = value_idx
                .and_then(|i| cells.get(i))
                .and_then(|v| v.trim().parse::<f64>().ok());
            PropertyRow { cells, value }
        })
        .collect();

    PropertyTable {
        columns: raw.columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::MatchTag;

    const DETAIL_PAGE: &str = r#"<html>
      <head><title>Formaldehyde - ChemIDplus</title></head>
      <body>
        <h1>Substance Details</h1>
        <h2>Name of Substance</h2>
        <div><ul><li>Formaldehyde</li><li>Formaldehyde solution</li></ul></div>
        <h2>Synonyms</h2>
        <div><ul><li>Formalin</li><li>Methanal</li><li>Methylene oxide</li></ul></div>
        <h2>CAS Registry Number</h2>
        <div><ul><li>50-00-0</li></ul></div>
        <h2>InChI</h2>
        <div>InChI=1S/CH2O/
	c1-2/h1H2</div>
        <h2>InChIKey</h2>
        <div>WSFSSNUMVMOOMR-
UHFFFAOYSA-N</div>
        <h2>Smiles</h2>
        <div>C=O</div>
        <h1>Toxicity</h1>
        <div>
          <table>
            <tr><th>Organism</th><th>Test Type</th><th>Route</th><th>Reported Dose</th></tr>
            <tr><td>rat</td><td>LD50</td><td>oral</td><td>100 mg/kg</td></tr>
            <tr><td>mouse</td><td>LD50</td><td>oral</td><td>42 mg/kg</td></tr>
          </table>
        </div>
        <h1>Physical Properties</h1>
        <div>
          <table>
            <tr><th>Property</th><th>Value</th><th>Units</th></tr>
            <tr><td>Melting Point</td><td>-92</td><td>deg C</td></tr>
            <tr><td>Boiling Point</td><td>-19.5</td><td>deg C</td></tr>
            <tr><td>Water Solubility</td><td>miscible</td><td></td></tr>
          </table>
        </div>
      </body>
    </html>"#;

    fn provenance() -> Provenance {
        Provenance {
            matched_name: Some("Formaldehyde".to_string()),
            tag: MatchTag::Direct,
        }
    }

    #[test]
    fn parses_all_sections_of_a_detail_page() {
        let doc = Html::parse_document(DETAIL_PAGE);
        let record = parse_detail(&doc, "https://example.org/rn/50-00-0", provenance());

        assert_eq!(
            record.name,
            Some(vec![
                "Formaldehyde".to_string(),
                "Formaldehyde solution".to_string()
            ])
        );
        assert_eq!(record.synonyms.as_ref().map(|s| s.len()), Some(3));
        assert_eq!(record.cas, Some(vec!["50-00-0".to_string()]));
        // embedded newlines and tabs are stripped from structural identifiers
        assert_eq!(record.inchi.as_deref(), Some("InChI=1S/CH2O/c1-2/h1H2"));
        assert_eq!(
            record.inchikey.as_deref(),
            Some("WSFSSNUMVMOOMR-UHFFFAOYSA-N")
        );
        assert_eq!(record.smiles.as_deref(), Some("C=O"));
        assert_eq!(record.source_url, "https://example.org/rn/50-00-0");

        let tox = record.toxicity.expect("toxicity table");
        assert_eq!(tox.columns[0], "Organism");
        assert_eq!(tox.rows.len(), 2);
        assert_eq!(tox.rows[1][3], "42 mg/kg");
    }

    #[test]
    fn value_column_coercion_failure_is_cell_local() {
        let doc = Html::parse_document(DETAIL_PAGE);
        let record = parse_detail(&doc, "u", provenance());
        let props = record.physprop.expect("property table");

        assert_eq!(props.columns, vec!["Property", "Value", "Units"]);
        assert_eq!(props.rows.len(), 3);
        assert_eq!(props.rows[0].value, Some(-92.0));
        assert_eq!(props.rows[1].value, Some(-19.5));
        // "miscible" is not numeric; the cell text survives, the value is missing
        assert_eq!(props.rows[2].value, None);
        assert_eq!(props.rows[2].cells[1], "miscible");
    }

    #[test]
    fn missing_sections_become_absent_markers() {
        let doc = Html::parse_document(
            "<html><body><h2>Name of Substance</h2><div><ul><li>Thing</li></ul></div></body></html>",
        );
        let record = parse_detail(&doc, "u", provenance());
        assert_eq!(record.name, Some(vec!["Thing".to_string()]));
        assert_eq!(record.synonyms, None);
        assert_eq!(record.cas, None);
        assert_eq!(record.inchi, None);
        assert_eq!(record.inchikey, None);
        assert_eq!(record.smiles, None);
        assert_eq!(record.toxicity, None);
        assert_eq!(record.physprop, None);
    }

    #[test]
    fn heading_without_expected_content_is_absent() {
        let doc = Html::parse_document(
            "<html><body><h2>Synonyms</h2><div></div><h1>Toxicity</h1><div><p>none</p></div></body></html>",
        );
        let record = parse_detail(&doc, "u", provenance());
        assert_eq!(record.synonyms, None);
        assert_eq!(record.toxicity, None);
    }

    #[test]
    fn parsing_is_idempotent() {
        let doc = Html::parse_document(DETAIL_PAGE);
        let a = parse_detail(&doc, "u", provenance());
        let b = parse_detail(&doc, "u", provenance());
        assert_eq!(a, b);
    }

    #[test]
    fn principal_name_is_first_listed() {
        let doc = Html::parse_document(DETAIL_PAGE);
        assert_eq!(principal_name(&doc).as_deref(), Some("Formaldehyde"));
    }

    #[test]
    fn table_search_stops_at_next_heading_of_same_level() {
        // no table between "Toxicity" and the next h1, so the field is absent
        // even though a later section holds one
        let doc = Html::parse_document(
            "<html><body>\
             <h1>Toxicity</h1><div><p>no data</p></div>\
             <h1>Other</h1><div><table><tr><th>A</th></tr><tr><td>1</td></tr></table></div>\
             </body></html>",
        );
        let record = parse_detail(&doc, "u", provenance());
        assert_eq!(record.toxicity, None);
    }
}
