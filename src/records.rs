use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Which ChemIDplus search index a query term addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Rn,
    Name,
    InchiKey,
}

impl SourceKind {
    /// Path segment used in the search URL.
    pub fn path_segment(&self) -> &'static str {
        match self {
            SourceKind::Rn => "rn",
            SourceKind::Name => "name",
            SourceKind::InchiKey => "inchikey",
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rn" | "cas" => Ok(SourceKind::Rn),
            "name" => Ok(SourceKind::Name),
            "inchikey" => Ok(SourceKind::InchiKey),
            other => Err(format!("unknown source kind '{}'", other)),
        }
    }
}

/// Strategy for picking one candidate among several ambiguous results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    First,
    Best,
    Ask,
    Na,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(MatchPolicy::First),
            "best" => Ok(MatchPolicy::Best),
            "ask" => Ok(MatchPolicy::Ask),
            "na" => Ok(MatchPolicy::Na),
            other => Err(format!("unknown match policy '{}'", other)),
        }
    }
}

/// One entry on a multi-result listing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub name: String,
    pub registry_id: String,
}

/// How a record's candidate was selected, attached as provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTag {
    Direct,
    First,
    Distance(f64),
    Interactive,
}

impl fmt::Display for MatchTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchTag::Direct => write!(f, "direct match"),
            MatchTag::First => write!(f, "first"),
            MatchTag::Distance(d) => write!(f, "{}", d),
            MatchTag::Interactive => write!(f, "interactive"),
        }
    }
}

/// Matched-name and match-method metadata, separate from the chemical payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provenance {
    pub matched_name: Option<String>,
    pub tag: MatchTag,
}

/// A parsed HTML table as rows of named fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A physical-property table row. `value` holds the "Value" column coerced to
/// numeric; a cell that fails to parse keeps its raw text in `cells` and
/// carries `None` here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRow {
    pub cells: Vec<String>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyTable {
    pub columns: Vec<String>,
    pub rows: Vec<PropertyRow>,
}

/// Normalized substance detail record. Absent sections are `None`, never an
/// empty sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstanceRecord {
    pub name: Option<Vec<String>>,
    pub synonyms: Option<Vec<String>>,
    pub cas: Option<Vec<String>>,
    pub inchi: Option<String>,
    pub inchikey: Option<String>,
    pub smiles: Option<String>,
    pub toxicity: Option<DataTable>,
    pub physprop: Option<PropertyTable>,
    pub source_url: String,
    pub provenance: Provenance,
}

/// Per-query outcome. `NotFound` is the explicit marker for a query that
/// produced no record, distinct from absent fields inside a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "record", rename_all = "snake_case")]
pub enum Outcome {
    Found(SubstanceRecord),
    NotFound,
}

impl Outcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found(_))
    }
}

/// One batch entry, keyed by input position so duplicate query strings never
/// collide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub query: Option<String>,
    pub outcome: Outcome,
}

/// Ordered batch results, one entry per input query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub entries: Vec<QueryResult>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryResult> + '_ {
        self.entries.iter()
    }

    pub fn found_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_found()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_parses_aliases() {
        assert_eq!("rn".parse::<SourceKind>().unwrap(), SourceKind::Rn);
        assert_eq!("CAS".parse::<SourceKind>().unwrap(), SourceKind::Rn);
        assert_eq!("name".parse::<SourceKind>().unwrap(), SourceKind::Name);
        assert_eq!("InChIKey".parse::<SourceKind>().unwrap(), SourceKind::InchiKey);
        assert!("smiles".parse::<SourceKind>().is_err());
    }

    #[test]
    fn match_tag_display() {
        assert_eq!(MatchTag::Direct.to_string(), "direct match");
        assert_eq!(MatchTag::First.to_string(), "first");
        assert_eq!(MatchTag::Interactive.to_string(), "interactive");
        assert_eq!(MatchTag::Distance(0.25).to_string(), "0.25");
    }
}
