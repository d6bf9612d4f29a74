use std::fs::File;
use std::path::Path;

use log::{error, info};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(rename = "query", alias = "Query", alias = "name", alias = "Name")]
    query: String,
}

/// Load a batch of query terms from a CSV with a `query` column. Empty cells
/// and literal `NA` become the missing marker, which the engine short-circuits
/// to not-found without a fetch.
pub fn load_queries<P: AsRef<Path>>(filename: P) -> Vec<Option<String>> {
    let path = filename.as_ref();
    let mut queries = Vec::new();

    if !path.exists() {
        error!("Input file {:?} does not exist.", path);
        return queries;
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            error!("Could not open input file: {}", e);
            return queries;
        }
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    for result in rdr.deserialize::<QueryRow>() {
        match result {
            Ok(row) => {
                let term = row.query.trim().to_string();
                if term.is_empty() || term == "NA" {
                    queries.push(None);
                } else {
                    queries.push(Some(term));
                }
            }
            Err(e) => {
                error!("Error parsing input record: {}", e);
            }
        }
    }

    info!("Loaded {} queries from {:?}", queries.len(), path);
    queries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn empty_and_na_cells_become_missing_markers() {
        let dir = std::env::temp_dir();
        let path = dir.join("chemid_scraper_queries_test.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "query").unwrap();
        writeln!(f, "Formaldehyde").unwrap();
        writeln!(f, "NA").unwrap();
        writeln!(f, "").unwrap();
        writeln!(f, "50-00-0").unwrap();
        drop(f);

        let queries = load_queries(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(
            queries,
            vec![
                Some("Formaldehyde".to_string()),
                None,
                Some("50-00-0".to_string()),
            ]
        );
    }

    #[test]
    fn missing_file_loads_nothing() {
        let queries = load_queries("definitely/not/a/real/file.csv");
        assert!(queries.is_empty());
    }
}
