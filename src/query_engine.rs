use log::{info, warn};

use crate::classifier::{self, Classification};
use crate::delay_manager;
use crate::extractor;
use crate::fetcher::PageFetcher;
use crate::matcher;
use crate::records::{
    MatchPolicy, MatchTag, Outcome, Provenance, QueryResult, ResultSet, SourceKind,
};

const DEFAULT_BASE_URL: &str = "https://chem.nlm.nih.gov/chemidplus";
const ROWS_PER_PAGE: u32 = 50;

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub from: SourceKind,
    pub match_policy: MatchPolicy,
}

/// Drives one query end-to-end: search fetch, classification, candidate
/// matching, detail re-fetch, detail parsing. Queries in a batch are
/// processed independently and sequentially; no failure aborts the batch.
pub struct QueryEngine {
    fetcher: PageFetcher,
    base_url: String,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the engine at a mirror or test server.
    pub fn with_base_url(base_url: &str) -> Self {
        QueryEngine {
            fetcher: PageFetcher::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn search_url(&self, term: &str, from: SourceKind) -> String {
        let encoded = urlencoding::encode(term);
        format!(
            "{}/{}/startswith/{}?DT_START_ROW=0&DT_ROWS_PER_PAGE={}",
            self.base_url,
            from.path_segment(),
            encoded,
            ROWS_PER_PAGE
        )
    }

    pub fn detail_url(&self, registry_id: &str) -> String {
        format!("{}/rn/{}", self.base_url, registry_id)
    }

    /// Map a batch of queries to a batch of outcomes, one entry per input in
    /// input order. Duplicate query strings stay separate entries.
    pub fn query_batch(&self, queries: &[Option<String>], opts: &QueryOptions) -> ResultSet {
        let total = queries.len();
        let mut entries = Vec::with_capacity(total);

        for (i, query) in queries.iter().enumerate() {
            info!(
                "Processing {} / {} : {}",
                i + 1,
                total,
                query.as_deref().unwrap_or("<missing>")
            );
            let outcome = self.query_one(query.as_deref(), opts);
            entries.push(QueryResult {
                query: query.clone(),
                outcome,
            });
        }

        ResultSet { entries }
    }

    /// Per-query state machine. Every terminal failure is logged and becomes
    /// the not-found marker; nothing propagates to the caller.
    pub fn query_one(&self, query: Option<&str>, opts: &QueryOptions) -> Outcome {
        let Some(term) = query else {
            info!("Query is missing, skipping without a fetch");
            return Outcome::NotFound;
        };

        let search_url = self.search_url(term, opts.from);
        info!("Querying {}", search_url);
        delay_manager::wait_before_request();
        let doc = match self.fetcher.fetch(&search_url) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Failed to fetch search page for '{}': {}", term, e);
                return Outcome::NotFound;
            }
        };

        match classifier::classify(&doc) {
            Classification::NotFound => {
                info!("No records found for '{}'", term);
                Outcome::NotFound
            }
            Classification::DirectMatch => {
                let source_url = search_url.split('?').next().unwrap_or(&search_url);
                let provenance = Provenance {
                    matched_name: extractor::principal_name(&doc),
                    tag: MatchTag::Direct,
                };
                Outcome::Found(extractor::parse_detail(&doc, source_url, provenance))
            }
            Classification::MultipleCandidates(candidates) => {
                self.resolve_candidates(term, &candidates, opts)
            }
        }
    }

    fn resolve_candidates(
        &self,
        term: &str,
        candidates: &[crate::records::Candidate],
        opts: &QueryOptions,
    ) -> Outcome {
        let decision = matcher::select(opts.match_policy, candidates, term);
        let Some(chosen) = decision.candidate else {
            info!("No candidate selected for '{}'", term);
            return Outcome::NotFound;
        };
        if chosen.registry_id.trim().is_empty() {
            info!("Selected candidate for '{}' has no identifier", term);
            return Outcome::NotFound;
        }

        let detail_url = self.detail_url(&chosen.registry_id);
        info!("Fetching record details from {}", detail_url);
        delay_manager::wait_before_request();
        let doc = match self.fetcher.fetch(&detail_url) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Failed to fetch detail page for '{}': {}", term, e);
                return Outcome::NotFound;
            }
        };

        let provenance = Provenance {
            matched_name: decision.matched_name,
            tag: decision.tag.unwrap_or(MatchTag::First),
        };
        Outcome::Found(extractor::parse_detail(&doc, &detail_url, provenance))
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> QueryOptions {
        QueryOptions {
            from: SourceKind::Name,
            match_policy: MatchPolicy::Best,
        }
    }

    #[test]
    fn search_url_matches_service_template() {
        let engine = QueryEngine::with_base_url("https://chem.example.org/chemidplus/");
        assert_eq!(
            engine.search_url("formic acid", SourceKind::Name),
            "https://chem.example.org/chemidplus/name/startswith/formic%20acid\
             ?DT_START_ROW=0&DT_ROWS_PER_PAGE=50"
        );
        assert_eq!(
            engine.search_url("50-00-0", SourceKind::Rn),
            "https://chem.example.org/chemidplus/rn/startswith/50-00-0\
             ?DT_START_ROW=0&DT_ROWS_PER_PAGE=50"
        );
        assert_eq!(
            engine.search_url("WSFSSNUMVMOOMR-UHFFFAOYSA-N", SourceKind::InchiKey),
            "https://chem.example.org/chemidplus/inchikey/startswith/\
             WSFSSNUMVMOOMR-UHFFFAOYSA-N?DT_START_ROW=0&DT_ROWS_PER_PAGE=50"
        );
    }

    #[test]
    fn detail_url_matches_service_template() {
        let engine = QueryEngine::with_base_url("https://chem.example.org/chemidplus");
        assert_eq!(
            engine.detail_url("50-00-0"),
            "https://chem.example.org/chemidplus/rn/50-00-0"
        );
    }

    #[test]
    fn missing_query_short_circuits_without_network() {
        // unroutable base URL: any attempted fetch would error loudly, but a
        // missing query must return before the rate limiter and the fetcher
        let engine = QueryEngine::with_base_url("http://127.0.0.1:1");
        assert_eq!(engine.query_one(None, &opts()), Outcome::NotFound);
    }

    #[test]
    fn batch_preserves_length_order_and_duplicates() {
        let engine = QueryEngine::with_base_url("http://127.0.0.1:1");
        let queries = vec![None, None, None];
        let results = engine.query_batch(&queries, &opts());
        assert_eq!(results.len(), 3);
        for entry in results.iter() {
            assert_eq!(entry.query, None);
            assert_eq!(entry.outcome, Outcome::NotFound);
        }
    }
}
