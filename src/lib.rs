pub mod classifier;
pub mod delay_manager;
pub mod extractor;
pub mod fetcher;
pub mod input_loader;
pub mod logger;
pub mod matcher;
pub mod query_engine;
pub mod records;

// Exporting types for convenience
pub use classifier::Classification;
pub use fetcher::{FetchError, PageFetcher};
pub use matcher::MatchDecision;
pub use query_engine::{QueryEngine, QueryOptions};
pub use records::{
    Candidate, DataTable, MatchPolicy, MatchTag, Outcome, PropertyRow, PropertyTable, Provenance,
    QueryResult, ResultSet, SourceKind, SubstanceRecord,
};
