use chemid_scraper_lib::{input_loader, logger};
use chemid_scraper_lib::{MatchPolicy, Outcome, QueryEngine, QueryOptions, ResultSet, SourceKind};

use std::error::Error;
use std::fs::File;
use std::process;

use chrono::Local;
use log::{error, info};

struct CliArgs {
    from: SourceKind,
    match_policy: MatchPolicy,
    input: Option<String>,
    output: String,
    json: Option<String>,
    verbose: bool,
    queries: Vec<Option<String>>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!();
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    logger::init(args.verbose);

    let mut queries = args.queries.clone();
    if let Some(input) = &args.input {
        queries.extend(input_loader::load_queries(input));
    }
    if queries.is_empty() {
        error!("No queries given. Pass query terms or --input <file.csv>.");
        process::exit(2);
    }

    let opts = QueryOptions {
        from: args.from,
        match_policy: args.match_policy,
    };
    let engine = QueryEngine::new();
    let results = engine.query_batch(&queries, &opts);

    info!(
        "Done: {} of {} queries produced a record.",
        results.found_count(),
        results.len()
    );

    write_csv(&args.output, &results)?;
    if let Some(json_path) = &args.json {
        let file = File::create(json_path)?;
        serde_json::to_writer_pretty(file, &results)?;
        info!("Wrote JSON results to {}", json_path);
    }

    Ok(())
}

const USAGE: &str = "\
Usage: chemid_scraper [OPTIONS] [QUERY]...

Options:
  --from <rn|name|inchikey>       search index to query (default: name)
  --match <first|best|ask|na>     candidate selection policy (default: best)
  --input <file.csv>              read queries from a CSV with a `query` column
  --output <file.csv>             summary CSV (default: results.csv)
  --json <file.json>              also write full records as JSON
  --quiet                         warnings only";

fn parse_args() -> Result<CliArgs, String> {
    let mut args = CliArgs {
        from: SourceKind::Name,
        match_policy: MatchPolicy::Best,
        input: None,
        output: "results.csv".to_string(),
        json: None,
        verbose: true,
        queries: Vec::new(),
    };

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--from" => {
                let v = it.next().ok_or("--from needs a value")?;
                args.from = v.parse()?;
            }
            "--match" => {
                let v = it.next().ok_or("--match needs a value")?;
                args.match_policy = v.parse()?;
            }
            "--input" => args.input = Some(it.next().ok_or("--input needs a value")?),
            "--output" => args.output = it.next().ok_or("--output needs a value")?,
            "--json" => args.json = Some(it.next().ok_or("--json needs a value")?),
            "--quiet" => args.verbose = false,
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown option '{}'", other));
            }
            term => args.queries.push(Some(term.to_string())),
        }
    }

    Ok(args)
}

fn write_csv(path: &str, results: &ResultSet) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "query",
        "status",
        "name",
        "cas",
        "inchikey",
        "smiles",
        "matched_name",
        "match",
        "source_url",
        "timestamp",
    ])?;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    for entry in results.iter() {
        let query = entry.query.clone().unwrap_or_default();
        let row: Vec<String> = match &entry.outcome {
            Outcome::Found(record) => vec![
                query,
                "found".to_string(),
                record
                    .name
                    .as_ref()
                    .and_then(|n| n.first().cloned())
                    .unwrap_or_default(),
                record.cas.as_ref().map(|c| c.join("; ")).unwrap_or_default(),
                record.inchikey.clone().unwrap_or_default(),
                record.smiles.clone().unwrap_or_default(),
                record.provenance.matched_name.clone().unwrap_or_default(),
                record.provenance.tag.to_string(),
                record.source_url.clone(),
                timestamp.clone(),
            ],
            Outcome::NotFound => {
                let mut row = vec![query, "not_found".to_string()];
                row.extend(std::iter::repeat(String::new()).take(7));
                row.push(timestamp.clone());
                row
            }
        };
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!("Wrote summary CSV to {}", path);
    Ok(())
}
