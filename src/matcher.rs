use std::io::{self, BufRead, Write};

use log::info;
use regex::Regex;

use crate::records::{Candidate, MatchPolicy, MatchTag};

/// Result of applying a match policy to a candidate list. `candidate` is
/// `None` when the policy yields no selection, which short-circuits the query
/// to not-found.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDecision {
    pub candidate: Option<Candidate>,
    pub matched_name: Option<String>,
    pub tag: Option<MatchTag>,
}

impl MatchDecision {
    fn none() -> Self {
        MatchDecision {
            candidate: None,
            matched_name: None,
            tag: None,
        }
    }
}

/// Apply the configured match policy. The `ask` policy reads from stdin.
pub fn select(policy: MatchPolicy, candidates: &[Candidate], query: &str) -> MatchDecision {
    let stdin = io::stdin();
    let mut locked = stdin.lock();
    select_with_input(policy, candidates, query, &mut locked)
}

/// Same as [`select`] with an injectable input source for the `ask` policy.
pub fn select_with_input<R: BufRead>(
    policy: MatchPolicy,
    candidates: &[Candidate],
    query: &str,
    input: &mut R,
) -> MatchDecision {
    if candidates.is_empty() || policy == MatchPolicy::Na {
        return MatchDecision::none();
    }

    match policy {
        MatchPolicy::Na => unreachable!(),
        MatchPolicy::First => {
            let chosen = candidates[0].clone();
            MatchDecision {
                matched_name: Some(chosen.name.clone()),
                candidate: Some(chosen),
                tag: Some(MatchTag::First),
            }
        }
        MatchPolicy::Best => select_best(candidates, query),
        MatchPolicy::Ask => match ask_selection(candidates, input) {
            Some(idx) => {
                let chosen = candidates[idx].clone();
                MatchDecision {
                    matched_name: Some(chosen.name.clone()),
                    candidate: Some(chosen),
                    tag: Some(MatchTag::Interactive),
                }
            }
            None => MatchDecision::none(),
        },
    }
}

/// Pick the candidate with the lowest normalized edit distance to the query.
/// The distance is divided by the stripped candidate name length, not the
/// query length; ties go to the first occurrence.
fn select_best(candidates: &[Candidate], query: &str) -> MatchDecision {
    let mut best_idx = 0;
    let mut best_name = String::new();
    let mut best_dist = f64::INFINITY;

    for (i, cand) in candidates.iter().enumerate() {
        let stripped = strip_annotation(&cand.name);
        let len = stripped.chars().count().max(1);
        let dist = strsim::levenshtein(query, &stripped) as f64 / len as f64;
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
            best_name = stripped;
        }
    }

    info!(
        "Best match for '{}': '{}' (distance {:.4})",
        query, best_name, best_dist
    );
    MatchDecision {
        candidate: Some(candidates[best_idx].clone()),
        matched_name: Some(best_name),
        tag: Some(MatchTag::Distance(best_dist)),
    }
}

/// Drop a trailing bracketed annotation, e.g. "Acetone [USP]" -> "Acetone".
fn strip_annotation(name: &str) -> String {
    let re = Regex::new(r" \[.*\]").unwrap();
    re.replace_all(name, "").trim().to_string()
}

/// Present the candidate list and read one index. Empty, unparsable, or
/// out-of-range input is an explicit "no selection".
fn ask_selection<R: BufRead>(candidates: &[Candidate], input: &mut R) -> Option<usize> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (i, cand) in candidates.iter().enumerate() {
        let _ = writeln!(out, "{}: {} ({})", i, cand.name, cand.registry_id);
    }
    let _ = write!(out, "Select a record (0-{}): ", candidates.len() - 1);
    let _ = out.flush();

    let mut line = String::new();
    if input.read_line(&mut line).is_err() {
        return None;
    }
    let idx: usize = line.trim().parse().ok()?;
    if idx < candidates.len() {
        Some(idx)
    } else {
        None
    }
}
