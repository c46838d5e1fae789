//! Phonological search: where do given segments occur, optionally restricted
//! to environments.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::corpus::Corpus;
use crate::environment::EnvironmentFilter;
use crate::error::Result;
use crate::interface::AnalysisContext;
use crate::transcription::Environment;

/// One occurrence of a searched segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMatch {
    pub position: usize,
    pub segment: String,
    pub environment: Environment,
    /// The first filter the occurrence fell in, `None` for an unconditional search.
    pub filter: Option<String>,
}

/// A word with at least one match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub key: String,
    pub spelling: String,
    pub frequency: f64,
    pub matches: Vec<SearchMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSummaryRow {
    pub segment: String,
    pub environment: String,
    pub type_frequency: usize,
    pub token_frequency: f64,
}

/// Finds every position of `sequence_type` holding one of `segments`.
///
/// With `envs` set to `None` every occurrence matches. Otherwise an
/// occurrence matches when its environment is in one of the filters, and it
/// is recorded against the first such filter only. Returns `Ok(None)` when
/// cancelled.
pub fn phonological_search(
    corpus: &Corpus,
    segments: &[&str],
    envs: Option<&[EnvironmentFilter]>,
    sequence_type: &str,
    ctx: &AnalysisContext,
) -> Result<Option<Vec<SearchResult>>> {
    corpus.check_sequence_type(sequence_type)?;
    let started = Instant::now();
    let total = corpus.len();
    ctx.status("Searching...");
    ctx.report(0, total);

    let mut results = Vec::new();
    for (done, (key, word)) in corpus.entries().enumerate() {
        if ctx.is_cancelled() {
            return Ok(None);
        }
        ctx.tick(done + 1, total);
        let Some(sequence) = word.sequence(sequence_type) else { continue };
        let mut matches = Vec::new();
        for (position, segment) in sequence.iter().enumerate() {
            if !segments.contains(&segment) {
                continue;
            }
            let environment = sequence.get_env(position);
            let filter = match envs {
                None => None,
                Some(filters) => match filters.iter().find(|f| f.contains(&environment)) {
                    Some(f) => Some(f.to_string()),
                    None => continue,
                },
            };
            matches.push(SearchMatch { position, segment: segment.to_string(), environment, filter });
        }
        if !matches.is_empty() {
            results.push(SearchResult {
                key: key.to_string(),
                spelling: word.spelling().to_string(),
                frequency: word.frequency(),
                matches,
            });
        }
    }
    info!(
        segments = %segments.join(","),
        words = results.len(),
        ms = started.elapsed().as_secs_f64() * 1000.0,
        "search complete"
    );
    Ok(Some(results))
}

/// Type and token counts per segment and matched environment.
pub fn summarize_search(results: &[SearchResult]) -> Vec<SearchSummaryRow> {
    let mut rows: BTreeMap<(String, String), (usize, f64)> = BTreeMap::new();
    for result in results {
        for m in &result.matches {
            let key = (m.segment.clone(), m.filter.clone().unwrap_or_default());
            let row = rows.entry(key).or_insert((0, 0.0));
            row.0 += 1;
            row.1 += result.frequency;
        }
    }
    rows.into_iter()
        .map(|((segment, environment), (type_frequency, token_frequency))| SearchSummaryRow {
            segment,
            environment,
            type_frequency,
            token_frequency,
        })
        .collect()
}
