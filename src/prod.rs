//! Predictability of distribution.
//!
//! For two segments, the entropy of the choice between them, either over the
//! whole corpus or per environment. An entropy of 0 means the segments are
//! fully predictable (complementary distribution) and 1 means they are fully
//! unpredictable (contrastive).

use std::collections::BTreeSet;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::corpus::{CountWhat, Corpus};
use crate::environment::EnvironmentFilter;
use crate::error::{PhonoError, Result};
use crate::funcload::entropy;
use crate::interface::AnalysisContext;

/// Label of the row covering the whole corpus.
pub const ALL_ENVIRONMENTS: &str = "ALL";
/// Label of the frequency-weighted average row.
pub const AVERAGE: &str = "AVG";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictabilityRow {
    pub environment: String,
    pub entropy: f64,
    pub total: f64,
    pub seg1_count: f64,
    pub seg2_count: f64,
}

impl PredictabilityRow {
    fn new(environment: impl Into<String>, seg1_count: f64, seg2_count: f64) -> Self {
        let total = seg1_count + seg2_count;
        let entropy = if total == 0.0 { 0.0 } else { entropy([seg1_count / total, seg2_count / total]) };
        Self { environment: environment.into(), entropy, total, seg1_count, seg2_count }
    }
}

/// Entropy of the choice between `seg1` and `seg2` over the whole corpus,
/// from the cached unigram frequencies.
pub fn calc_prod_all_envs(
    corpus: &Corpus,
    seg1: &str,
    seg2: &str,
    sequence_type: &str,
    count_what: CountWhat,
) -> Result<PredictabilityRow> {
    let base = corpus.get_frequency_base(sequence_type, count_what, 1)?;
    Ok(PredictabilityRow::new(ALL_ENVIRONMENTS, base.unigram(seg1), base.unigram(seg2)))
}

/// Entropy of the choice between `seg1` and `seg2` in each environment, plus
/// an `AVG` row weighting each environment by its total count.
///
/// Occurrences in no environment, or in more than one, make a `strict` run
/// fail. Otherwise the uncovered ones are dropped and the overlapping ones are
/// counted in every environment they fall in. `Ok(None)` when cancelled.
#[allow(clippy::too_many_arguments)]
pub fn calc_prod(
    corpus: &Corpus,
    seg1: &str,
    seg2: &str,
    envs: &[EnvironmentFilter],
    sequence_type: &str,
    count_what: CountWhat,
    strict: bool,
    ctx: &AnalysisContext,
) -> Result<Option<Vec<PredictabilityRow>>> {
    corpus.check_sequence_type(sequence_type)?;
    let started = Instant::now();
    let total = corpus.len();
    ctx.status("Calculating predictability of distribution...");

    let mut counts = vec![(0.0, 0.0); envs.len()];
    let (mut missing, mut overlapping) = (0usize, 0usize);
    let mut missing_envs = BTreeSet::new();
    let mut overlapping_envs = BTreeSet::new();

    for (done, word) in corpus.iter().enumerate() {
        if ctx.is_cancelled() {
            return Ok(None);
        }
        ctx.tick(done + 1, total);
        let Some(sequence) = word.sequence(sequence_type) else { continue };
        let weight = count_what.weight(word);
        for (position, segment) in sequence.iter().enumerate() {
            let is_first = segment == seg1;
            if !is_first && segment != seg2 {
                continue;
            }
            let environment = sequence.get_env(position);
            let found: Vec<usize> =
                envs.iter().enumerate().filter(|(_, f)| f.contains(&environment)).map(|(i, _)| i).collect();
            match found.len() {
                0 => {
                    missing += 1;
                    missing_envs.insert(environment.to_string());
                }
                1 => (),
                _ => {
                    overlapping += 1;
                    overlapping_envs.insert(environment.to_string());
                }
            }
            for i in found {
                if is_first {
                    counts[i].0 += weight;
                } else {
                    counts[i].1 += weight;
                }
            }
        }
    }

    if missing > 0 || overlapping > 0 {
        if strict {
            return Err(PhonoError::EnvironmentCoverage {
                missing,
                overlapping,
                missing_envs: missing_envs.into_iter().collect(),
                overlapping_envs: overlapping_envs.into_iter().collect(),
            });
        }
        warn!(missing, overlapping, "environments are not exhaustive and unique");
    }

    let mut rows: Vec<PredictabilityRow> = envs
        .iter()
        .zip(&counts)
        .map(|(env, (c1, c2))| PredictabilityRow::new(env.to_string(), *c1, *c2))
        .collect();

    let grand_total: f64 = rows.iter().map(|r| r.total).sum();
    let weighted = if grand_total == 0.0 {
        0.0
    } else {
        rows.iter().map(|r| r.entropy * r.total).sum::<f64>() / grand_total
    };
    rows.push(PredictabilityRow {
        environment: AVERAGE.to_string(),
        entropy: weighted,
        total: grand_total,
        seg1_count: rows.iter().map(|r| r.seg1_count).sum(),
        seg2_count: rows.iter().map(|r| r.seg2_count).sum(),
    });
    info!(
        seg1,
        seg2,
        environments = envs.len(),
        ms = started.elapsed().as_secs_f64() * 1000.0,
        "predictability of distribution"
    );
    Ok(Some(rows))
}
