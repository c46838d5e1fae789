//! Functional load of segment contrasts.
//!
//! Two measures are provided. The minimal-pair measure counts the distinct
//! word pairs that a merger of the contrasted segments would make identical.
//! The delta-entropy measure is the drop in entropy of the lexicon's
//! transcription distribution caused by the merger. Both accept several
//! pairs at once, each merged to its own placeholder.

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::corpus::{CountWhat, Corpus, OtherHasher};
use crate::error::{PhonoError, Result};
use crate::interface::AnalysisContext;
use crate::transcription::Transcription;
use crate::word::{TRANSCRIPTION, Word};

/// Shannon entropy in bits. Zero probabilities contribute nothing.
pub fn entropy<I: IntoIterator<Item = f64>>(probabilities: I) -> f64 {
    -probabilities.into_iter().filter(|p| *p > 0.0).map(|p| p * p.log2()).sum::<f64>()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinPairOptions {
    /// Words below this frequency are ignored. Zero disables the cutoff.
    pub frequency_cutoff: f64,
    /// Divide the pair count by the number of words containing any contrasted segment.
    pub relative_count: bool,
    /// Count homophonous spellings of the same pair separately.
    pub distinguish_homophones: bool,
    pub sequence_type: String,
}

impl Default for MinPairOptions {
    fn default() -> Self {
        Self {
            frequency_cutoff: 0.0,
            relative_count: true,
            distinguish_homophones: false,
            sequence_type: TRANSCRIPTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeltaHOptions {
    pub frequency_cutoff: f64,
    pub count_what: CountWhat,
    pub sequence_type: String,
}

impl Default for DeltaHOptions {
    fn default() -> Self {
        Self { frequency_cutoff: 0.0, count_what: CountWhat::Token, sequence_type: TRANSCRIPTION.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionalLoadMeasure {
    MinimalPairs(MinPairOptions),
    DeltaH(DeltaHOptions),
}

impl FunctionalLoadMeasure {
    fn label(&self) -> &'static str {
        match self {
            FunctionalLoadMeasure::MinimalPairs(_) => "minimal pairs",
            FunctionalLoadMeasure::DeltaH(_) => "change in entropy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionalLoadRow {
    pub segment1: String,
    pub segment2: String,
    pub measure: String,
    pub value: f64,
}

/// A merged symbol, or an untouched one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Neutralized {
    Merged(usize),
    Kept(String),
}

fn neutralize(sequence: &Transcription, pairs: &[(&str, &str)]) -> Vec<Neutralized> {
    sequence
        .iter()
        .map(|s| match pairs.iter().position(|(a, b)| s == *a || s == *b) {
            Some(i) => Neutralized::Merged(i),
            None => Neutralized::Kept(s.to_string()),
        })
        .collect()
}

fn check_pairs(pairs: &[(&str, &str)]) -> Result<()> {
    if pairs.is_empty() {
        return Err(PhonoError::InvalidArgument("at least one segment pair is needed".into()));
    }
    Ok(())
}

fn above_cutoff(word: &Word, cutoff: f64) -> bool {
    cutoff <= 0.0 || word.frequency() >= cutoff
}

/// Number of minimal pairs for the given contrasts, or that number divided
/// by the count of words containing any contrasted segment. `Ok(None)` when
/// cancelled.
pub fn minpair_fl(
    corpus: &Corpus,
    pairs: &[(&str, &str)],
    options: &MinPairOptions,
    ctx: &AnalysisContext,
) -> Result<Option<f64>> {
    check_pairs(pairs)?;
    corpus.check_sequence_type(&options.sequence_type)?;
    let started = Instant::now();
    let symbols: Vec<&str> = pairs.iter().flat_map(|(a, b)| [*a, *b]).collect();
    let total = corpus.len();

    let mut scope = corpus.words_containing(&symbols, &options.sequence_type)?;
    let mut distinct: BTreeSet<(Transcription, String)> = BTreeSet::new();
    for (done, word) in corpus.iter().enumerate() {
        if ctx.is_cancelled() {
            return Ok(None);
        }
        ctx.tick(done + 1, total);
        let index = done as u32;
        if !scope.contains(index) {
            continue;
        }
        if !above_cutoff(word, options.frequency_cutoff) {
            scope.remove(index);
            continue;
        }
        if let Some(sequence) = word.sequence(&options.sequence_type) {
            distinct.insert((sequence.clone(), word.spelling().to_lowercase()));
        }
    }
    let scope = scope.len();

    let mut groups: HashMap<Vec<Neutralized>, Vec<&(Transcription, String)>, OtherHasher> = HashMap::default();
    for entry in &distinct {
        groups.entry(neutralize(&entry.0, pairs)).or_default().push(entry);
    }

    let mut count = 0usize;
    let mut seen: BTreeSet<(&Transcription, &Transcription)> = BTreeSet::new();
    for members in groups.values() {
        if ctx.is_cancelled() {
            return Ok(None);
        }
        for (i, first) in members.iter().enumerate() {
            for second in &members[i + 1..] {
                if first.1 == second.1 || first.0 == second.0 {
                    continue;
                }
                if options.distinguish_homophones {
                    count += 1;
                } else {
                    let key = if first.0 <= second.0 { (&first.0, &second.0) } else { (&second.0, &first.0) };
                    if seen.insert(key) {
                        count += 1;
                    }
                }
            }
        }
    }

    let result = if !options.relative_count {
        count as f64
    } else if scope == 0 {
        0.0
    } else {
        count as f64 / scope as f64
    };
    info!(pairs = count, scope, ms = started.elapsed().as_secs_f64() * 1000.0, "minimal pair functional load");
    Ok(Some(result))
}

/// Entropy of the distribution over transcriptions minus the entropy after
/// merging every pair. `Ok(None)` when cancelled.
pub fn deltah_fl(
    corpus: &Corpus,
    pairs: &[(&str, &str)],
    options: &DeltaHOptions,
    ctx: &AnalysisContext,
) -> Result<Option<f64>> {
    check_pairs(pairs)?;
    corpus.check_sequence_type(&options.sequence_type)?;
    let started = Instant::now();
    let total = corpus.len();

    let mut weights: HashMap<&Transcription, f64, OtherHasher> = HashMap::default();
    let mut freq_sum = 0.0;
    for (done, word) in corpus.iter().enumerate() {
        if ctx.is_cancelled() {
            return Ok(None);
        }
        ctx.tick(done + 1, total);
        if !above_cutoff(word, options.frequency_cutoff) {
            continue;
        }
        let Some(sequence) = word.sequence(&options.sequence_type) else { continue };
        let weight = options.count_what.weight(word);
        *weights.entry(sequence).or_insert(0.0) += weight;
        freq_sum += weight;
    }
    if freq_sum == 0.0 {
        return Ok(Some(0.0));
    }

    let original: Vec<(&Transcription, f64)> = weights.into_iter().map(|(t, w)| (t, w / freq_sum)).collect();
    let mut merged: HashMap<Vec<Neutralized>, f64, OtherHasher> = HashMap::default();
    for (sequence, p) in &original {
        *merged.entry(neutralize(sequence, pairs)).or_insert(0.0) += p;
    }
    let before = entropy(original.iter().map(|(_, p)| *p));
    let after = entropy(merged.values().copied());
    info!(bits = before - after, ms = started.elapsed().as_secs_f64() * 1000.0, "change in entropy");
    Ok(Some(before - after))
}

/// One row per pair, each pair measured on its own. `Ok(None)` when cancelled.
pub fn functional_load_table(
    corpus: &Corpus,
    pairs: &[(&str, &str)],
    measure: &FunctionalLoadMeasure,
    ctx: &AnalysisContext,
) -> Result<Option<Vec<FunctionalLoadRow>>> {
    let mut rows = Vec::with_capacity(pairs.len());
    // per-word progress inside each measure would be misleading here
    let inner = AnalysisContext::new().with_cancel(ctx.cancel_token().clone());
    ctx.status("Calculating functional load...");
    for (done, pair) in pairs.iter().enumerate() {
        if ctx.is_cancelled() {
            return Ok(None);
        }
        let value = match measure {
            FunctionalLoadMeasure::MinimalPairs(options) => minpair_fl(corpus, &[*pair], options, &inner)?,
            FunctionalLoadMeasure::DeltaH(options) => deltah_fl(corpus, &[*pair], options, &inner)?,
        };
        let Some(value) = value else { return Ok(None) };
        rows.push(FunctionalLoadRow {
            segment1: pair.0.to_string(),
            segment2: pair.1.to_string(),
            measure: measure.label().to_string(),
            value,
        });
        ctx.report(done + 1, pairs.len());
    }
    Ok(Some(rows))
}
