//! The in-memory lexicon.
//!
//! A [`Corpus`] keeps its words in insertion order under unique keys. Words
//! sharing a spelling are stored as `spelling`, `spelling (1)`, `spelling (2)`
//! and so on. The corpus also tracks the segment inventory, the orthography,
//! the registered tiers and a cache of frequency tables. Any mutation of the
//! word list or the tiers invalidates the cache.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::hash::BuildHasherDefault;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use lazy_static::lazy_static;
use regex::Regex;
use roaring::RoaringBitmap;
use seahash::SeaHasher;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PhonoError, Result};
use crate::features::FeatureMatrix;
use crate::notation::{FeatureSpec, FeatureToken};
use crate::segment::{BOUNDARY, Category, FeatureValues, Segment};
use crate::transcription::Transcription;
use crate::word::{AttributeValue, FieldValue, FREQUENCY, SPELLING, TRANSCRIPTION, Word};

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

/// Symbol used for consonants on a CV skeleton tier.
pub const CONSONANT_SYMBOL: &str = "C";
/// Symbol used for vowels and diphthongs on a CV skeleton tier.
pub const VOWEL_SYMBOL: &str = "V";

lazy_static! {
    static ref DUPLICATE_KEY: Regex = Regex::new(r"^(?P<spelling>.*) \((?P<n>[0-9]+)\)$").unwrap();
}

/// The spelling a stored key was derived from, with any ` (n)` suffix removed.
pub fn spelling_of_key(key: &str) -> &str {
    DUPLICATE_KEY
        .captures(key)
        .and_then(|c| c.name("spelling"))
        .map(|m| m.as_str())
        .unwrap_or(key)
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut previous_cased = false;
    for c in s.chars() {
        if previous_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_cased = c.is_alphabetic();
    }
    out
}

/// Adds the unseen symbols of `word` to `inventory`. Returns whether the word has a transcription.
fn register_segments(inventory: &mut BTreeMap<String, Segment>, matrix: Option<&FeatureMatrix>, word: &Word) -> bool {
    let Some(transcription) = word.transcription() else { return false };
    for s in transcription.iter() {
        if !inventory.contains_key(s) {
            let mut segment = Segment::new(s);
            if let Some(values) = matrix.and_then(|m| m.get(s)) {
                segment.specify(values.clone());
            }
            inventory.insert(s.to_string(), segment);
        }
    }
    true
}

// ------------- Counting -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountWhat {
    /// Every word counts once.
    #[default]
    Type,
    /// Every word counts with its frequency.
    Token,
}

impl CountWhat {
    pub fn weight(self, word: &Word) -> f64 {
        match self {
            CountWhat::Type => 1.0,
            CountWhat::Token => word.frequency(),
        }
    }
}

impl FromStr for CountWhat {
    type Err = PhonoError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "type" => Ok(CountWhat::Type),
            "token" => Ok(CountWhat::Token),
            other => Err(PhonoError::InvalidArgument(format!("count_what must be 'type' or 'token', not '{}'", other))),
        }
    }
}

impl fmt::Display for CountWhat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CountWhat::Type => write!(f, "type"),
            CountWhat::Token => write!(f, "token"),
        }
    }
}

/// Weighted n-gram counts over one sequence type of a corpus.
#[derive(Debug, Clone, Default)]
pub struct FrequencyBase {
    counts: HashMap<Vec<String>, f64, OtherHasher>,
    total: f64,
}

impl FrequencyBase {
    pub fn total(&self) -> f64 {
        self.total
    }
    pub fn len(&self) -> usize {
        self.counts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
    pub fn count(&self, gram: &[&str]) -> f64 {
        let key: Vec<String> = gram.iter().map(|s| s.to_string()).collect();
        self.counts.get(&key).copied().unwrap_or(0.0)
    }
    pub fn unigram(&self, symbol: &str) -> f64 {
        self.count(&[symbol])
    }
    /// Count divided by the grand total. A zero total gives zero.
    pub fn probability(&self, gram: &[&str]) -> f64 {
        if self.total == 0.0 { 0.0 } else { self.count(gram) / self.total }
    }
    pub fn grams(&self) -> impl Iterator<Item = (&[String], f64)> {
        self.counts.iter().map(|(k, v)| (k.as_slice(), *v))
    }
    pub fn probabilities(&self) -> HashMap<Vec<String>, f64, OtherHasher> {
        self.counts
            .iter()
            .map(|(k, v)| (k.clone(), if self.total == 0.0 { 0.0 } else { v / self.total }))
            .collect()
    }
}

type PositionedGram = (Vec<String>, Option<usize>);

/// Like [`FrequencyBase`], but optionally keyed by the start position of each
/// n-gram, with one total per position.
#[derive(Debug, Clone, Default)]
pub struct PhoneProbabilities {
    preserve_position: bool,
    counts: HashMap<PositionedGram, f64, OtherHasher>,
    position_totals: BTreeMap<usize, f64>,
    total: f64,
}

impl PhoneProbabilities {
    pub fn preserve_position(&self) -> bool {
        self.preserve_position
    }
    pub fn total(&self) -> f64 {
        self.total
    }
    pub fn position_total(&self, position: usize) -> f64 {
        self.position_totals.get(&position).copied().unwrap_or(0.0)
    }
    pub fn len(&self) -> usize {
        self.counts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
    /// `position` is ignored unless positions are preserved.
    pub fn count(&self, gram: &[&str], position: usize) -> f64 {
        let key: PositionedGram =
            (gram.iter().map(|s| s.to_string()).collect(), self.preserve_position.then_some(position));
        self.counts.get(&key).copied().unwrap_or(0.0)
    }
    /// Normalised by the per-position total when positions are preserved,
    /// by the grand total otherwise.
    pub fn probability(&self, gram: &[&str], position: usize) -> f64 {
        let denominator = if self.preserve_position { self.position_total(position) } else { self.total };
        if denominator == 0.0 { 0.0 } else { self.count(gram, position) / denominator }
    }
    pub fn entries(&self) -> impl Iterator<Item = (&[String], Option<usize>, f64)> {
        self.counts.iter().map(|((g, p), v)| (g.as_slice(), *p, *v))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BaseKey {
    sequence_type: String,
    count_what: CountWhat,
    gramsize: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PhoneKey {
    base: BaseKey,
    preserve_position: bool,
    log_count: bool,
}

#[derive(Debug, Default)]
struct StatsCache {
    bases: HashMap<BaseKey, Arc<FrequencyBase>>,
    phones: HashMap<PhoneKey, Arc<PhoneProbabilities>>,
}

impl StatsCache {
    fn clear(&mut self) {
        self.bases.clear();
        self.phones.clear();
    }
}

// ------------- Tiers -------------
/// How a tier is defined when it is added.
#[derive(Debug, Clone, PartialEq)]
pub enum TierSpec {
    Segments(Vec<String>),
    Features(FeatureSpec),
}

#[derive(Debug, Clone, PartialEq)]
enum TierDefinition {
    Filter(BTreeSet<String>),
    Skeleton(BTreeMap<String, String>),
}

impl TierDefinition {
    fn apply(&self, name: &str, word: &mut Word) {
        match self {
            TierDefinition::Filter(allowed) => word.add_tier(name, |s| allowed.contains(s)),
            TierDefinition::Skeleton(mapping) => {
                let tier: Transcription = word
                    .transcription()
                    .map(|t| t.iter().filter_map(|s| mapping.get(s).cloned()).collect())
                    .unwrap_or_default();
                word.set_attribute(name, AttributeValue::Tier(tier));
            }
        }
    }
}

// ------------- Corpus -------------
#[derive(Debug)]
pub struct Corpus {
    name: String,
    entries: Vec<(String, Word)>,
    index: HashMap<String, usize, OtherHasher>,
    inventory: BTreeMap<String, Segment>,
    orthography: BTreeSet<char>,
    has_spelling: bool,
    has_transcription: bool,
    tiers: Vec<String>,
    tier_definitions: HashMap<String, TierDefinition, OtherHasher>,
    specifier: Option<Arc<FeatureMatrix>>,
    cache: Mutex<StatsCache>,
}

impl Corpus {
    pub fn new(name: impl Into<String>) -> Self {
        let mut inventory = BTreeMap::new();
        inventory.insert(BOUNDARY.to_string(), Segment::boundary());
        Self {
            name: name.into(),
            entries: Vec::new(),
            index: HashMap::default(),
            inventory,
            orthography: BTreeSet::from(['#']),
            has_spelling: false,
            has_transcription: false,
            tiers: Vec::new(),
            tier_definitions: HashMap::default(),
            specifier: None,
            cache: Mutex::new(StatsCache::default()),
        }
    }

    /// Builds a corpus from flat word records.
    pub fn from_records<I, R, K>(name: impl Into<String>, records: I, allow_duplicates: bool) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, FieldValue)>,
        K: AsRef<str>,
    {
        let mut corpus = Self::new(name);
        for record in records {
            corpus.add_word(Word::from_fields(record)?, allow_duplicates);
        }
        Ok(corpus)
    }

    /// Builds a corpus from a JSON array of flat word objects.
    pub fn from_json(name: impl Into<String>, json: &Value, allow_duplicates: bool) -> Result<Self> {
        let records = json
            .as_array()
            .ok_or_else(|| PhonoError::InvalidArgument("word records must be a JSON array".into()))?;
        let mut corpus = Self::new(name);
        for record in records {
            corpus.add_word(Word::from_json(record)?, allow_duplicates);
        }
        Ok(corpus)
    }

    /// Reassembles a corpus from previously stored parts and checks it with
    /// [`Corpus::restore_check`].
    pub fn from_parts(
        name: impl Into<String>,
        entries: Vec<(String, Word)>,
        inventory: Vec<String>,
        tiers: Vec<String>,
    ) -> Result<Self> {
        let mut corpus = Self::new(name);
        corpus.inventory = inventory.into_iter().map(|s| (s.clone(), Segment::new(s))).collect();
        for (key, word) in entries {
            if corpus.index.contains_key(&key) {
                return Err(PhonoError::Integrity { message: format!("duplicate key '{}'", key) });
            }
            corpus.has_spelling = true;
            corpus.has_transcription |= word.transcription().is_some();
            corpus.orthography.extend(word.spelling().chars());
            corpus.index.insert(key.clone(), corpus.entries.len());
            corpus.entries.push((key, word));
        }
        corpus.tiers = tiers;
        corpus.restore_check()?;
        Ok(corpus)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn has_spelling(&self) -> bool {
        self.has_spelling
    }
    pub fn has_transcription(&self) -> bool {
        self.has_transcription
    }
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }
    /// The word stored under exactly `key`.
    pub fn get(&self, key: &str) -> Option<&Word> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }
    /// The word at an insertion-order index, as used by [`Corpus::words_containing`].
    pub fn word_at(&self, index: usize) -> Option<&Word> {
        self.entries.get(index).map(|(_, w)| w)
    }
    /// Words in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Word> {
        self.entries.iter().map(|(_, w)| w)
    }
    /// Keys and words in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Word)> {
        self.entries.iter().map(|(k, w)| (k.as_str(), w))
    }
    /// Words ordered by key.
    pub fn iter_sort(&self) -> impl Iterator<Item = &Word> {
        let mut keys: Vec<(&String, usize)> = self.index.iter().map(|(k, i)| (k, *i)).collect();
        keys.sort();
        keys.into_iter().map(|(_, i)| &self.entries[i].1)
    }
    /// Sorted keys.
    pub fn words(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.index.keys().cloned().collect();
        keys.sort();
        keys
    }
    pub fn attributes(&self) -> Vec<String> {
        let mut attributes = Vec::new();
        if self.has_spelling {
            attributes.push(SPELLING.to_string());
        }
        if self.has_transcription {
            attributes.push(TRANSCRIPTION.to_string());
        }
        attributes.push(FREQUENCY.to_string());
        attributes.extend(self.tiers.iter().cloned());
        attributes
    }
    pub fn tiers(&self) -> &[String] {
        &self.tiers
    }
    /// Segments used in transcriptions plus the boundary, sorted by symbol.
    pub fn inventory(&self) -> Vec<&Segment> {
        self.inventory.values().collect()
    }
    pub fn segment(&self, symbol: &str) -> Option<&Segment> {
        self.inventory.get(symbol)
    }
    pub fn orthography(&self) -> &BTreeSet<char> {
        &self.orthography
    }

    fn invalidate(&mut self) {
        match self.cache.get_mut() {
            Ok(cache) => cache.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn register_segments(&mut self, word: &Word) {
        if register_segments(&mut self.inventory, self.specifier.as_deref(), word) {
            self.has_transcription = true;
        }
    }

    fn rebuild_inventory(&mut self) {
        self.inventory = BTreeMap::from([(BOUNDARY.to_string(), Segment::boundary())]);
        for (_, w) in &self.entries {
            register_segments(&mut self.inventory, self.specifier.as_deref(), w);
        }
        self.specify_features();
    }

    /// Stores `word` and returns its key. An existing spelling either gets a
    /// numbered duplicate key or, when duplicates are disallowed, the new word
    /// is discarded and `None` is returned.
    pub fn add_word(&mut self, mut word: Word, allow_duplicates: bool) -> Option<String> {
        let spelling = word.spelling().to_string();
        let key = if self.locate(&spelling, false).is_some() {
            if !allow_duplicates {
                debug!(%spelling, "discarding duplicate word");
                return None;
            }
            let mut n = 1;
            loop {
                let candidate = format!("{} ({})", spelling, n);
                if self.locate(&candidate, false).is_none() {
                    break candidate;
                }
                n += 1;
            }
        } else {
            spelling
        };
        for name in &self.tiers {
            if let Some(definition) = self.tier_definitions.get(name) {
                definition.apply(name, &mut word);
            }
        }
        self.orthography.extend(word.spelling().chars());
        self.has_spelling = true;
        self.register_segments(&word);
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key.clone(), word));
        self.invalidate();
        Some(key)
    }

    /// Returns the stored word with this spelling and transcription, adding it first if needed.
    pub fn get_or_create_word(&mut self, spelling: &str, transcription: Option<Transcription>) -> Result<&Word> {
        let wanted = transcription.clone().unwrap_or_default();
        let existing = self.find_all_keys(spelling).into_iter().find(|k| {
            self.get(k).map(|w| w.transcription().cloned().unwrap_or_default() == wanted).unwrap_or(false)
        });
        let key = match existing {
            Some(k) => k,
            None => {
                let word = Word::new(Some(spelling.to_string()), transcription)?;
                self.add_word(word, true)
                    .ok_or_else(|| PhonoError::WordNotFound(spelling.to_string()))?
            }
        };
        self.get(&key).ok_or(PhonoError::WordNotFound(key))
    }

    /// Applies `edit` to the stored word, then re-derives tiers and the inventory.
    pub fn edit_word(&mut self, key: &str, edit: impl FnOnce(&mut Word)) -> Result<()> {
        let i = *self.index.get(key).ok_or_else(|| PhonoError::WordNotFound(key.to_string()))?;
        let word = &mut self.entries[i].1;
        edit(word);
        for name in &self.tiers {
            if let Some(definition) = self.tier_definitions.get(name) {
                definition.apply(name, word);
            }
        }
        self.orthography.extend(self.entries[i].1.spelling().chars());
        self.rebuild_inventory();
        self.invalidate();
        Ok(())
    }

    pub fn remove_word(&mut self, key: &str) -> Result<Word> {
        let i = self.index.remove(key).ok_or_else(|| PhonoError::WordNotFound(key.to_string()))?;
        let (_, word) = self.entries.remove(i);
        for (j, (k, _)) in self.entries.iter().enumerate().skip(i) {
            self.index.insert(k.clone(), j);
        }
        self.rebuild_inventory();
        self.invalidate();
        Ok(word)
    }

    fn locate(&self, spelling: &str, ignore_case: bool) -> Option<usize> {
        let mut patterns = vec![spelling.to_string()];
        if ignore_case {
            patterns.push(spelling.to_lowercase());
            patterns.push(title_case(spelling));
        }
        patterns.iter().find_map(|p| {
            self.index.get(p.as_str()).or_else(|| self.index.get(format!("{} (1)", p).as_str())).copied()
        })
    }

    /// Looks a word up by spelling, falling back to the first numbered
    /// duplicate, and with `ignore_case` to the lowercase and title-case forms.
    pub fn find(&self, spelling: &str, ignore_case: bool) -> Result<&Word> {
        self.try_find(spelling, ignore_case)
            .ok_or_else(|| PhonoError::WordNotFound(spelling.to_string()))
    }

    pub fn try_find(&self, spelling: &str, ignore_case: bool) -> Option<&Word> {
        self.locate(spelling, ignore_case).map(|i| &self.entries[i].1)
    }

    fn find_all_keys(&self, spelling: &str) -> Vec<String> {
        let mut keys = Vec::new();
        if self.index.contains_key(spelling) {
            keys.push(spelling.to_string());
            let mut n = 1;
            loop {
                let key = format!("{} ({})", spelling, n);
                if !self.index.contains_key(&key) {
                    break;
                }
                keys.push(key);
                n += 1;
            }
        }
        keys
    }

    /// Every word stored under `spelling` or one of its numbered duplicates.
    pub fn find_all(&self, spelling: &str) -> Vec<&Word> {
        self.find_all_keys(spelling).iter().filter_map(|k| self.get(k)).collect()
    }

    // ------------- features -------------
    fn specify_features(&mut self) {
        let Some(matrix) = self.specifier.clone() else { return };
        for (symbol, segment) in self.inventory.iter_mut() {
            if let Some(values) = matrix.get(symbol) {
                segment.specify(values.clone());
            }
        }
    }

    /// Attaches a feature matrix and specifies every inventory segment it covers.
    pub fn set_feature_matrix(&mut self, matrix: Arc<FeatureMatrix>) {
        self.specifier = Some(matrix);
        self.specify_features();
        let missing = self.check_coverage();
        if !missing.is_empty() {
            warn!(missing = %missing.join(", "), "feature matrix does not cover the inventory");
        }
    }

    pub fn specifier(&self) -> Option<&FeatureMatrix> {
        self.specifier.as_deref()
    }

    /// Inventory symbols the attached matrix does not specify.
    pub fn check_coverage(&self) -> Vec<String> {
        match &self.specifier {
            None => Vec::new(),
            Some(m) => self.inventory.keys().filter(|s| !m.contains(s)).cloned().collect(),
        }
    }

    pub fn get_features(&self) -> Vec<String> {
        self.specifier.as_ref().map(|m| m.features()).unwrap_or_default()
    }

    pub fn segment_to_features(&self, symbol: &str) -> Result<&FeatureValues> {
        let matrix = self
            .specifier
            .as_ref()
            .ok_or_else(|| PhonoError::InvalidArgument("no feature matrix is attached".into()))?;
        matrix.get(symbol).ok_or_else(|| PhonoError::SegmentNotFound(symbol.to_string()))
    }

    pub fn category(&self, symbol: &str) -> Option<Category> {
        let schema = self.specifier.as_ref().and_then(|m| m.schema())?;
        self.inventory.get(symbol).and_then(|s| s.category(schema))
    }

    /// Inventory symbols whose segment satisfies every token of `spec`.
    pub fn features_to_segments<'a>(&self, spec: impl IntoIterator<Item = &'a FeatureToken> + Clone) -> Vec<String> {
        self.inventory
            .iter()
            .filter(|(_, s)| s.feature_match(spec.clone()))
            .map(|(k, _)| k.clone())
            .collect()
    }

    // ------------- tiers -------------
    fn check_tier_name(&self, name: &str) -> Result<()> {
        if [SPELLING, TRANSCRIPTION, FREQUENCY].contains(&name) {
            return Err(PhonoError::InvalidArgument(format!("'{}' is a protected attribute name", name)));
        }
        Ok(())
    }

    fn install_tier(&mut self, name: &str, definition: TierDefinition) {
        if !self.tiers.iter().any(|t| t == name) {
            self.tiers.push(name.to_string());
        }
        for (_, word) in self.entries.iter_mut() {
            definition.apply(name, word);
        }
        self.tier_definitions.insert(name.to_string(), definition);
        self.invalidate();
    }

    /// Adds (or recomputes) a tier on every word. Words added later get it too.
    pub fn add_tier(&mut self, name: &str, spec: TierSpec) -> Result<()> {
        self.check_tier_name(name)?;
        let allowed: BTreeSet<String> = match spec {
            TierSpec::Segments(segments) => segments.into_iter().collect(),
            TierSpec::Features(features) => self.features_to_segments(&features).into_iter().collect(),
        };
        debug!(tier = name, segments = allowed.len(), "tier added");
        self.install_tier(name, TierDefinition::Filter(allowed));
        Ok(())
    }

    /// Adds a CV skeleton tier from the segment categories. Uncategorised
    /// segments are left out.
    pub fn add_abstract_tier(&mut self, name: &str) -> Result<()> {
        self.check_tier_name(name)?;
        let schema = self
            .specifier
            .as_ref()
            .and_then(|m| m.schema())
            .ok_or_else(|| PhonoError::InvalidArgument("an abstract tier needs a categorising feature matrix".into()))?;
        let mapping: BTreeMap<String, String> = self
            .inventory
            .iter()
            .filter_map(|(symbol, segment)| match segment.category(schema)? {
                c if c.is_consonant() => Some((symbol.clone(), CONSONANT_SYMBOL.to_string())),
                _ => Some((symbol.clone(), VOWEL_SYMBOL.to_string())),
            })
            .collect();
        debug!(tier = name, segments = mapping.len(), "abstract tier added");
        self.install_tier(name, TierDefinition::Skeleton(mapping));
        Ok(())
    }

    pub fn remove_tier(&mut self, name: &str) {
        if let Some(i) = self.tiers.iter().position(|t| t == name) {
            self.tiers.remove(i);
        }
        self.tier_definitions.remove(name);
        for (_, word) in self.entries.iter_mut() {
            word.remove_tier(name);
        }
        self.invalidate();
    }

    /// Fails unless `sequence_type` is the transcription or a registered tier.
    pub fn check_sequence_type(&self, sequence_type: &str) -> Result<()> {
        if sequence_type == TRANSCRIPTION || self.tiers.iter().any(|t| t == sequence_type) {
            Ok(())
        } else {
            Err(PhonoError::UnknownSequence(sequence_type.to_string()))
        }
    }

    /// Insertion-order indices of the words whose sequence contains any of `symbols`.
    pub fn words_containing(&self, symbols: &[&str], sequence_type: &str) -> Result<RoaringBitmap> {
        self.check_sequence_type(sequence_type)?;
        let mut bitmap = RoaringBitmap::new();
        for (i, word) in self.iter().enumerate() {
            if let Some(seq) = word.sequence(sequence_type) {
                if symbols.iter().any(|s| seq.contains(s)) {
                    bitmap.insert(i as u32);
                }
            }
        }
        Ok(bitmap)
    }

    // ------------- statistics -------------
    fn check_gramsize(gramsize: usize) -> Result<()> {
        if gramsize == 0 {
            return Err(PhonoError::InvalidArgument("gramsize must be at least 1".into()));
        }
        Ok(())
    }

    fn lock_cache(&self) -> Result<std::sync::MutexGuard<'_, StatsCache>> {
        self.cache.lock().map_err(|e| PhonoError::Lock(e.to_string()))
    }

    /// Weighted counts of every n-gram of `sequence_type`. Computed once per
    /// parameter combination, then served from the cache.
    pub fn get_frequency_base(
        &self,
        sequence_type: &str,
        count_what: CountWhat,
        gramsize: usize,
    ) -> Result<Arc<FrequencyBase>> {
        self.check_sequence_type(sequence_type)?;
        Self::check_gramsize(gramsize)?;
        let key = BaseKey { sequence_type: sequence_type.to_string(), count_what, gramsize };
        let mut cache = self.lock_cache()?;
        if let Some(base) = cache.bases.get(&key) {
            return Ok(Arc::clone(base));
        }
        let started = Instant::now();
        let mut base = FrequencyBase::default();
        for word in self.iter() {
            let Some(seq) = word.sequence(sequence_type) else { continue };
            let weight = count_what.weight(word);
            for gram in seq.grams(gramsize) {
                *base.counts.entry(gram.to_vec()).or_insert(0.0) += weight;
                base.total += weight;
            }
        }
        debug!(
            sequence_type,
            %count_what,
            gramsize,
            entries = base.counts.len(),
            ms = started.elapsed().as_secs_f64() * 1000.0,
            "frequency base computed"
        );
        let base = Arc::new(base);
        cache.bases.insert(key, Arc::clone(&base));
        Ok(base)
    }

    /// Position-aware n-gram counts. Token weights are natural-log transformed
    /// when `log_count` is set, which requires positive frequencies.
    pub fn get_phone_probs(
        &self,
        sequence_type: &str,
        count_what: CountWhat,
        gramsize: usize,
        preserve_position: bool,
        log_count: bool,
    ) -> Result<Arc<PhoneProbabilities>> {
        self.check_sequence_type(sequence_type)?;
        Self::check_gramsize(gramsize)?;
        let key = PhoneKey {
            base: BaseKey { sequence_type: sequence_type.to_string(), count_what, gramsize },
            preserve_position,
            log_count,
        };
        let mut cache = self.lock_cache()?;
        if let Some(probs) = cache.phones.get(&key) {
            return Ok(Arc::clone(probs));
        }
        let mut probs = PhoneProbabilities { preserve_position, ..Default::default() };
        for word in self.iter() {
            let Some(seq) = word.sequence(sequence_type) else { continue };
            let mut weight = count_what.weight(word);
            if count_what == CountWhat::Token && log_count {
                if weight <= 0.0 {
                    return Err(PhonoError::InvalidArgument(format!(
                        "cannot take the log of frequency {} of '{}'",
                        weight,
                        word.spelling()
                    )));
                }
                weight = weight.ln();
            }
            for (i, gram) in seq.grams(gramsize).enumerate() {
                let position = preserve_position.then_some(i);
                if preserve_position {
                    *probs.position_totals.entry(i).or_insert(0.0) += weight;
                }
                *probs.counts.entry((gram.to_vec(), position)).or_insert(0.0) += weight;
                probs.total += weight;
            }
        }
        debug!(sequence_type, entries = probs.counts.len(), "phone probabilities computed");
        let probs = Arc::new(probs);
        cache.phones.insert(key, Arc::clone(&probs));
        Ok(probs)
    }

    // ------------- integrity -------------
    /// Validates a corpus assembled from stored parts: the inventory must hold
    /// the boundary and every transcribed symbol, and every key must be the
    /// word's spelling or a numbered duplicate of it. An empty tier list is
    /// taken from a sample word.
    pub fn restore_check(&mut self) -> Result<()> {
        if !self.inventory.contains_key(BOUNDARY) {
            return Err(PhonoError::Integrity { message: "the inventory lacks the word boundary".into() });
        }
        for (key, word) in &self.entries {
            if spelling_of_key(key) != word.spelling() && key != word.spelling() {
                return Err(PhonoError::Integrity {
                    message: format!("key '{}' does not belong to the word '{}'", key, word.spelling()),
                });
            }
            if let Some(t) = word.transcription() {
                if let Some(s) = t.iter().find(|s| !self.inventory.contains_key(*s)) {
                    return Err(PhonoError::Integrity {
                        message: format!("segment '{}' of '{}' is not in the inventory", s, key),
                    });
                }
            }
        }
        if self.tiers.is_empty() {
            if let Some((_, sample)) = self.entries.first() {
                self.tiers = sample.tiers().to_vec();
            }
        }
        self.specify_features();
        self.invalidate();
        Ok(())
    }
}

impl Clone for Corpus {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            entries: self.entries.clone(),
            index: self.index.clone(),
            inventory: self.inventory.clone(),
            orthography: self.orthography.clone(),
            has_spelling: self.has_spelling,
            has_transcription: self.has_transcription,
            tiers: self.tiers.clone(),
            tier_definitions: self.tier_definitions.clone(),
            specifier: self.specifier.clone(),
            cache: Mutex::new(StatsCache::default()),
        }
    }
}

impl PartialEq for Corpus {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}
