use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::notation::FeatureToken;

/// The word boundary symbol.
pub const BOUNDARY: &str = "#";
/// Placeholder symbol for the "empty" feature entry.
pub const EMPTY: &str = "";

pub type FeatureValues = BTreeMap<String, String>;

// ------------- FeatureSchema -------------
/// The two feature inventories that segments can be categorized under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FeatureSchema {
    /// Acoustic, SPE-style features (`voc`, `ant`, `cor`, `del_rel`, ...).
    Spe,
    /// Articulatory, Hayes-style features (`consonantal`, `syllabic`, `dorsal`, ...).
    Hayes,
}

impl FeatureSchema {
    pub fn discriminating_feature(self) -> &'static str {
        match self {
            FeatureSchema::Spe => "voc",
            FeatureSchema::Hayes => "consonantal",
        }
    }
    /// Picks the schema whose discriminating feature is among `features`, SPE first.
    pub fn detect<'a>(features: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut hayes = false;
        for f in features {
            if f == FeatureSchema::Spe.discriminating_feature() {
                return Some(FeatureSchema::Spe);
            }
            if f == FeatureSchema::Hayes.discriminating_feature() {
                hayes = true;
            }
        }
        if hayes { Some(FeatureSchema::Hayes) } else { None }
    }
    pub fn classify(self, segment: &Segment) -> Option<Category> {
        if segment.features.is_empty() {
            return None;
        }
        match self {
            FeatureSchema::Spe => classify_spe(segment),
            FeatureSchema::Hayes => classify_hayes(segment),
        }
    }
}

// ------------- Category -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Height { Close, NearClose, CloseMid, OpenMid, Open }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Backness { Front, NearFront, Central, NearBack, Back }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Place {
    Labial, Labiodental, Dental, Alveolar, Alveopalatal,
    Palatal, Velar, Uvular, Pharyngeal, Glottal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Manner { Stop, Nasal, Trill, Tap, Fricative, Affricate, Approximant, LateralApproximant }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Voicing { Voiced, Voiceless }

/// Articulatory classification of a segment. A `None` component means that no
/// rule of the decision table matched for that dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Diphthong { front: bool },
    Vowel { height: Option<Height>, backness: Option<Backness>, rounded: bool },
    Consonant { place: Option<Place>, manner: Option<Manner>, voicing: Option<Voicing> },
}

impl Height {
    pub fn label(self) -> &'static str {
        match self {
            Height::Close => "Close",
            Height::NearClose => "Near close",
            Height::CloseMid => "Close mid",
            Height::OpenMid => "Open mid",
            Height::Open => "Open",
        }
    }
}
impl Backness {
    pub fn label(self) -> &'static str {
        match self {
            Backness::Front => "Front",
            Backness::NearFront => "Near front",
            Backness::Central => "Central",
            Backness::NearBack => "Near back",
            Backness::Back => "Back",
        }
    }
}
impl Place {
    pub fn label(self) -> &'static str {
        match self {
            Place::Labial => "Labial",
            Place::Labiodental => "Labiodental",
            Place::Dental => "Dental",
            Place::Alveolar => "Alveolar",
            Place::Alveopalatal => "Alveopalatal",
            Place::Palatal => "Palatal",
            Place::Velar => "Velar",
            Place::Uvular => "Uvular",
            Place::Pharyngeal => "Pharyngeal",
            Place::Glottal => "Glottal",
        }
    }
}
impl Manner {
    pub fn label(self) -> &'static str {
        match self {
            Manner::Stop => "Stop",
            Manner::Nasal => "Nasal",
            Manner::Trill => "Trill",
            Manner::Tap => "Tap",
            Manner::Fricative => "Fricative",
            Manner::Affricate => "Affricate",
            Manner::Approximant => "Approximate",
            Manner::LateralApproximant => "Lateral approximate",
        }
    }
}
impl Voicing {
    pub fn label(self) -> &'static str {
        match self {
            Voicing::Voiced => "Voiced",
            Voicing::Voiceless => "Voiceless",
        }
    }
}

impl Category {
    /// Ordered classification labels, e.g. `["Vowel", "Close", "Front", "Rounded"]`.
    pub fn labels(&self) -> Vec<Option<&'static str>> {
        match *self {
            Category::Diphthong { front } => {
                vec![Some("Diphthong"), Some(if front { "Front" } else { "Back" })]
            }
            Category::Vowel { height, backness, rounded } => vec![
                Some("Vowel"),
                height.map(Height::label),
                backness.map(Backness::label),
                Some(if rounded { "Rounded" } else { "Unrounded" }),
            ],
            Category::Consonant { place, manner, voicing } => vec![
                Some("Consonant"),
                place.map(Place::label),
                manner.map(Manner::label),
                voicing.map(Voicing::label),
            ],
        }
    }
    pub fn is_consonant(&self) -> bool {
        matches!(self, Category::Consonant { .. })
    }
    pub fn is_vowel(&self) -> bool {
        !self.is_consonant()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let labels: Vec<&str> = self.labels().into_iter().map(|l| l.unwrap_or("?")).collect();
        write!(f, "{}", labels.join(", "))
    }
}

// ------------- Segment -------------
/// A phonetic symbol together with its (possibly not yet attached) feature values.
#[derive(Debug, Clone)]
pub struct Segment {
    symbol: String,
    features: FeatureValues,
}

impl Segment {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), features: FeatureValues::new() }
    }
    pub fn boundary() -> Self {
        Self::new(BOUNDARY)
    }
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
    pub fn features(&self) -> &FeatureValues {
        &self.features
    }
    pub fn is_specified(&self) -> bool {
        !self.features.is_empty()
    }
    pub fn specify(&mut self, features: FeatureValues) {
        self.features = features;
    }
    fn is(&self, feature: &str, value: &str) -> bool {
        self.features.get(feature).is_some_and(|v| v == value)
    }
    /// True iff every token's feature exists on this segment with the token's value.
    pub fn feature_match<'a>(&self, specification: impl IntoIterator<Item = &'a FeatureToken>) -> bool {
        specification.into_iter().all(|token| self.is(token.name(), token.value()))
    }
    pub fn category(&self, schema: FeatureSchema) -> Option<Category> {
        schema.classify(self)
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}
impl Eq for Segment {}
impl PartialEq<str> for Segment {
    fn eq(&self, other: &str) -> bool {
        self.symbol == other
    }
}
impl PartialEq<&str> for Segment {
    fn eq(&self, other: &&str) -> bool {
        self.symbol == *other
    }
}
impl Hash for Segment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}
impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.symbol.cmp(&other.symbol)
    }
}
impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

// ------------- decision tables -------------
fn vowel_height(s: &Segment) -> Option<Height> {
    let tense = s.is("tense", "+");
    if s.is("low", "-") && s.is("high", "+") {
        Some(if tense { Height::Close } else { Height::NearClose })
    } else if s.is("low", "-") && s.is("high", "-") {
        Some(if tense { Height::CloseMid } else { Height::OpenMid })
    } else if s.is("low", "+") && s.is("high", "-") {
        Some(Height::Open)
    } else {
        None
    }
}

fn classify_spe(s: &Segment) -> Option<Category> {
    if s.is("voc", "+") {
        if s.is("high", ".") {
            return Some(Category::Diphthong { front: s.is("back", "-") });
        }
        let tense = s.is("tense", "+");
        let backness = if s.is("back", "+") {
            Some(if tense { Backness::Back } else { Backness::NearBack })
        } else if s.is("back", "n") {
            Some(Backness::Central)
        } else if s.is("back", "-") {
            Some(if tense { Backness::Front } else { Backness::NearFront })
        } else {
            None
        };
        Some(Category::Vowel { height: vowel_height(s), backness, rounded: s.is("round", "+") })
    } else if s.is("voc", "-") {
        let (ant, cor, back, high) = (s.is("ant", "+"), s.is("cor", "+"), s.is("back", "+"), s.is("high", "+"));
        let (not_ant, not_cor, not_back, not_high) = (s.is("ant", "-"), s.is("cor", "-"), s.is("back", "-"), s.is("high", "-"));
        // The labiodental row repeats the labial condition and is never reached.
        let place = if ant && not_cor && not_back {
            Some(Place::Labial)
        } else if ant && not_cor && back && high {
            Some(Place::Labial)
        } else if ant && not_cor && not_back {
            Some(Place::Labiodental)
        } else if ant && cor && not_back {
            Some(Place::Dental)
        } else if not_ant && cor && not_back && not_high {
            Some(Place::Alveolar)
        } else if not_ant && cor && not_back && high {
            Some(Place::Alveopalatal)
        } else if not_ant && not_cor && not_back {
            Some(Place::Palatal)
        } else if not_ant && not_cor && back && high {
            Some(Place::Velar)
        } else if not_ant && not_cor && back && not_high {
            Some(Place::Uvular)
        } else if s.is("low", "+") && back {
            Some(Place::Pharyngeal)
        } else if s.is("low", "+") && not_back {
            Some(Place::Glottal)
        } else {
            None
        };
        let manner = if s.is("son", "-") && s.is("nasal", "-") && s.is("cont", "-") {
            Some(Manner::Stop)
        } else if s.is("nasal", "+") {
            Some(Manner::Nasal)
        } else if s.is("son", "-") && s.is("nasal", "-") && s.is("cont", "+") {
            Some(Manner::Fricative)
        } else if s.is("del_rel", "+") {
            Some(Manner::Affricate)
        } else if s.is("son", "+") && s.is("nasal", "-") {
            Some(Manner::Approximant)
        } else if s.is("son", "+") && s.is("lat", "+") {
            Some(Manner::LateralApproximant)
        } else {
            None
        };
        let voicing = if s.is("voice", "+") {
            Some(Voicing::Voiced)
        } else if s.is("voice", "-") {
            Some(Voicing::Voiceless)
        } else {
            None
        };
        Some(Category::Consonant { place, manner, voicing })
    } else {
        None
    }
}

fn classify_hayes(s: &Segment) -> Option<Category> {
    if s.is("diphthong", "+") {
        Some(Category::Diphthong { front: s.is("front_diphthong", "+") })
    } else if s.is("syllabic", "+") {
        let tense = s.is("tense", "+");
        let backness = if s.is("back", "+") && s.is("front", "-") {
            Some(if tense { Backness::Back } else { Backness::NearBack })
        } else if s.is("back", "-") && s.is("front", "-") {
            Some(Backness::Central)
        } else if s.is("back", "-") && s.is("front", "+") {
            Some(if tense { Backness::Front } else { Backness::NearFront })
        } else {
            None
        };
        Some(Category::Vowel { height: vowel_height(s), backness, rounded: s.is("round", "+") })
    } else if s.is("syllabic", "-") {
        let dorsal = s.is("dorsal", "+");
        let place = if s.is("labial", "+") {
            Some(Place::Labial)
        } else if s.is("labiodental", "+") {
            Some(Place::Labiodental)
        } else if s.is("anterior", "+") && s.is("coronal", "+") {
            Some(Place::Dental)
        } else if s.is("anterior", "-") && s.is("coronal", "+") {
            Some(Place::Alveopalatal)
        } else if dorsal && s.is("coronal", "+") {
            Some(Place::Palatal)
        } else if dorsal && s.is("front", "+") {
            Some(Place::Palatal)
        } else if dorsal && s.is("back", "+") {
            Some(Place::Uvular)
        } else if dorsal {
            Some(Place::Velar)
        } else if s.is("dorsal", "-") && s.is("coronal", "-") {
            Some(Place::Glottal)
        } else {
            None
        };
        let (son, cont) = (s.is("sonorant", "+"), s.is("continuant", "+"));
        let (not_son, not_cont) = (s.is("sonorant", "-"), s.is("continuant", "-"));
        let manner = if not_son && not_cont && s.is("nasal", "-") && s.is("delayed_release", "-") {
            Some(Manner::Stop)
        } else if s.is("nasal", "+") {
            Some(Manner::Nasal)
        } else if s.is("trill", "+") {
            Some(Manner::Trill)
        } else if s.is("tap", "+") {
            Some(Manner::Tap)
        } else if not_son && cont {
            Some(Manner::Fricative)
        } else if not_son && not_cont && s.is("delayed_release", "+") {
            Some(Manner::Affricate)
        } else if son && s.is("lateral", "-") {
            Some(Manner::Approximant)
        } else if son && s.is("lateral", "+") {
            Some(Manner::LateralApproximant)
        } else {
            None
        };
        let voicing = if s.is("voice", "+") { Voicing::Voiced } else { Voicing::Voiceless };
        Some(Category::Consonant { place, manner, voicing: Some(voicing) })
    } else {
        None
    }
}
