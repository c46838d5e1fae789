use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::{PhonoError, Result};
use crate::transcription::{Environment, Transcription};

pub const SPELLING: &str = "spelling";
pub const TRANSCRIPTION: &str = "transcription";
pub const FREQUENCY: &str = "frequency";

/// Input field names that are all read as the word's frequency.
pub const FREQUENCY_ALIASES: [&str; 5] = ["abs_freq", "freq_per_mil", "sfreq", "lowercase_freq", "log10_freq"];

/// One raw field of a word record, as handed over by a loader.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Sequence(Vec<String>),
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self { FieldValue::Text(s.to_string()) }
}
impl From<String> for FieldValue {
    fn from(s: String) -> Self { FieldValue::Text(s) }
}
impl From<f64> for FieldValue {
    fn from(n: f64) -> Self { FieldValue::Number(n) }
}
impl From<i64> for FieldValue {
    fn from(n: i64) -> Self { FieldValue::Number(n as f64) }
}
impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self { FieldValue::Sequence(v) }
}
impl From<Vec<&str>> for FieldValue {
    fn from(v: Vec<&str>) -> Self { FieldValue::Sequence(v.into_iter().map(str::to_string).collect()) }
}
impl<const N: usize> From<[&str; N]> for FieldValue {
    fn from(v: [&str; N]) -> Self { FieldValue::Sequence(v.iter().map(|s| s.to_string()).collect()) }
}

/// A typed extra attribute of a word.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttributeValue {
    Numeric(f64),
    Factor(String),
    Tier(Transcription),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeKind {
    Spelling,
    Numeric,
    Factor,
    Tier,
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Numeric(_) => AttributeKind::Numeric,
            AttributeValue::Factor(_) => AttributeKind::Factor,
            AttributeValue::Tier(_) => AttributeKind::Tier,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttributeValue::Numeric(n) => write!(f, "{}", n),
            AttributeValue::Factor(s) => write!(f, "{}", s),
            AttributeValue::Tier(t) => write!(f, "{}", t),
        }
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

// ------------- Word -------------
#[derive(Debug, Clone)]
pub struct Word {
    spelling: String,
    transcription: Option<Transcription>,
    frequency: f64,
    attributes: HashMap<String, AttributeValue>,
    descriptors: Vec<String>,
    tiers: Vec<String>,
}

impl Word {
    /// At least one of `spelling` and `transcription` must be given; a missing
    /// spelling is the concatenated transcription.
    pub fn new(spelling: Option<String>, transcription: Option<Transcription>) -> Result<Self> {
        let spelling = match (spelling, &transcription) {
            (Some(s), _) => s,
            (None, Some(t)) => t.concatenated(),
            (None, None) => {
                return Err(PhonoError::InvalidWord(
                    "Words must be specified with at least a spelling or a transcription.".into(),
                ));
            }
        };
        Ok(Self {
            spelling,
            transcription,
            frequency: 0.0,
            attributes: HashMap::new(),
            descriptors: vec![SPELLING.to_string(), TRANSCRIPTION.to_string()],
            tiers: Vec::new(),
        })
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self.describe(FREQUENCY);
        self
    }

    /// Builds a word from flat named fields. List values become the
    /// transcription or a tier, numeric-looking scalars become numeric
    /// attributes, anything else a categorical one.
    pub fn from_fields<I, K>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: AsRef<str>,
    {
        let mut spelling = None;
        let mut transcription = None;
        let mut frequency = None;
        let mut attributes = HashMap::new();
        let mut descriptors = vec![SPELLING.to_string(), TRANSCRIPTION.to_string()];
        let mut tiers = Vec::new();

        for (key, value) in fields {
            let mut key = key.as_ref().to_lowercase();
            if FREQUENCY_ALIASES.contains(&key.as_str()) {
                key = FREQUENCY.to_string();
            }
            match (key.as_str(), value) {
                (TRANSCRIPTION, FieldValue::Sequence(segments)) => {
                    transcription = Some(Transcription::new(segments));
                }
                (TRANSCRIPTION, FieldValue::Text(text)) => {
                    transcription = Some(text.split('.').filter(|s| !s.is_empty()).collect());
                }
                (TRANSCRIPTION, FieldValue::Number(n)) => {
                    return Err(PhonoError::InvalidWord(format!("transcription cannot be the number {}", n)));
                }
                (SPELLING, FieldValue::Text(text)) => spelling = Some(text),
                (SPELLING, FieldValue::Number(n)) => spelling = Some(n.to_string()),
                (SPELLING, FieldValue::Sequence(s)) => spelling = Some(s.concat()),
                (_, FieldValue::Sequence(segments)) => {
                    if !tiers.contains(&key) {
                        tiers.push(key.clone());
                    }
                    attributes.insert(key.clone(), AttributeValue::Tier(Transcription::new(segments)));
                }
                (FREQUENCY, value) => {
                    let parsed = match &value {
                        FieldValue::Number(n) if n.is_finite() => Some(*n),
                        FieldValue::Text(s) => parse_number(s),
                        _ => None,
                    };
                    frequency = Some(parsed.ok_or_else(|| {
                        PhonoError::InvalidWord(format!("frequency {:?} is not a number", value))
                    })?);
                }
                (_, FieldValue::Number(n)) if n.is_finite() => {
                    attributes.insert(key.clone(), AttributeValue::Numeric(n));
                }
                (_, FieldValue::Number(n)) => {
                    attributes.insert(key.clone(), AttributeValue::Factor(n.to_string()));
                }
                (_, FieldValue::Text(text)) => {
                    let value = match parse_number(&text) {
                        Some(n) => AttributeValue::Numeric(n),
                        None => AttributeValue::Factor(text),
                    };
                    attributes.insert(key.clone(), value);
                }
            }
            if !descriptors.contains(&key) {
                descriptors.push(key);
            }
        }

        let mut word = Word::new(spelling, transcription)?;
        word.frequency = frequency.unwrap_or(0.0);
        word.attributes = attributes;
        word.descriptors = descriptors;
        word.tiers = tiers;
        Ok(word)
    }

    /// Builds a word from a flat JSON object. Arrays are sequences, nulls are skipped.
    pub fn from_json(record: &Value) -> Result<Self> {
        let object = record
            .as_object()
            .ok_or_else(|| PhonoError::InvalidWord(format!("expected a JSON object, got {}", record)))?;
        let mut fields = Vec::with_capacity(object.len());
        for (k, v) in object {
            let value = match v {
                Value::Null => continue,
                Value::String(s) => FieldValue::Text(s.clone()),
                Value::Number(n) => match n.as_f64() {
                    Some(f) => FieldValue::Number(f),
                    None => FieldValue::Text(n.to_string()),
                },
                Value::Array(items) => FieldValue::Sequence(
                    items
                        .iter()
                        .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                        .collect(),
                ),
                other => FieldValue::Text(other.to_string()),
            };
            fields.push((k.as_str(), value));
        }
        Self::from_fields(fields)
    }

    fn describe(&mut self, name: &str) {
        if !self.descriptors.iter().any(|d| d == name) {
            self.descriptors.push(name.to_string());
        }
    }

    pub fn spelling(&self) -> &str {
        &self.spelling
    }
    pub fn transcription(&self) -> Option<&Transcription> {
        self.transcription.as_ref()
    }
    pub fn set_transcription(&mut self, transcription: Option<Transcription>) {
        self.transcription = transcription;
    }
    pub fn frequency(&self) -> f64 {
        self.frequency
    }
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
        self.describe(FREQUENCY);
    }
    /// Every attribute name ever set, in first-seen order.
    pub fn descriptors(&self) -> &[String] {
        &self.descriptors
    }
    pub fn tiers(&self) -> &[String] {
        &self.tiers
    }
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
    pub fn set_attribute(&mut self, name: impl Into<String>, value: AttributeValue) {
        let name = name.into();
        if let AttributeValue::Tier(_) = value {
            if !self.tiers.contains(&name) {
                self.tiers.push(name.clone());
            }
        }
        self.describe(&name);
        self.attributes.insert(name, value);
    }
    /// The frequency or a numeric attribute.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        if name == FREQUENCY {
            return Some(self.frequency);
        }
        match self.attributes.get(name) {
            Some(AttributeValue::Numeric(n)) => Some(*n),
            _ => None,
        }
    }
    pub fn tier(&self, name: &str) -> Option<&Transcription> {
        match self.attributes.get(name) {
            Some(AttributeValue::Tier(t)) => Some(t),
            _ => None,
        }
    }
    /// The main transcription or the named tier.
    pub fn sequence(&self, sequence_type: &str) -> Option<&Transcription> {
        if sequence_type == TRANSCRIPTION {
            self.transcription.as_ref()
        } else {
            self.tier(sequence_type)
        }
    }

    /// Recomputes a tier as the transcription filtered down to `allowed` symbols.
    pub fn add_tier(&mut self, tier_name: &str, allowed: impl Fn(&str) -> bool) {
        let tier = self
            .transcription
            .as_ref()
            .map(|t| Transcription::new(t.match_segments(allowed)))
            .unwrap_or_default();
        self.set_attribute(tier_name, AttributeValue::Tier(tier));
    }

    /// Removing a tier that does not exist does nothing.
    pub fn remove_tier(&mut self, tier_name: &str) {
        if let Some(i) = self.tiers.iter().position(|t| t == tier_name) {
            self.tiers.remove(i);
            self.attributes.remove(tier_name);
        }
    }

    pub fn get_env(&self, pos: usize, sequence_type: &str) -> Result<Environment> {
        self.sequence(sequence_type)
            .map(|s| s.get_env(pos))
            .ok_or_else(|| PhonoError::UnknownSequence(sequence_type.to_string()))
    }

    /// Formatted listing of every descriptor and its value.
    pub fn details(&self) -> String {
        let rule = "-".repeat(25);
        let mut out = format!("{}\n", rule);
        for d in &self.descriptors {
            let value = match d.as_str() {
                SPELLING => self.spelling.clone(),
                TRANSCRIPTION => self.transcription.as_ref().map(|t| t.to_string()).unwrap_or_default(),
                FREQUENCY => self.frequency.to_string(),
                other => self.attributes.get(other).map(|a| a.to_string()).unwrap_or_default(),
            };
            out += &format!("{}: {}\n", d, value);
        }
        out += &format!("{}\n", rule);
        out
    }
}

impl PartialEq for Word {
    fn eq(&self, other: &Self) -> bool {
        self.spelling == other.spelling && self.transcription == other.transcription
    }
}
impl PartialOrd for Word {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some((&self.spelling, &self.transcription).cmp(&(&other.spelling, &other.transcription)))
    }
}
impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.spelling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spelling_falls_back_to_transcription() {
        let w = Word::from_fields([("transcription", FieldValue::from(["ʃ", "a", "t"]))]).unwrap();
        assert_eq!(w.spelling(), "ʃat");
        let w = Word::from_fields([("spelling", FieldValue::from("shat"))]).unwrap();
        assert!(w.transcription().is_none());
        let err = Word::from_fields([("abs_freq", FieldValue::from(3.0))]).unwrap_err();
        assert!(matches!(err, PhonoError::InvalidWord(_)));
    }

    #[test]
    fn fields_are_typed_and_described_in_order() {
        let w = Word::from_fields([
            ("Spelling", FieldValue::from("mata")),
            ("transcription", FieldValue::from(["m", "a", "t", "a"])),
            ("freq_per_mil", FieldValue::from("2")),
            ("vowels", FieldValue::from(["a", "a"])),
            ("pos", FieldValue::from("N")),
            ("neighbours", FieldValue::from("7")),
        ])
        .unwrap();
        assert_eq!(w.frequency(), 2.0);
        assert_eq!(w.tiers(), &["vowels".to_string()]);
        assert_eq!(w.attribute("pos"), Some(&AttributeValue::Factor("N".into())));
        assert_eq!(w.numeric("neighbours"), Some(7.0));
        assert_eq!(w.descriptors(), &["spelling", "transcription", "frequency", "vowels", "pos", "neighbours"]);
        assert_eq!(w.sequence("vowels").map(|t| t.len()), Some(2));
    }

    #[test]
    fn non_numeric_frequency_is_rejected() {
        let err = Word::from_fields([("spelling", FieldValue::from("a")), ("frequency", FieldValue::from("often"))]);
        assert!(err.is_err());
    }

    #[test]
    fn tiers_come_and_go() {
        let mut w = Word::from_fields([("transcription", FieldValue::from(["t", "a", "t", "o"]))]).unwrap();
        w.add_tier("vowels", |s| s == "a" || s == "o");
        assert_eq!(w.tier("vowels").unwrap().to_string(), "a.o");
        assert_eq!(w.get_env(0, "vowels").unwrap().to_string(), "#_o");
        w.remove_tier("vowels");
        w.remove_tier("vowels");
        assert!(w.tier("vowels").is_none());
        assert!(matches!(w.get_env(0, "vowels"), Err(PhonoError::UnknownSequence(_))));
    }
}
