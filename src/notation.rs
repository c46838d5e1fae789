//! Signed feature notation.
//!
//! A feature token is a value character immediately followed by a feature
//! name (`+voice`, `-back`, `.high`). A feature specification is a
//! comma-separated list of tokens, optionally wrapped in brackets when it
//! appears on one side of an environment (`[+voc,-back]`). Parsing is done
//! with pest, the grammar lives in `notation.pest`.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use serde::Serialize;

use crate::error::{PhonoError, Result};

#[derive(Parser)]
#[grammar = "notation.pest"]
pub struct NotationParser;

/// One signed feature, e.g. `+voice`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FeatureToken {
    value: String,
    name: String,
}

impl FeatureToken {
    pub fn new(value: impl Into<String>, name: impl Into<String>) -> Self {
        Self { value: value.into(), name: name.into() }
    }
    pub fn value(&self) -> &str {
        &self.value
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    fn from_pair(pair: Pair<Rule>) -> Self {
        let mut value = String::new();
        let mut name = String::new();
        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::value => value = part.as_str().to_string(),
                Rule::name => name = part.as_str().to_string(),
                _ => (),
            }
        }
        Self { value, name }
    }
}

impl FromStr for FeatureToken {
    type Err = PhonoError;
    fn from_str(s: &str) -> Result<Self> {
        let mut pairs = NotationParser::parse(Rule::single_token, s.trim())?;
        pairs
            .next()
            .and_then(|single| single.into_inner().find(|p| p.as_rule() == Rule::feature_token))
            .map(FeatureToken::from_pair)
            .ok_or_else(|| PhonoError::Parse {
                message: format!("'{}' is not a feature token", s),
                line: None,
                col: None,
            })
    }
}

impl fmt::Display for FeatureToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.value, self.name)
    }
}

/// An ordered list of feature tokens. The empty specification matches every segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FeatureSpec(Vec<FeatureToken>);

impl FeatureSpec {
    pub fn new(tokens: Vec<FeatureToken>) -> Self {
        Self(tokens)
    }
    pub fn tokens(&self) -> &[FeatureToken] {
        &self.0
    }
    /// Parses one side of an environment, tolerating the surrounding brackets.
    pub fn parse_bracketed(side: &str) -> Result<Self> {
        let inner = side.trim().trim_start_matches('[').trim_end_matches(']');
        inner.parse()
    }
}

impl FromStr for FeatureSpec {
    type Err = PhonoError;
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::default());
        }
        let mut tokens = Vec::new();
        let pairs = NotationParser::parse(Rule::feature_spec, s)?;
        for pair in pairs.flatten() {
            if pair.as_rule() == Rule::feature_token {
                tokens.push(FeatureToken::from_pair(pair));
            }
        }
        Ok(Self(tokens))
    }
}

impl Deref for FeatureSpec {
    type Target = [FeatureToken];
    fn deref(&self) -> &[FeatureToken] {
        &self.0
    }
}

impl From<Vec<FeatureToken>> for FeatureSpec {
    fn from(tokens: Vec<FeatureToken>) -> Self {
        Self(tokens)
    }
}

impl From<FeatureToken> for FeatureSpec {
    fn from(token: FeatureToken) -> Self {
        Self(vec![token])
    }
}

impl<'a> IntoIterator for &'a FeatureSpec {
    type Item = &'a FeatureToken;
    type IntoIter = std::slice::Iter<'a, FeatureToken>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for FeatureSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let tokens: Vec<String> = self.0.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", tokens.join(","))
    }
}
