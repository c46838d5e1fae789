use std::fmt;
use std::ops::Index;

use serde::Serialize;

use crate::segment::BOUNDARY;

// ------------- Environment -------------
/// The observed left and right neighbours of a position, `#` at a word edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Environment {
    lhs: String,
    rhs: String,
}

impl Environment {
    pub fn new(lhs: impl Into<String>, rhs: impl Into<String>) -> Self {
        Self { lhs: lhs.into(), rhs: rhs.into() }
    }
    pub fn lhs(&self) -> &str {
        &self.lhs
    }
    pub fn rhs(&self) -> &str {
        &self.rhs
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}_{}", self.lhs, self.rhs)
    }
}

// ------------- Transcription -------------
/// An ordered sequence of segment symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Transcription {
    segments: Vec<String>,
}

impl Transcription {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }
    pub fn len(&self) -> usize {
        self.segments.len()
    }
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
    pub fn get(&self, pos: usize) -> Option<&str> {
        self.segments.get(pos).map(String::as_str)
    }
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }
    pub fn as_slice(&self) -> &[String] {
        &self.segments
    }
    pub fn contains(&self, symbol: &str) -> bool {
        self.segments.iter().any(|s| s == symbol)
    }
    /// The elements belonging to `allowed`, in their original order.
    pub fn match_segments(&self, allowed: impl Fn(&str) -> bool) -> Vec<String> {
        self.segments.iter().filter(|s| allowed(s.as_str())).cloned().collect()
    }
    /// The neighbours of `pos`; positions past either edge read as `#`.
    pub fn get_env(&self, pos: usize) -> Environment {
        let lhs = if pos == 0 { None } else { self.get(pos - 1) };
        let rhs = pos.checked_add(1).and_then(|p| self.get(p));
        Environment::new(lhs.unwrap_or(BOUNDARY), rhs.unwrap_or(BOUNDARY))
    }
    /// Consecutive `gramsize`-grams, in order. `gramsize` must be positive.
    pub fn grams(&self, gramsize: usize) -> impl Iterator<Item = &[String]> {
        self.segments.windows(gramsize)
    }
    /// Concatenation of the symbols, used as a fallback spelling.
    pub fn concatenated(&self) -> String {
        self.segments.concat()
    }
}

impl Index<usize> for Transcription {
    type Output = str;
    fn index(&self, pos: usize) -> &str {
        &self.segments[pos]
    }
}

impl<S: AsRef<str>> PartialEq<[S]> for Transcription {
    fn eq(&self, other: &[S]) -> bool {
        self.segments.len() == other.len() && self.segments.iter().zip(other).all(|(a, b)| a == b.as_ref())
    }
}
impl<S: AsRef<str>> PartialEq<Vec<S>> for Transcription {
    fn eq(&self, other: &Vec<S>) -> bool {
        *self == other[..]
    }
}

impl<S: Into<String>> FromIterator<S> for Transcription {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self { segments: iter.into_iter().map(Into::into).collect() }
    }
}

impl From<Vec<String>> for Transcription {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}
impl From<&[&str]> for Transcription {
    fn from(segments: &[&str]) -> Self {
        segments.iter().copied().collect()
    }
}

impl<'a> IntoIterator for &'a Transcription {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;
    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

impl fmt::Display for Transcription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
