//! Environment filters of the form `lhs_rhs`.
//!
//! Either side is empty (no constraint), a literal segment symbol, or a
//! bracketed feature specification resolved against the corpus inventory:
//! `"a_b"`, `"[+voc]_"`, `"_[+high]"`, `"[+voc]_[-back,+high]"`. Feature names
//! may themselves contain underscores, so bracket boundaries are preferred
//! over a bare `_` when splitting.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::corpus::Corpus;
use crate::error::{PhonoError, Result};
use crate::notation::FeatureSpec;
use crate::transcription::Environment;

#[derive(Debug, Clone)]
pub struct EnvironmentFilter {
    lhs_string: String,
    rhs_string: String,
    lhs: Vec<String>,
    rhs: Vec<String>,
}

fn split_environment(env: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = if env.contains("]_[") {
        env.split("]_").collect()
    } else if env.contains("_[") {
        env.splitn(2, '_').collect()
    } else if env.contains("]_") {
        env.split("]_").collect()
    } else {
        env.split('_').collect()
    };
    match parts.as_slice() {
        [lhs, rhs] => Ok((*lhs, *rhs)),
        _ => Err(PhonoError::Parse {
            message: format!("'{}' is not an environment of the form lhs_rhs", env),
            line: None,
            col: None,
        }),
    }
}

fn resolve_side(corpus: &Corpus, side: &str) -> Result<Vec<String>> {
    if side.is_empty() {
        Ok(Vec::new())
    } else if side.starts_with('[') {
        let spec = FeatureSpec::parse_bracketed(side)?;
        Ok(corpus.features_to_segments(&spec))
    } else {
        Ok(vec![side.to_string()])
    }
}

impl EnvironmentFilter {
    pub fn new(corpus: &Corpus, env: &str) -> Result<Self> {
        let env = env.trim();
        let (lhs, rhs) = split_environment(env)?;
        // splitting on "]_" eats the closing bracket of the left side
        let lhs_string = if lhs.starts_with('[') && !lhs.ends_with(']') { format!("{}]", lhs) } else { lhs.to_string() };
        Ok(Self {
            lhs: resolve_side(corpus, &lhs_string)?,
            rhs: resolve_side(corpus, rhs)?,
            lhs_string,
            rhs_string: rhs.to_string(),
        })
    }

    /// Parses every environment string against the same corpus.
    pub fn parse_all<S: AsRef<str>>(corpus: &Corpus, envs: &[S]) -> Result<Vec<Self>> {
        envs.iter().map(|e| Self::new(corpus, e.as_ref())).collect()
    }

    pub fn lhs(&self) -> &[String] {
        &self.lhs
    }
    pub fn rhs(&self) -> &[String] {
        &self.rhs
    }

    /// An empty side places no constraint on that neighbour.
    pub fn contains(&self, env: &Environment) -> bool {
        (self.rhs.is_empty() || self.rhs.iter().any(|s| s == env.rhs()))
            && (self.lhs.is_empty() || self.lhs.iter().any(|s| s == env.lhs()))
    }
}

impl fmt::Display for EnvironmentFilter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}_{}", self.lhs_string, self.rhs_string)
    }
}

impl PartialEq for EnvironmentFilter {
    fn eq(&self, other: &Self) -> bool {
        self.lhs == other.lhs && self.rhs == other.rhs
    }
}
impl Eq for EnvironmentFilter {}

impl Hash for EnvironmentFilter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lhs.hash(state);
        self.rhs.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitting_prefers_bracket_boundaries() {
        assert_eq!(split_environment("[+voc]_[-del_rel]").unwrap(), ("[+voc", "[-del_rel]"));
        assert_eq!(split_environment("a_[+del_rel]").unwrap(), ("a", "[+del_rel]"));
        assert_eq!(split_environment("[+del_rel]_a").unwrap(), ("[+del_rel", "a"));
        assert_eq!(split_environment("a_b").unwrap(), ("a", "b"));
        assert_eq!(split_environment("_b").unwrap(), ("", "b"));
        assert!(split_environment("a_b_c").is_err());
        assert!(split_environment("ab").is_err());
    }
}
