use thiserror::Error;

use crate::notation::Rule;

#[derive(Error, Debug)]
pub enum PhonoError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Corpus integrity error: {message}. Please redownload or recreate the corpus.")]
    Integrity { message: String },
    #[error("The word \"{0}\" is not in the corpus")]
    WordNotFound(String),
    #[error("The segment \"{0}\" is not specified")]
    SegmentNotFound(String),
    #[error("Unknown sequence type: {0}")]
    UnknownSequence(String),
    #[error("The segment '{segment}' has a feature '{feature}' that is not defined for this feature matrix")]
    UndefinedFeature { segment: String, feature: String },
    #[error("Invalid word: {0}")]
    InvalidWord(String),
    #[error("Parse error: {message}")]
    Parse { message: String, line: Option<usize>, col: Option<usize> },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Environments are not exhaustive and unique: {missing} occurrence(s) not covered, {overlapping} occurrence(s) covered more than once")]
    EnvironmentCoverage {
        missing: usize,
        overlapping: usize,
        missing_envs: Vec<String>,
        overlapping_envs: Vec<String>,
    },
    #[error("Analysis failed: {0}")]
    Worker(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, PhonoError>;

// Helper conversions
impl From<pest::error::Error<Rule>> for PhonoError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        let (line, col) = match e.line_col {
            pest::error::LineColLocation::Pos((l, c)) => (l, c),
            pest::error::LineColLocation::Span((l, c), _) => (l, c),
        };
        Self::Parse { message: e.to_string(), line: Some(line), col: Some(col) }
    }
}
impl From<config::ConfigError> for PhonoError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<serde_json::Error> for PhonoError {
    fn from(e: serde_json::Error) -> Self { Self::InvalidArgument(e.to_string()) }
}
impl From<std::io::Error> for PhonoError {
    fn from(e: std::io::Error) -> Self { Self::Config(e.to_string()) }
}
