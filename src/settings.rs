//! Layered settings: built-in defaults, then an optional `phonocorpus.toml`
//! (or an explicit file), then `PHONOCORPUS_*` environment variables.

use std::path::Path;

use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::{Deserialize, Serialize};

use crate::corpus::CountWhat;
use crate::error::Result;
use crate::interface::{AnalysisContext, DEFAULT_PROGRESS_INTERVAL};
use crate::word::TRANSCRIPTION;

pub const DEFAULT_FILE: &str = "phonocorpus";
pub const ENV_PREFIX: &str = "PHONOCORPUS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `transcription` or a tier name.
    pub sequence_type: String,
    pub count_what: CountWhat,
    pub gramsize: usize,
    /// Words (or pairs) between two progress reports.
    pub progress_interval: usize,
    pub allow_duplicates: bool,
    /// Tracing filter directive used by the binary unless `RUST_LOG` is set.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sequence_type: TRANSCRIPTION.to_string(),
            count_what: CountWhat::Type,
            gramsize: 1,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            allow_duplicates: true,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Reads `phonocorpus.{toml,json,...}` from the working directory if present.
    pub fn load() -> Result<Self> {
        Self::build(Config::builder().add_source(File::with_name(DEFAULT_FILE).required(false)))
    }

    /// Reads the given file, which must exist.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(Config::builder().add_source(File::from(path.as_ref()).required(true)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn analysis_context(&self) -> AnalysisContext {
        AnalysisContext::new().with_interval(self.progress_interval)
    }
}
