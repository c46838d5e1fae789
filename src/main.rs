//! `phonocorpus <words.json> [features.json]`
//!
//! Loads a corpus from a JSON array of word records, optionally attaches a
//! feature matrix from a JSON array of segment records, and prints inventory
//! statistics as JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

use phonocorpus::corpus::{CountWhat, Corpus};
use phonocorpus::error::{PhonoError, Result};
use phonocorpus::features::FeatureMatrix;
use phonocorpus::segment::BOUNDARY;
use phonocorpus::settings::Settings;

#[derive(Parser, Debug)]
#[clap(name = "phonocorpus", version, about = "Prints inventory statistics for a phonological corpus")]
struct Args {
    /// JSON array of word records.
    words: PathBuf,

    /// JSON array of segment records to use as the feature matrix.
    features: Option<PathBuf>,
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn run(words: &Path, features: Option<&Path>, settings: &Settings) -> Result<Value> {
    let name = words.file_stem().and_then(|s| s.to_str()).unwrap_or("corpus");
    let mut corpus = Corpus::from_json(name, &read_json(words)?, settings.allow_duplicates)?;
    info!(words = corpus.len(), "corpus loaded");

    if let Some(path) = features {
        let matrix_name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("features");
        let mut matrix = FeatureMatrix::from_json(matrix_name, &read_json(path)?)?;
        matrix.validate();
        corpus.set_feature_matrix(Arc::new(matrix));
    }

    let types = corpus.get_frequency_base(&settings.sequence_type, CountWhat::Type, 1)?;
    let tokens = corpus.get_frequency_base(&settings.sequence_type, CountWhat::Token, 1)?;
    let segments: Vec<Value> = corpus
        .inventory()
        .into_iter()
        .filter(|s| s.symbol() != BOUNDARY)
        .map(|s| {
            json!({
                "segment": s.symbol(),
                "type_frequency": types.unigram(s.symbol()),
                "token_frequency": tokens.unigram(s.symbol()),
                "category": corpus.category(s.symbol()).map(|c| c.to_string()),
            })
        })
        .collect();

    Ok(json!({
        "corpus": corpus.name(),
        "words": corpus.len(),
        "attributes": corpus.attributes(),
        "sequence_type": settings.sequence_type,
        "segments": segments,
        "coverage_gaps": corpus.check_coverage(),
    }))
}

fn main() {
    let args = Args::parse();
    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match run(&args.words, args.features.as_deref(), &settings) {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("{}", PhonoError::from(e));
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
