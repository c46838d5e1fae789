//! Phonocorpus – an in-memory phonological corpus with lexical statistics.
//!
//! A corpus is a lexicon of words, each with a spelling, a segmental
//! transcription, a frequency and any number of extra attributes:
//! * A [`segment::Segment`] is a symbol plus its feature values, as given by a
//!   [`features::FeatureMatrix`].
//! * A [`transcription::Transcription`] is an ordered sequence of symbols.
//!   Tiers are filtered copies of it (e.g. vowels only).
//! * A [`word::Word`] couples a spelling, a transcription, a frequency and
//!   typed extra attributes.
//! * A [`corpus::Corpus`] owns the words and derives the inventory, tiers and
//!   cached n-gram frequency tables from them.
//!
//! ## Modules
//! * [`notation`] – Signed feature tokens (`+voice`) and specifications,
//!   parsed with pest (`notation.pest`).
//! * [`segment`] – Segments and their articulatory categories under the SPE
//!   and Hayes feature schemas.
//! * [`features`] – Feature matrices.
//! * [`transcription`] / [`word`] – Sequences and lexical entries.
//! * [`corpus`] – The lexicon, lookup, tiers and frequency bases.
//! * [`environment`] – `lhs_rhs` environment filters.
//! * [`search`] – Phonological search and its summaries.
//! * [`funcload`] – Minimal-pair and change-in-entropy functional load.
//! * [`prod`] – Predictability of distribution.
//! * [`interface`] – Cancellation, progress and background analyses.
//! * [`settings`] – Layered configuration.
//!
//! ## Quick Start
//! ```
//! use phonocorpus::corpus::Corpus;
//! use phonocorpus::funcload::{MinPairOptions, minpair_fl};
//! use phonocorpus::interface::AnalysisContext;
//! use phonocorpus::word::FieldValue;
//!
//! let records = vec![
//!     vec![("spelling", FieldValue::from("sat")), ("transcription", FieldValue::from(["s", "a", "t"])), ("frequency", FieldValue::from(5.0))],
//!     vec![("spelling", FieldValue::from("shat")), ("transcription", FieldValue::from(["ʃ", "a", "t"])), ("frequency", FieldValue::from(2.0))],
//! ];
//! let corpus = Corpus::from_records("demo", records, true).unwrap();
//! let options = MinPairOptions { relative_count: false, ..Default::default() };
//! let load = minpair_fl(&corpus, &[("s", "ʃ")], &options, &AnalysisContext::new()).unwrap();
//! assert_eq!(load, Some(1.0));
//! ```
//!
//! ## Concurrency
//! Analyses are synchronous functions over a shared `&Corpus`. Long-running
//! ones poll an [`interface::AnalysisContext`] for cancellation and report
//! progress through it; [`interface::AnalysisRunner`] runs them on a
//! background thread.

pub mod corpus;
pub mod environment;
pub mod error;
pub mod features;
pub mod funcload;
pub mod interface;
pub mod notation;
pub mod prod;
pub mod search;
pub mod segment;
pub mod settings;
pub mod transcription;
pub mod word;

pub use corpus::{CountWhat, Corpus, TierSpec};
pub use error::{PhonoError, Result};
pub use features::FeatureMatrix;
pub use interface::{AnalysisContext, CancelToken};
pub use segment::Segment;
pub use transcription::{Environment, Transcription};
pub use word::Word;
