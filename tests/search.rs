mod common;

use std::sync::{Arc, Mutex};

use phonocorpus::corpus::TierSpec;
use phonocorpus::environment::EnvironmentFilter;
use phonocorpus::error::PhonoError;
use phonocorpus::interface::{AnalysisContext, CancelToken, Progress};
use phonocorpus::search::{phonological_search, summarize_search};

#[test]
fn unconditional_search_finds_every_occurrence() {
    let corpus = common::unspecified_corpus();
    let results = phonological_search(&corpus, &["s"], None, "transcription", &AnalysisContext::new())
        .unwrap()
        .expect("not cancelled");
    let spellings: Vec<&str> = results.iter().map(|r| r.spelling.as_str()).collect();
    assert_eq!(spellings, vec!["mashomisi", "sasi", "shisata", "tusa"]);

    let sasi = &results[1];
    assert_eq!(sasi.frequency, 139.0);
    assert_eq!(sasi.matches.iter().map(|m| m.position).collect::<Vec<_>>(), vec![0, 2]);
    assert!(sasi.matches.iter().all(|m| m.filter.is_none()));
    assert_eq!(sasi.matches[0].environment.lhs(), "#");
    assert_eq!(sasi.matches[0].environment.rhs(), "ɑ");
}

#[test]
fn environments_restrict_matches() {
    let corpus = common::unspecified_corpus();
    let envs = EnvironmentFilter::parse_all(&corpus, &["#_"]).unwrap();
    let results = phonological_search(&corpus, &["s"], Some(envs.as_slice()), "transcription", &AnalysisContext::new())
        .unwrap()
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].spelling, "sasi");
    assert_eq!(results[0].matches.len(), 1);
    assert_eq!(results[0].matches[0].position, 0);
    assert_eq!(results[0].matches[0].filter.as_deref(), Some("#_"));
}

#[test]
fn empty_filter_list_matches_nothing() {
    let corpus = common::unspecified_corpus();
    let none: Vec<EnvironmentFilter> = Vec::new();
    let results = phonological_search(&corpus, &["s"], Some(none.as_slice()), "transcription", &AnalysisContext::new())
        .unwrap()
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn summary_counts_per_segment_and_environment() {
    let corpus = common::unspecified_corpus();
    let envs = EnvironmentFilter::parse_all(&corpus, &["#_", "_i"]).unwrap();
    let results = phonological_search(&corpus, &["s"], Some(envs.as_slice()), "transcription", &AnalysisContext::new())
        .unwrap()
        .unwrap();
    let summary = summarize_search(&results);
    assert_eq!(summary.len(), 2);
    assert_eq!((summary[0].environment.as_str(), summary[0].type_frequency), ("#_", 1));
    assert_eq!(summary[0].token_frequency, 139.0);
    assert_eq!((summary[1].environment.as_str(), summary[1].type_frequency), ("_i", 2));
    assert_eq!(summary[1].token_frequency, 144.0);
}

#[test]
fn progress_is_reported_on_the_interval() {
    let corpus = common::unspecified_corpus();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let ctx = AnalysisContext::new().with_interval(5).with_progress(move |p| sink.lock().unwrap().push(p));
    phonological_search(&corpus, &["t"], None, "transcription", &ctx).unwrap().unwrap();

    let seen = seen.lock().unwrap();
    assert!(matches!(seen[0], Progress::Status(_)));
    let counts: Vec<usize> = seen
        .iter()
        .filter_map(|p| match p {
            Progress::Count { done, total } => {
                assert_eq!(*total, 15);
                Some(*done)
            }
            Progress::Status(_) => None,
        })
        .collect();
    assert_eq!(counts, vec![0, 5, 10, 15]);
}

#[test]
fn cancelled_search_returns_none() {
    let corpus = common::unspecified_corpus();
    let token = CancelToken::new();
    token.cancel();
    let ctx = AnalysisContext::new().with_cancel(token);
    assert!(phonological_search(&corpus, &["s"], None, "transcription", &ctx).unwrap().is_none());
}

#[test]
fn searching_a_tier() {
    let mut corpus = common::unspecified_corpus();
    let vowels = ["ɑ", "e", "i", "o", "u"].iter().map(|s| s.to_string()).collect();
    corpus.add_tier("vowels", TierSpec::Segments(vowels)).unwrap();

    let envs = EnvironmentFilter::parse_all(&corpus, &["_i"]).unwrap();
    let ctx = AnalysisContext::new();
    let on_tier = phonological_search(&corpus, &["ɑ"], Some(envs.as_slice()), "vowels", &ctx).unwrap().unwrap();
    let spellings: Vec<&str> = on_tier.iter().map(|r| r.spelling.as_str()).collect();
    assert_eq!(spellings, vec!["sasi", "shashi"]);

    let on_transcription = phonological_search(&corpus, &["ɑ"], Some(envs.as_slice()), "transcription", &ctx).unwrap().unwrap();
    assert!(on_transcription.is_empty(), "vowels are never adjacent in the transcriptions");

    let err = phonological_search(&corpus, &["ɑ"], None, "syllables", &ctx).unwrap_err();
    assert!(matches!(err, PhonoError::UnknownSequence(_)));
}
