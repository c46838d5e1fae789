mod common;

use phonocorpus::corpus::{Corpus, CountWhat};
use phonocorpus::error::PhonoError;
use phonocorpus::funcload::{
    DeltaHOptions, FunctionalLoadMeasure, MinPairOptions, deltah_fl, functional_load_table, minpair_fl,
};
use phonocorpus::interface::{AnalysisContext, CancelToken};

const ALL_PAIRS: [(&str, &str); 3] = [("s", "ʃ"), ("m", "n"), ("e", "o")];

fn minpair(corpus: &Corpus, pairs: &[(&str, &str)], cutoff: f64, relative: bool) -> f64 {
    let options = MinPairOptions { frequency_cutoff: cutoff, relative_count: relative, ..Default::default() };
    minpair_fl(corpus, pairs, &options, &AnalysisContext::new()).unwrap().expect("not cancelled")
}

fn deltah(corpus: &Corpus, pairs: &[(&str, &str)], cutoff: f64, count_what: CountWhat) -> f64 {
    let options = DeltaHOptions { frequency_cutoff: cutoff, count_what, ..Default::default() };
    deltah_fl(corpus, pairs, &options, &AnalysisContext::new()).unwrap().expect("not cancelled")
}

#[test]
fn minimal_pairs_without_cutoff() {
    let corpus = common::unspecified_corpus();
    assert_eq!(minpair(&corpus, &[("s", "ʃ")], 0.0, false), 1.0);
    common::assert_close(minpair(&corpus, &[("s", "ʃ")], 0.0, true), 0.125);
    assert_eq!(minpair(&corpus, &[("m", "n")], 0.0, false), 1.0);
    common::assert_close(minpair(&corpus, &[("m", "n")], 0.0, true), 0.11111);
    assert_eq!(minpair(&corpus, &[("e", "o")], 0.0, false), 0.0);
    assert_eq!(minpair(&corpus, &[("e", "o")], 0.0, true), 0.0);
    assert_eq!(minpair(&corpus, &ALL_PAIRS, 0.0, false), 2.0);
    common::assert_close(minpair(&corpus, &ALL_PAIRS, 0.0, true), 0.14286);
}

#[test]
fn minimal_pairs_with_cutoff() {
    let corpus = common::unspecified_corpus();
    assert_eq!(minpair(&corpus, &[("s", "ʃ")], 3.0, false), 1.0);
    common::assert_close(minpair(&corpus, &[("s", "ʃ")], 3.0, true), 0.14286);
    assert_eq!(minpair(&corpus, &[("m", "n")], 3.0, false), 0.0);
    assert_eq!(minpair(&corpus, &[("m", "n")], 3.0, true), 0.0);
    assert_eq!(minpair(&corpus, &ALL_PAIRS, 3.0, false), 1.0);
    common::assert_close(minpair(&corpus, &ALL_PAIRS, 3.0, true), 0.09091);
}

#[test]
fn minimal_pairs_on_a_two_word_corpus() {
    let records = vec![common::record("sat", &["s", "ɑ", "t"], 1.0), common::record("shat", &["ʃ", "ɑ", "t"], 1.0)];
    let corpus = Corpus::from_records("pair", records, true).unwrap();
    assert_eq!(minpair(&corpus, &[("s", "ʃ")], 0.0, false), 1.0);
    assert_eq!(minpair(&corpus, &[("s", "ʃ")], 0.0, true), 0.5);
}

#[test]
fn homophones_count_once_unless_distinguished() {
    let records = vec![
        common::record("sat", &["s", "ɑ", "t"], 1.0),
        common::record("shat", &["ʃ", "ɑ", "t"], 1.0),
        common::record("sadd", &["s", "ɑ", "t"], 1.0),
    ];
    let corpus = Corpus::from_records("homophones", records, true).unwrap();
    assert_eq!(minpair(&corpus, &[("s", "ʃ")], 0.0, false), 1.0);

    let options = MinPairOptions { relative_count: false, distinguish_homophones: true, ..Default::default() };
    let value = minpair_fl(&corpus, &[("s", "ʃ")], &options, &AnalysisContext::new()).unwrap();
    assert_eq!(value, Some(2.0));
}

#[test]
fn change_in_entropy_without_cutoff() {
    let corpus = common::unspecified_corpus();
    common::assert_close(deltah(&corpus, &[("s", "ʃ")], 0.0, CountWhat::Type), 0.13333);
    common::assert_close(deltah(&corpus, &[("s", "ʃ")], 0.0, CountWhat::Token), 0.24794);
    common::assert_close(deltah(&corpus, &[("m", "n")], 0.0, CountWhat::Type), 0.13333);
    common::assert_close(deltah(&corpus, &[("m", "n")], 0.0, CountWhat::Token), 0.00691);
    common::assert_close(deltah(&corpus, &[("e", "o")], 0.0, CountWhat::Type), 0.0);
    common::assert_close(deltah(&corpus, &[("e", "o")], 0.0, CountWhat::Token), 0.0);
    common::assert_close(deltah(&corpus, &ALL_PAIRS, 0.0, CountWhat::Type), 0.26667);
    common::assert_close(deltah(&corpus, &ALL_PAIRS, 0.0, CountWhat::Token), 0.25485);
}

#[test]
fn change_in_entropy_with_cutoff() {
    let corpus = common::unspecified_corpus();
    common::assert_close(deltah(&corpus, &[("s", "ʃ")], 3.0, CountWhat::Type), 0.16667);
    common::assert_close(deltah(&corpus, &[("s", "ʃ")], 3.0, CountWhat::Token), 0.25053);
    common::assert_close(deltah(&corpus, &[("m", "n")], 3.0, CountWhat::Type), 0.0);
    common::assert_close(deltah(&corpus, &[("m", "n")], 3.0, CountWhat::Token), 0.0);
    common::assert_close(deltah(&corpus, &ALL_PAIRS, 3.0, CountWhat::Type), 0.16667);
    common::assert_close(deltah(&corpus, &ALL_PAIRS, 3.0, CountWhat::Token), 0.25053);
}

#[test]
fn table_measures_each_pair_alone() {
    let corpus = common::unspecified_corpus();
    let measure = FunctionalLoadMeasure::MinimalPairs(MinPairOptions { relative_count: false, ..Default::default() });
    let rows = functional_load_table(&corpus, &ALL_PAIRS, &measure, &AnalysisContext::new()).unwrap().unwrap();
    let values: Vec<(&str, &str, f64)> =
        rows.iter().map(|r| (r.segment1.as_str(), r.segment2.as_str(), r.value)).collect();
    assert_eq!(values, vec![("s", "ʃ", 1.0), ("m", "n", 1.0), ("e", "o", 0.0)]);

    let measure = FunctionalLoadMeasure::DeltaH(DeltaHOptions::default());
    let rows = functional_load_table(&corpus, &ALL_PAIRS, &measure, &AnalysisContext::new()).unwrap().unwrap();
    common::assert_close(rows[0].value, 0.24794);
    common::assert_close(rows[1].value, 0.00691);
    common::assert_close(rows[2].value, 0.0);
}

#[test]
fn cancelled_measures_return_none() {
    let corpus = common::unspecified_corpus();
    let token = CancelToken::new();
    token.cancel();
    let ctx = AnalysisContext::new().with_cancel(token);
    assert_eq!(minpair_fl(&corpus, &[("s", "ʃ")], &MinPairOptions::default(), &ctx).unwrap(), None);
    assert_eq!(deltah_fl(&corpus, &[("s", "ʃ")], &DeltaHOptions::default(), &ctx).unwrap(), None);
    let measure = FunctionalLoadMeasure::DeltaH(DeltaHOptions::default());
    assert!(functional_load_table(&corpus, &ALL_PAIRS, &measure, &ctx).unwrap().is_none());
}

#[test]
fn bad_arguments_are_rejected() {
    let corpus = common::unspecified_corpus();
    let ctx = AnalysisContext::new();
    let err = minpair_fl(&corpus, &[], &MinPairOptions::default(), &ctx).unwrap_err();
    assert!(matches!(err, PhonoError::InvalidArgument(_)));
    let err = deltah_fl(&corpus, &[], &DeltaHOptions::default(), &ctx).unwrap_err();
    assert!(matches!(err, PhonoError::InvalidArgument(_)));

    let options = DeltaHOptions { sequence_type: "syllables".into(), ..Default::default() };
    let err = deltah_fl(&corpus, &[("s", "ʃ")], &options, &ctx).unwrap_err();
    assert!(matches!(err, PhonoError::UnknownSequence(_)));
}
