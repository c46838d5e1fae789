mod common;

use phonocorpus::corpus::CountWhat;
use phonocorpus::environment::EnvironmentFilter;
use phonocorpus::error::PhonoError;
use phonocorpus::interface::{AnalysisContext, CancelToken};
use phonocorpus::prod::{ALL_ENVIRONMENTS, AVERAGE, calc_prod, calc_prod_all_envs};

#[test]
fn whole_corpus_entropy() {
    let corpus = common::unspecified_corpus();
    let row = calc_prod_all_envs(&corpus, "s", "ʃ", "transcription", CountWhat::Type).unwrap();
    assert_eq!(row.environment, ALL_ENVIRONMENTS);
    assert_eq!((row.seg1_count, row.seg2_count, row.total), (5.0, 9.0, 14.0));
    common::assert_close(row.entropy, 0.940286);

    let unattested = calc_prod_all_envs(&corpus, "s", "x", "transcription", CountWhat::Type).unwrap();
    assert_eq!(unattested.entropy, 0.0);
}

#[test]
fn per_environment_rows_and_weighted_average() {
    let corpus = common::specified_corpus();
    let envs = EnvironmentFilter::parse_all(&corpus, &["_[+voc,+high]", "_[+voc,-high]"]).unwrap();
    let rows = calc_prod(&corpus, "s", "ʃ", &envs, "transcription", CountWhat::Type, true, &AnalysisContext::new())
        .unwrap()
        .expect("not cancelled");
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].environment, "_[+voc,+high]");
    assert_eq!((rows[0].seg1_count, rows[0].seg2_count), (2.0, 5.0));
    common::assert_close(rows[0].entropy, 0.863121);

    assert_eq!((rows[1].seg1_count, rows[1].seg2_count), (3.0, 4.0));
    common::assert_close(rows[1].entropy, 0.985228);

    assert_eq!(rows[2].environment, AVERAGE);
    assert_eq!(rows[2].total, 14.0);
    common::assert_close(rows[2].entropy, 0.924174);
}

#[test]
fn strict_mode_reports_missing_environments() {
    let corpus = common::specified_corpus();
    let envs = EnvironmentFilter::parse_all(&corpus, &["_i"]).unwrap();
    let err = calc_prod(&corpus, "s", "ʃ", &envs, "transcription", CountWhat::Type, true, &AnalysisContext::new())
        .unwrap_err();
    match err {
        PhonoError::EnvironmentCoverage { missing, overlapping, missing_envs, .. } => {
            assert_eq!((missing, overlapping), (9, 0));
            assert!(missing_envs.contains(&"#_ɑ".to_string()), "{missing_envs:?}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn strict_mode_reports_overlapping_environments() {
    let corpus = common::specified_corpus();
    let envs = EnvironmentFilter::parse_all(&corpus, &["_[+voc]", "_i"]).unwrap();
    let err = calc_prod(&corpus, "s", "ʃ", &envs, "transcription", CountWhat::Type, true, &AnalysisContext::new())
        .unwrap_err();
    assert!(matches!(err, PhonoError::EnvironmentCoverage { missing: 0, overlapping: 5, .. }));
}

#[test]
fn lenient_mode_keeps_going() {
    let corpus = common::specified_corpus();
    let envs = EnvironmentFilter::parse_all(&corpus, &["_i"]).unwrap();
    let rows = calc_prod(&corpus, "s", "ʃ", &envs, "transcription", CountWhat::Type, false, &AnalysisContext::new())
        .unwrap()
        .unwrap();
    assert_eq!((rows[0].seg1_count, rows[0].seg2_count), (2.0, 3.0));
    assert_eq!(rows[1].total, 5.0, "uncovered occurrences are dropped");

    let envs = EnvironmentFilter::parse_all(&corpus, &["_[+voc]", "_i"]).unwrap();
    let rows = calc_prod(&corpus, "s", "ʃ", &envs, "transcription", CountWhat::Type, false, &AnalysisContext::new())
        .unwrap()
        .unwrap();
    assert_eq!(rows[0].total, 14.0);
    assert_eq!(rows[1].total, 5.0);
    assert_eq!(rows[2].total, 19.0, "overlapping occurrences count in both environments");
}

#[test]
fn token_counts_weigh_by_frequency() {
    let corpus = common::specified_corpus();
    let envs = EnvironmentFilter::parse_all(&corpus, &["#_"]).unwrap();
    let rows = calc_prod(&corpus, "s", "ʃ", &envs, "transcription", CountWhat::Token, false, &AnalysisContext::new())
        .unwrap()
        .unwrap();
    // sasi against shashi, shisata, shushoma and ʃi
    assert_eq!(rows[0].seg1_count, 139.0);
    assert_eq!(rows[0].seg2_count, 43.0 + 3.0 + 126.0 + 2.0);
}

#[test]
fn cancelled_run_returns_none() {
    let corpus = common::specified_corpus();
    let envs = EnvironmentFilter::parse_all(&corpus, &["_[+voc]"]).unwrap();
    let token = CancelToken::new();
    token.cancel();
    let ctx = AnalysisContext::new().with_cancel(token);
    let rows = calc_prod(&corpus, "s", "ʃ", &envs, "transcription", CountWhat::Type, true, &ctx).unwrap();
    assert!(rows.is_none());
}
