#![allow(dead_code)]

use std::sync::Arc;

use phonocorpus::corpus::Corpus;
use phonocorpus::features::FeatureMatrix;
use phonocorpus::word::FieldValue;

/// The fifteen-word test lexicon: spelling, transcription, frequency.
pub const LEXICON: [(&str, &[&str], f64); 15] = [
    ("atema", &["ɑ", "t", "e", "m", "ɑ"], 11.0),
    ("enuta", &["e", "n", "u", "t", "ɑ"], 11.0),
    ("mashomisi", &["m", "ɑ", "ʃ", "o", "m", "i", "s", "i"], 5.0),
    ("mata", &["m", "ɑ", "t", "ɑ"], 2.0),
    ("nata", &["n", "ɑ", "t", "ɑ"], 2.0),
    ("sasi", &["s", "ɑ", "s", "i"], 139.0),
    ("shashi", &["ʃ", "ɑ", "ʃ", "i"], 43.0),
    ("shisata", &["ʃ", "i", "s", "ɑ", "t", "ɑ"], 3.0),
    ("shushoma", &["ʃ", "u", "ʃ", "o", "m", "ɑ"], 126.0),
    ("ta", &["t", "ɑ"], 67.0),
    ("tatomi", &["t", "ɑ", "t", "o", "m", "i"], 7.0),
    ("tishenishu", &["t", "i", "ʃ", "e", "n", "i", "ʃ", "u"], 96.0),
    ("toni", &["t", "o", "n", "i"], 33.0),
    ("tusa", &["t", "u", "s", "ɑ"], 32.0),
    ("ʃi", &["ʃ", "i"], 2.0),
];

pub fn record(spelling: &str, transcription: &[&str], frequency: f64) -> Vec<(&'static str, FieldValue)> {
    vec![
        ("spelling", FieldValue::from(spelling)),
        ("transcription", FieldValue::Sequence(transcription.iter().map(|s| s.to_string()).collect())),
        ("frequency", FieldValue::from(frequency)),
    ]
}

pub fn unspecified_corpus() -> Corpus {
    let records = LEXICON.iter().map(|(s, t, f)| record(s, t, *f));
    Corpus::from_records("unspecified", records, true).expect("fixture corpus builds")
}

/// A small SPE-style matrix covering the fixture inventory.
pub fn spe_matrix() -> FeatureMatrix {
    let rows: [(&str, [&str; 5]); 10] = [
        //        voc  nasal cont high back
        ("ɑ", ["+", "-", "+", "-", "+"]),
        ("e", ["+", "-", "+", "-", "-"]),
        ("i", ["+", "-", "+", "+", "-"]),
        ("o", ["+", "-", "+", "-", "+"]),
        ("u", ["+", "-", "+", "+", "+"]),
        ("m", ["-", "+", "-", "-", "-"]),
        ("n", ["-", "+", "-", "-", "-"]),
        ("s", ["-", "-", "+", "-", "-"]),
        ("ʃ", ["-", "-", "+", "+", "-"]),
        ("t", ["-", "-", "-", "-", "-"]),
    ];
    let names = ["voc", "nasal", "cont", "high", "back"];
    let records = rows.iter().map(|(symbol, values)| {
        let mut record = vec![("symbol".to_string(), symbol.to_string())];
        record.extend(names.iter().zip(values).map(|(n, v)| (n.to_string(), v.to_string())));
        record
    });
    FeatureMatrix::from_records("spe_test", records).expect("fixture matrix builds")
}

pub fn specified_corpus() -> Corpus {
    let mut corpus = unspecified_corpus();
    corpus.set_feature_matrix(Arc::new(spe_matrix()));
    corpus
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-5, "expected {expected}, got {actual}");
}
