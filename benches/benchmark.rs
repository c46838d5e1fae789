use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use phonocorpus::corpus::{Corpus, CountWhat};
use phonocorpus::funcload::{DeltaHOptions, MinPairOptions, deltah_fl, minpair_fl};
use phonocorpus::interface::AnalysisContext;
use phonocorpus::search::phonological_search;
use phonocorpus::word::Word;

const CONSONANTS: [&str; 6] = ["t", "m", "n", "s", "ʃ", "k"];
const VOWELS: [&str; 5] = ["ɑ", "e", "i", "o", "u"];

// deterministic CV(CV)* words, no two alike
fn lexicon(size: usize) -> Corpus {
    let mut corpus = Corpus::new("bench");
    for n in 0..size {
        let mut transcription = Vec::new();
        let mut rest = n;
        loop {
            transcription.push(CONSONANTS[rest % CONSONANTS.len()]);
            rest /= CONSONANTS.len();
            transcription.push(VOWELS[rest % VOWELS.len()]);
            rest /= VOWELS.len();
            if rest == 0 {
                break;
            }
        }
        let word = Word::new(None, Some(transcription.into_iter().collect()))
            .expect("transcription given")
            .with_frequency((n % 97 + 1) as f64);
        corpus.add_word(word, true);
    }
    corpus
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let corpus = lexicon(10_000);
    let ctx = AnalysisContext::new();

    c.bench_function("frequency base cold", |b| {
        b.iter_batched(
            || corpus.clone(),
            |fresh| fresh.get_frequency_base("transcription", CountWhat::Token, 2),
            BatchSize::LargeInput,
        )
    });
    corpus.get_frequency_base("transcription", CountWhat::Token, 2).expect("base");
    c.bench_function("frequency base cached", |b| {
        b.iter(|| corpus.get_frequency_base(black_box("transcription"), CountWhat::Token, 2))
    });

    c.bench_function("words containing", |b| {
        b.iter(|| corpus.words_containing(black_box(&["s", "ʃ"]), "transcription"))
    });
    c.bench_function("search 10k", |b| {
        b.iter(|| phonological_search(&corpus, black_box(&["s"]), None, "transcription", &ctx))
    });

    let minpair = MinPairOptions::default();
    c.bench_function("minimal pairs 10k", |b| {
        b.iter(|| minpair_fl(&corpus, black_box(&[("s", "ʃ")]), &minpair, &ctx))
    });
    let deltah = DeltaHOptions::default();
    c.bench_function("change in entropy 10k", |b| {
        b.iter(|| deltah_fl(&corpus, black_box(&[("s", "ʃ")]), &deltah, &ctx))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
