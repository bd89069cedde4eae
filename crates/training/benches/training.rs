//! Benchmarks for merge training and inference.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use graphtok_core::{characters, utf8_clusters, GraphSettings, NodesSequence};
use graphtok_training::{MergeTrainer, TrainingConfig};

const TEXT: &str = "the quick brown fox jumps over the lazy dog while the lazier dogs \
                    sleep under a brown tree and the quickest foxes keep jumping";

fn corpus(repeat: usize, decompose: fn(&str) -> NodesSequence) -> Vec<NodesSequence> {
    TEXT.split(' ')
        .cycle()
        .take(repeat * TEXT.split(' ').count())
        .map(decompose)
        .collect()
}

fn trainer(settings: GraphSettings, merges: usize) -> MergeTrainer {
    MergeTrainer::new(
        TrainingConfig::default()
            .with_settings(settings)
            .max_merges(merges),
    )
}

/// Pairwise BPE on a few thousand words.
fn bench_train_bpe(c: &mut Criterion) {
    let words = corpus(200, characters);
    let trainer = trainer(GraphSettings::bpe(), 200);

    c.bench_function("train_bpe_characters", |b| {
        b.iter(|| trainer.train_sequences(black_box(&words)).unwrap());
    });
}

/// Trigram BNE over grapheme-clustered bytes.
fn bench_train_bne(c: &mut Criterion) {
    let words = corpus(200, utf8_clusters);
    let trainer = trainer(GraphSettings::bne(3).unwrap(), 200);

    c.bench_function("train_bne3_clusters", |b| {
        b.iter(|| trainer.train_sequences(black_box(&words)).unwrap());
    });
}

/// Applying a trained table to fresh text.
fn bench_apply(c: &mut Criterion) {
    let table = trainer(GraphSettings::bpe(), 300)
        .train_sequences(&corpus(50, characters))
        .unwrap()
        .table;
    let input = NodesSequence::concat(corpus(20, characters)).unwrap();

    c.bench_function("apply_bpe_characters", |b| {
        b.iter(|| table.apply(black_box(&input)).unwrap());
    });
}

criterion_group!(benches, bench_train_bpe, bench_train_bne, bench_apply);
criterion_main!(benches);
