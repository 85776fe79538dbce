//! Classification throughput over the full code table.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quarry_client::classify::{classify, code_table};
use quarry_client::engine::{EnvelopeTag, ErrorEnvelope, TransactionOpContext};

fn classification(c: &mut Criterion) {
    let envelopes: Vec<ErrorEnvelope> = code_table()
        .iter()
        .map(|(code, _)| ErrorEnvelope {
            code: *code,
            tag: EnvelopeTag::KeyValue,
            key: Some("bench-key".to_string()),
            ..Default::default()
        })
        .collect();

    c.bench_function("classify_full_table", |b| {
        b.iter(|| {
            for envelope in &envelopes {
                black_box(classify(Some(black_box(envelope))));
            }
        })
    });

    let transactional = ErrorEnvelope {
        tag: EnvelopeTag::TransactionOpException,
        op_context: Some(TransactionOpContext {
            code: 105,
            cause: Some(Box::new(ErrorEnvelope {
                tag: EnvelopeTag::KeyValue,
                key: Some("bench-key".to_string()),
                ..Default::default()
            })),
        }),
        ..Default::default()
    };

    c.bench_function("classify_transactional", |b| {
        b.iter(|| black_box(classify(Some(black_box(&transactional)))))
    });
}

criterion_group!(benches, classification);
criterion_main!(benches);
