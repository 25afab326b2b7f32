use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use paperqa::services::{TextChunker, chunk_with_overlap, header_aware_chunk};

fn paper(sections: usize, words_per_section: usize) -> String {
    (0..sections)
        .map(|i| {
            let body = (0..words_per_section)
                .map(|w| format!("token{}", (i * 31 + w) % 997))
                .collect::<Vec<_>>()
                .join(" ");
            format!("# Section {}\n{}\n", i, body)
        })
        .collect()
}

fn bench_header_aware(c: &mut Criterion) {
    let mut group = c.benchmark_group("header_aware_chunk");
    for sections in [8, 32, 128] {
        let text = paper(sections, 400);
        group.bench_with_input(BenchmarkId::from_parameter(sections), &text, |b, text| {
            b.iter(|| header_aware_chunk(black_box(text), 1024, 50))
        });
    }
    group.finish();
}

fn bench_sliding_window(c: &mut Criterion) {
    let text = paper(1, 50_000);
    let tokens: Vec<&str> = text.split_whitespace().collect();
    c.bench_function("chunk_with_overlap_50k", |b| {
        b.iter(|| chunk_with_overlap(black_box(&tokens), 1024, 256))
    });
}

fn bench_chunker(c: &mut Criterion) {
    let chunker = TextChunker::with_defaults();
    let text = paper(64, 600);
    c.bench_function("text_chunker_default", |b| {
        b.iter(|| chunker.chunk(black_box(&text)))
    });
}

criterion_group!(benches, bench_header_aware, bench_sliding_window, bench_chunker);
criterion_main!(benches);
