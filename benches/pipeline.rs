//! Pipeline benchmark: offline extraction (probe and fetch disabled) and CSV export.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use phishscan::config::ExtractorConfig;
use phishscan::export::write_csv;
use phishscan::features::FeatureExtractor;

fn make_urls(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("http://login-{}.secure-update.tk/account/verify.php?session={}", i, i * 7919))
        .collect()
}

fn bench_offline_extraction(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let extractor = FeatureExtractor::new(ExtractorConfig::offline()).unwrap();
    let urls = make_urls(100);

    c.bench_function("extract_batch_100_offline", |b| {
        b.iter(|| black_box(rt.block_on(extractor.extract_batch(black_box(&urls)))))
    });

    let records = rt.block_on(extractor.extract_batch(&urls));
    c.bench_function("write_csv_100", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(64 * 1024);
            write_csv(black_box(&records), &mut out).unwrap();
            black_box(out)
        })
    });
}

criterion_group!(benches, bench_offline_extraction);
criterion_main!(benches);
