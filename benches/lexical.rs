//! Lexical analysis benchmark: the network-free pass every URL goes through.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use phishscan::config::KeywordLists;
use phishscan::features::LexicalFeatures;

const URLS: &[&str] = &[
    "http://paypal-secure-login.tk/verify",
    "https://www.example.com/index.html",
    "http://192.168.10.4:8080/wp-admin/login.php?next=%2Faccount&id=12345",
    "https://accounts.google.com.signin-verify.xyz/ServiceLogin?continue=https://mail.google.com",
    "bit.ly/3xYz9",
];

fn bench_lexical(c: &mut Criterion) {
    let lists = KeywordLists::default().normalized();

    c.bench_function("lexical_single_url", |b| {
        b.iter(|| black_box(LexicalFeatures::analyze(black_box(URLS[3]), &lists)))
    });

    c.bench_function("lexical_mixed_5", |b| {
        b.iter(|| {
            for url in URLS {
                black_box(LexicalFeatures::analyze(black_box(url), &lists));
            }
        })
    });
}

criterion_group!(benches, bench_lexical);
criterion_main!(benches);
