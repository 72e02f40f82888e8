//! Benchmarks for field extraction and report serialization.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write as _;

use serp_analyzer::extractor::extract;
use serp_analyzer::models::{AnalysisReport, RankedUrl, ReportEntry};
use serp_analyzer::output::to_csv_string;
use serp_analyzer::testing::fixtures;

fn large_page(sections: usize) -> String {
    let mut html = String::from(
        "<html><head><title>Large page</title><meta name=\"description\" content=\"Bench\"></head><body>",
    );
    for i in 0..sections {
        let _ = write!(
            html,
            "<h2>Section {i}</h2><p>Paragraph with <b>bold</b> text &amp; entities.</p><h3>Sub <em>{i}</em></h3>"
        );
    }
    html.push_str("</body></html>");
    html
}

fn extract_benchmark(c: &mut Criterion) {
    c.bench_function("extract_article", |b| {
        b.iter(|| extract(black_box(fixtures::ARTICLE_PAGE)))
    });

    let large = large_page(500);
    c.bench_function("extract_large_page", |b| {
        b.iter(|| extract(black_box(&large)))
    });
}

fn csv_benchmark(c: &mut Criterion) {
    let fields = extract(&large_page(20));
    let mut report = AnalysisReport::new("bench", 100);
    for ranked in RankedUrl::rank_all((0..100).map(|i| format!("https://site{i}.example/"))) {
        report.entries.push(ReportEntry::page(&ranked, fields.clone()));
    }

    c.bench_function("csv_100_entries", |b| {
        b.iter(|| to_csv_string(black_box(&report)))
    });
}

criterion_group!(benches, extract_benchmark, csv_benchmark);
criterion_main!(benches);
