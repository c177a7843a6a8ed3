use criterion::{criterion_group, criterion_main, Criterion};
use newsrank::normalize::normalize;
use newsrank::{Document, IndexConfig, RankingIndex, SearchOptions, StopWordSource};

const ARTICLE: &str = "Le gouvernement a présenté mercredi son projet de budget pour l'année \
    prochaine. Les députés examineront le texte à l'Assemblée nationale dès la semaine \
    prochaine, alors que l'opposition dénonce une hausse des impôts.";

fn corpus() -> Vec<Document> {
    (0..500)
        .map(|i| Document::new(i, format!("Article {i}"), "Politique", format!("{ARTICLE} numéro{}", i % 37)))
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_article", |b| b.iter(|| normalize(ARTICLE)));
}

fn bench_build_and_search(c: &mut Criterion) {
    let cfg = IndexConfig::default().with_stop_words(StopWordSource::BuiltinFrench);
    c.bench_function("build_500_docs", |b| b.iter(|| RankingIndex::build(corpus(), &cfg).unwrap()));

    let index = RankingIndex::build(corpus(), &cfg).unwrap();
    let opts = SearchOptions::default();
    c.bench_function("search_two_terms", |b| b.iter(|| index.search("budget numéro7", &opts).unwrap()));
}

criterion_group!(benches, bench_normalize, bench_build_and_search);
criterion_main!(benches);
