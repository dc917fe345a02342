use bookmind::config::RecommendConfig;
use bookmind::dataset::{Dataset, FeatureMatrix};
use bookmind::recommend::Recommender;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const TITLES: usize = 5_000;
const FEATURES: usize = 800;
const NONZEROS_PER_ROW: usize = 40;

/// Deterministic sparse rows, roughly shaped like a user-rating matrix
fn synthetic_recommender() -> Recommender {
    let mut triplets = Vec::with_capacity(TITLES * NONZEROS_PER_ROW);
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    for row in 0..TITLES {
        for _ in 0..NONZEROS_PER_ROW {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let col = (state % FEATURES as u64) as usize;
            let rating = (state % 10 + 1) as f64;
            triplets.push((row, col, rating));
        }
    }

    let titles = (0..TITLES).map(|i| format!("Title {i}")).collect();
    let features = FeatureMatrix::from_triplets((TITLES, FEATURES), &triplets);
    let dataset = Dataset::from_parts(titles, features).expect("valid dataset");
    Recommender::from_dataset(dataset, &RecommendConfig::default()).expect("should fit index")
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let recommender = synthetic_recommender();
    c.bench_function("recommend", |b| {
        b.iter(|| recommender.recommend(black_box("Title 1234"), black_box("book")))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
