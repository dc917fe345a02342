use super::*;
use crate::dataset::FeatureMatrix;

fn titles(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

fn recommender(names: &[&str], triplets: &[(usize, usize, f64)], cols: usize) -> Recommender {
    recommender_with(names, triplets, cols, &RecommendConfig::default())
}

fn recommender_with(
    names: &[&str],
    triplets: &[(usize, usize, f64)],
    cols: usize,
    config: &RecommendConfig,
) -> Recommender {
    let features = FeatureMatrix::from_triplets((names.len(), cols), triplets);
    let dataset = Dataset::from_parts(titles(names), features).expect("valid dataset");
    Recommender::from_dataset(dataset, config).expect("should fit index")
}

/// Unit vectors fanning out from the x axis in 5 degree steps, so row `i` is
/// farther from row 0 than row `i - 1`.
fn fan_recommender(count: usize) -> (Recommender, Vec<String>) {
    let names: Vec<String> = (0..count).map(|i| format!("Book {i:02}")).collect();
    let mut triplets = Vec::new();
    for i in 0..count {
        let angle = (i as f64 * 5.0).to_radians();
        triplets.push((i, 0, angle.cos()));
        triplets.push((i, 1, angle.sin()));
    }
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    (recommender(&refs, &triplets, 2), names)
}

fn result_titles(result: &RecommendationResult) -> Vec<&str> {
    result
        .recommendations
        .iter()
        .map(|r| r.title.as_str())
        .collect()
}

#[test]
fn three_title_scenario_is_farthest_first() {
    let recommender = recommender(
        &["Book A", "Book B", "Book C"],
        &[(0, 0, 1.0), (1, 0, 1.0), (1, 1, 0.2), (2, 1, 1.0)],
        2,
    );

    let result = recommender
        .recommend("Book A", "book")
        .expect("known title should succeed");

    assert_eq!(result.input_book, "Book A");
    assert_eq!(result_titles(&result), vec!["Book C", "Book B"]);
    assert_eq!(result.recommendations[0].distance, 1.0);
    assert_eq!(result.recommendations[1].distance, 0.0194);
}

#[test]
fn unknown_title_is_not_found() {
    let (recommender, _) = fan_recommender(5);

    let error = recommender
        .recommend("Nonexistent Title", "book")
        .expect_err("unknown title should fail");

    assert_eq!(
        error,
        RecommendError::NotFound {
            title: "Nonexistent Title".to_string()
        }
    );
    assert!(error.to_string().contains("Nonexistent Title"));
}

#[test]
fn ten_results_excluding_query() {
    let (recommender, names) = fan_recommender(15);

    let result = recommender.recommend(&names[0], "book").expect("should succeed");

    assert_eq!(result.recommendations.len(), 10);
    assert!(result_titles(&result).iter().all(|t| *t != names[0]));

    let expected: Vec<&str> = (1..=10).rev().map(|i| names[i].as_str()).collect();
    assert_eq!(result_titles(&result), expected);
}

#[test]
fn distances_descend_and_are_rounded() {
    let (recommender, names) = fan_recommender(15);

    for name in &names {
        let result = recommender.recommend(name, "book").expect("should succeed");
        let distances: Vec<f64> = result.recommendations.iter().map(|r| r.distance).collect();

        assert!(distances.windows(2).all(|pair| pair[0] >= pair[1]));
        for distance in distances {
            assert!(distance >= 0.0);
            let scaled = distance * 10_000.0;
            assert!((scaled - scaled.round()).abs() < 1e-6);
        }
    }
}

#[test]
fn small_dataset_returns_all_other_titles() {
    for count in 1..=12 {
        let (recommender, names) = fan_recommender(count);
        for name in &names {
            let result = recommender.recommend(name, "book").expect("should succeed");
            assert_eq!(result.recommendations.len(), (count - 1).min(10));
            assert!(result_titles(&result).iter().all(|t| t != name));
        }
    }
}

#[test]
fn search_type_does_not_change_result() {
    let (recommender, names) = fan_recommender(8);
    let by_book = recommender.recommend(&names[3], "book").expect("should succeed");
    let by_author = recommender.recommend(&names[3], "author").expect("should succeed");
    assert_eq!(by_book, by_author);
}

#[test]
fn repeated_calls_are_identical() {
    let (recommender, names) = fan_recommender(20);
    let first = recommender.recommend(&names[7], "book").expect("should succeed");
    let second = recommender.recommend(&names[7], "book").expect("should succeed");
    assert_eq!(first, second);
}

#[test]
fn identical_vectors_never_return_the_query() {
    let config = RecommendConfig { neighbor_count: 2 };
    let recommender = recommender_with(
        &["Twin One", "Twin Two", "Other"],
        &[(0, 0, 1.0), (1, 0, 1.0), (2, 1, 1.0)],
        2,
        &config,
    );

    let result = recommender.recommend("Twin Two", "book").expect("should succeed");
    assert_eq!(result_titles(&result), vec!["Twin One"]);
    assert_eq!(result.recommendations[0].distance, 0.0);
}

#[test]
fn query_outside_neighbor_set_drops_nearest() {
    let config = RecommendConfig { neighbor_count: 2 };
    // "Blank" has no features, so every row is at distance 1 from it and the
    // tie break keeps rows 0 and 1 only.
    let recommender = recommender_with(
        &["First", "Second", "Blank"],
        &[(0, 0, 1.0), (1, 1, 1.0)],
        2,
        &config,
    );

    let result = recommender.recommend("Blank", "book").expect("should succeed");
    assert_eq!(result_titles(&result), vec!["Second"]);
    assert_eq!(result.recommendations[0].distance, 1.0);
}

#[test]
fn custom_neighbor_count() {
    let config = RecommendConfig { neighbor_count: 4 };
    let names: Vec<String> = (0..10).map(|i| format!("Book {i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let triplets: Vec<(usize, usize, f64)> = (0..10)
        .flat_map(|i| {
            let angle = (i as f64 * 5.0).to_radians();
            [(i, 0, angle.cos()), (i, 1, angle.sin())]
        })
        .collect();
    let recommender = recommender_with(&refs, &triplets, 2, &config);

    let result = recommender.recommend("Book 0", "book").expect("should succeed");
    assert_eq!(result_titles(&result), vec!["Book 3", "Book 2", "Book 1"]);
}

struct FailingIndex;

impl NeighborIndex for FailingIndex {
    fn len(&self) -> usize {
        3
    }

    fn kneighbors(&self, row: usize, _k: usize) -> Result<Vec<Neighbor>, IndexError> {
        Err(IndexError::RowOutOfRange { row, rows: 0 })
    }
}

/// Reports a neighbor row the title index does not have
struct MisalignedIndex;

impl NeighborIndex for MisalignedIndex {
    fn len(&self) -> usize {
        3
    }

    fn kneighbors(&self, row: usize, _k: usize) -> Result<Vec<Neighbor>, IndexError> {
        Ok(vec![
            Neighbor { row, distance: 0.0 },
            Neighbor {
                row: 42,
                distance: 0.5,
            },
        ])
    }
}

/// Reports NaN distances for every row but the query
struct NanIndex;

impl NeighborIndex for NanIndex {
    fn len(&self) -> usize {
        3
    }

    fn kneighbors(&self, row: usize, _k: usize) -> Result<Vec<Neighbor>, IndexError> {
        Ok((0..3)
            .map(|candidate| Neighbor {
                row: candidate,
                distance: if candidate == row { 0.0 } else { f64::NAN },
            })
            .collect())
    }
}

fn stub_recommender(index: Arc<dyn NeighborIndex>) -> Recommender {
    let titles = TitleIndex::new(titles(&["A", "B", "C"])).expect("unique titles");
    Recommender::new(titles, index, &RecommendConfig::default()).expect("sizes should match")
}

#[test]
fn index_failure_is_internal() {
    let recommender = stub_recommender(Arc::new(FailingIndex));

    match recommender.recommend("B", "book") {
        Err(RecommendError::Internal { message }) => {
            assert!(message.contains("out of range"));
        }
        other => panic!("Expected internal error, got {:?}", other),
    }
}

#[test]
fn misaligned_rows_are_internal() {
    let recommender = stub_recommender(Arc::new(MisalignedIndex));

    match recommender.recommend("A", "book") {
        Err(RecommendError::Internal { message }) => {
            assert!(message.contains("42"));
        }
        other => panic!("Expected internal error, got {:?}", other),
    }
}

#[test]
fn non_finite_distance_is_internal() {
    let recommender = stub_recommender(Arc::new(NanIndex));

    match recommender.recommend("A", "book") {
        Err(RecommendError::Internal { message }) => {
            assert!(message.contains("not a finite number"));
        }
        other => panic!("Expected internal error, got {:?}", other),
    }
}

#[test]
fn index_size_must_match_titles() {
    let titles = TitleIndex::new(titles(&["A", "B"])).expect("unique titles");
    let result = Recommender::new(titles, Arc::new(FailingIndex), &RecommendConfig::default());
    assert_eq!(
        result.err(),
        Some(IndexError::SizeMismatch { titles: 2, rows: 3 })
    );
}

#[test]
fn duplicate_title_cannot_recommend_itself() {
    let features =
        FeatureMatrix::from_triplets((3, 2), &[(0, 0, 1.0), (1, 1, 1.0), (2, 0, 1.0)]);
    let result = Dataset::from_parts(titles(&["Dune", "Emma", "Dune"]), features);
    assert!(matches!(
        result,
        Err(crate::dataset::DatasetError::DuplicateTitle {
            ref title,
            first: 0,
            duplicate: 2,
        }) if title == "Dune"
    ));
}

#[test]
fn result_serializes_to_api_shape() {
    let result = RecommendationResult {
        input_book: "Dune".to_string(),
        recommendations: vec![Recommendation {
            title: "Hyperion".to_string(),
            distance: 0.1234,
        }],
    };

    let value = serde_json::to_value(&result).expect("should serialize");
    assert_eq!(
        value,
        serde_json::json!({
            "input_book": "Dune",
            "recommendations": [{"title": "Hyperion", "distance": 0.1234}]
        })
    );
}

#[test]
fn rounding_clamps_negative_noise() {
    assert_eq!(round_distance(-1e-16), 0.0);
    assert!(round_distance(-1e-16).is_sign_positive());
    assert_eq!(round_distance(0.123_456), 0.1235);
    assert_eq!(round_distance(0.999_96), 1.0);
}
