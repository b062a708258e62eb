use imsig::{IndexError, Query, Record, SignatureIndex, Words};
use rstest::*;
use serde_json::json;

fn words(words: &[&str]) -> Words {
    words.iter().copied().collect()
}

fn record(path: &str, signature: &[f32], w: &[&str]) -> Record {
    Record::new(path, signature.to_vec(), words(w))
}

fn query(signature: &[f32], w: &[&str]) -> Query {
    Query::new(signature.to_vec(), words(w))
}

#[fixture]
fn index() -> SignatureIndex {
    SignatureIndex::builder().distance_cutoff(0.5).build().unwrap()
}

/// a.jpg: [1,1,1,1] 位于 w1、w2；b.jpg: [1,1,1,2] 位于 w2、w3
#[fixture]
fn populated_index(index: SignatureIndex) -> SignatureIndex {
    index.insert(record("a.jpg", &[1., 1., 1., 1.], &["w1", "w2"])).unwrap();
    index.insert(record("b.jpg", &[1., 1., 1., 2.], &["w2", "w3"])).unwrap();
    index
}

#[rstest]
fn test_search_single_bucket(populated_index: SignatureIndex) {
    let hits = populated_index.search(&query(&[1., 1., 1., 1.], &["w1"])).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "a.jpg");
    assert_eq!(hits[0].dist, 0.);
}

#[rstest]
fn test_search_shared_bucket(populated_index: SignatureIndex) {
    let hits = populated_index.search(&query(&[1., 1., 1., 1.], &["w2"])).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "a.jpg");
    assert_eq!(hits[0].dist, 0.);
    assert_eq!(hits[1].id, "b.jpg");
    // 只有一个分量相差 1：1 / (2 + sqrt(7))
    assert!((hits[1].dist - 1. / (2. + 7f32.sqrt())).abs() < 1e-6);
}

#[rstest]
fn test_search_cutoff_filters(populated_index: SignatureIndex) {
    let strict = SignatureIndex::builder().distance_cutoff(0.1).build().unwrap();
    strict.insert(record("a.jpg", &[1., 1., 1., 1.], &["w2"])).unwrap();
    strict.insert(record("b.jpg", &[1., 1., 1., 2.], &["w2"])).unwrap();
    let hits = strict.search(&query(&[1., 1., 1., 1.], &["w2"])).unwrap();
    assert_eq!(hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), ["a.jpg"]);

    // 宽松阈值下两者都返回
    let hits = populated_index.search(&query(&[1., 1., 1., 1.], &["w2", "w3"])).unwrap();
    assert_eq!(hits.len(), 2);
}

#[rstest]
fn test_search_cutoff_is_exclusive() {
    // [0, 1] 与 [1, 0] 的距离为 sqrt(2) / 2
    let d = 2f32.sqrt() / 2.;
    let index = SignatureIndex::builder().distance_cutoff(d).build().unwrap();
    index.insert(record("a.jpg", &[1., 0.], &["w"])).unwrap();
    let hits = index.search(&query(&[0., 1.], &["w"])).unwrap();
    assert!(hits.is_empty());

    let index = SignatureIndex::builder().distance_cutoff(d + 1e-4).build().unwrap();
    index.insert(record("a.jpg", &[1., 0.], &["w"])).unwrap();
    let hits = index.search(&query(&[0., 1.], &["w"])).unwrap();
    assert_eq!(hits.len(), 1);
}

#[rstest]
fn test_zero_cutoff_excludes_self() {
    let index = SignatureIndex::builder().distance_cutoff(0.).build().unwrap();
    index.insert(record("a.jpg", &[1., 2.], &["w"])).unwrap();
    assert!(index.search(&query(&[1., 2.], &["w"])).unwrap().is_empty());
}

#[rstest]
fn test_reinsert_is_idempotent(populated_index: SignatureIndex) {
    assert_eq!(populated_index.bucket_len("w1"), 1);
    let stored = populated_index.insert(record("a.jpg", &[1., 1., 1., 1.], &["w1", "w2"])).unwrap();
    assert_eq!(stored, 0);
    assert_eq!(populated_index.bucket_len("w1"), 1);
    assert_eq!(populated_index.bucket_len("w2"), 2);
    assert_eq!(populated_index.entry_count(), 4);
}

#[rstest]
fn test_dedup_is_per_bucket(index: SignatureIndex) {
    index.insert(record("a.jpg", &[3., 3.], &["A"])).unwrap();
    // 签名已存在于 A，但 B 中没有，因此仍会写入 B
    let stored = index.insert(record("a-copy.jpg", &[3., 3.], &["A", "B"])).unwrap();
    assert_eq!(stored, 1);
    assert_eq!(index.bucket_len("A"), 1);
    assert_eq!(index.bucket_len("B"), 1);

    let hits = index.search(&query(&[3., 3.], &["A", "B"])).unwrap();
    assert_eq!(hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), ["a-copy.jpg", "a.jpg"]);
}

#[rstest]
fn test_same_path_returned_once(index: SignatureIndex) {
    index.insert(record("a.jpg", &[1., 1.], &["w1", "w2", "w3"])).unwrap();
    let hits = index.search(&query(&[1., 1.], &["w1", "w2", "w3"])).unwrap();
    assert_eq!(hits.len(), 1);
}

#[rstest]
fn test_empty_index(index: SignatureIndex) {
    assert!(index.search(&query(&[1., 1.], &["w1"])).unwrap().is_empty());
    assert!(index.is_empty());
}

#[rstest]
fn test_no_overlap(populated_index: SignatureIndex) {
    assert!(populated_index.search(&query(&[1., 1., 1., 1.], &["w9"])).unwrap().is_empty());
    assert!(populated_index.search(&query(&[1., 1., 1., 1.], &[])).unwrap().is_empty());
}

#[rstest]
fn test_wrong_dimension(populated_index: SignatureIndex) {
    let err = populated_index.search(&query(&[1., 1.], &["w1"])).unwrap_err();
    assert!(matches!(err, IndexError::InvalidRecord { .. }));

    let err = populated_index.insert(record("c.jpg", &[1., 1.], &["w4"])).unwrap_err();
    assert!(matches!(err, IndexError::InvalidRecord { .. }));
    assert_eq!(populated_index.bucket_len("w4"), 0);
}

#[rstest]
fn test_metadata_round_trip(index: SignatureIndex) {
    let rec = Record::from_json(json!({
        "path": "a.jpg",
        "signature": [0, 1, 2],
        "words": ["w1"],
        "metadata": {"source": "wiki", "tags": ["cat"]},
    }))
    .unwrap();
    index.insert(rec).unwrap();

    let q = Query::from_json(json!({"signature": [0, 1, 2], "words": ["w1"]})).unwrap();
    let hits = index.search(&q).unwrap();
    assert_eq!(hits[0].metadata, json!({"source": "wiki", "tags": ["cat"]}));
    assert_eq!(
        serde_json::to_value(&hits[0]).unwrap(),
        json!({"id": "a.jpg", "metadata": {"source": "wiki", "tags": ["cat"]}, "dist": 0.0})
    );
}

#[rstest]
fn test_positional_word_fields(index: SignatureIndex) {
    let rec = Record::from_json(json!({
        "path": "a.jpg",
        "signature": [1, 0, 1],
        "simple_word_0": 12,
        "simple_word_1": 7,
    }))
    .unwrap();
    index.insert(rec).unwrap();

    // 相同的值出现在不同位置，不应该命中
    let q = Query::from_json(json!({"signature": [1, 0, 1], "simple_word_0": 7})).unwrap();
    assert!(index.search(&q).unwrap().is_empty());

    let q = Query::from_json(json!({"signature": [1, 0, 1], "simple_word_1": 7})).unwrap();
    assert_eq!(index.search(&q).unwrap().len(), 1);
}

#[rstest]
fn test_concurrent_insert_and_search(index: SignatureIndex) {
    std::thread::scope(|s| {
        for t in 0..4 {
            let index = &index;
            s.spawn(move || {
                for i in 0..50 {
                    let path = format!("{}-{}.jpg", t, i);
                    index.insert(record(&path, &[t as f32, i as f32, 1.], &["shared"])).unwrap();
                    index.search(&query(&[0., 0., 1.], &["shared"])).unwrap();
                }
            });
        }
    });
    assert_eq!(index.bucket_len("shared"), 200);
}
