use std::sync::LazyLock;
use std::time::Duration;

use prometheus::*;

static METRIC_INSERT_COUNT: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!("imsig_insert_count", "count of the records to insert").unwrap()
});

static METRIC_INSERT_STORED_COUNT: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!("imsig_insert_stored_count", "count of the bucket entries stored")
        .unwrap()
});

static METRIC_SEARCH_COUNT: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!("imsig_search_count", "count of the queries to search").unwrap()
});

static METRIC_SEARCH_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "imsig_search_duration",
        "duration of the per-query search in seconds",
        exponential_buckets(1e-5, 4., 10).unwrap()
    )
    .unwrap()
});

static METRIC_SEARCH_CANDIDATES: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "imsig_search_candidates",
        "number of unique candidates compared per query",
        exponential_buckets(1., 4., 10).unwrap()
    )
    .unwrap()
});

static METRIC_SEARCH_HITS: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "imsig_search_hits",
        "number of matches under the distance cutoff per query",
        exponential_buckets(1., 2., 10).unwrap()
    )
    .unwrap()
});

/// 记录一次插入，`stored` 为实际写入的桶数量
pub fn inc_insert(stored: usize) {
    METRIC_INSERT_COUNT.inc();
    METRIC_INSERT_STORED_COUNT.inc_by(stored as u64);
}

/// 记录一次搜索的耗时、候选数量和命中数量
pub fn observe_search(duration: Duration, candidates: usize, hits: usize) {
    METRIC_SEARCH_COUNT.inc();
    METRIC_SEARCH_DURATION.observe(duration.as_secs_f64());
    METRIC_SEARCH_CANDIDATES.observe(candidates as f64);
    METRIC_SEARCH_HITS.observe(hits as f64);
}

/// 以文本格式导出所有指标
pub fn gather_text() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    Ok(encoder.encode_to_string(&metric_families)?)
}
