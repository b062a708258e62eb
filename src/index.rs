use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use log::debug;
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde_json::Value;

use crate::distance::normalized_distances;
use crate::error::{IndexError, Result};
use crate::metrics;
use crate::record::{Query, Record, SearchHit};

/// 默认的距离阈值，与 image-match 保持一致
pub const DEFAULT_DISTANCE_CUTOFF: f32 = 0.45;

/// 桶中的一份记录副本
#[derive(Debug, Clone)]
struct Entry {
    path: String,
    signature: Vec<f32>,
    metadata: Value,
}

#[derive(Debug, Default)]
struct Buckets {
    /// 签名维度，未指定时由第一条插入的记录决定
    dimension: Option<usize>,
    map: HashMap<String, Vec<Entry>>,
}

impl Buckets {
    fn check_dimension(&self, signature: &[f32]) -> Result<()> {
        match self.dimension {
            Some(dim) if dim != signature.len() => Err(IndexError::invalid_record(format!(
                "签名维度不匹配: 期望 {}，实际 {}",
                dim,
                signature.len()
            ))),
            _ => Ok(()),
        }
    }
}

pub struct SignatureIndexBuilder {
    distance_cutoff: f32,
    size: Option<usize>,
    dimension: Option<usize>,
}

impl Default for SignatureIndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureIndexBuilder {
    pub fn new() -> Self {
        Self { distance_cutoff: DEFAULT_DISTANCE_CUTOFF, size: None, dimension: None }
    }

    /// 最大距离阈值，距离严格小于该值的候选才会被返回
    pub fn distance_cutoff(mut self, distance_cutoff: f32) -> Self {
        self.distance_cutoff = distance_cutoff;
        self
    }

    /// 单次搜索返回的最大结果数量
    pub fn size(mut self, size: Option<usize>) -> Self {
        self.size = size;
        self
    }

    /// 固定签名维度
    pub fn dimension(mut self, dimension: Option<usize>) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn build(self) -> Result<SignatureIndex> {
        if !self.distance_cutoff.is_finite() || self.distance_cutoff < 0. {
            return Err(IndexError::invalid_config(format!(
                "distance_cutoff 必须为非负有限数: {}",
                self.distance_cutoff
            )));
        }
        if self.size == Some(0) {
            return Err(IndexError::invalid_config("size 必须大于 0"));
        }
        if self.dimension == Some(0) {
            return Err(IndexError::invalid_config("dimension 必须大于 0"));
        }
        Ok(SignatureIndex {
            distance_cutoff: self.distance_cutoff,
            size: self.size,
            buckets: RwLock::new(Buckets { dimension: self.dimension, map: HashMap::new() }),
        })
    }
}

/// 基于桶的近似最近邻签名索引
///
/// 每条记录会按其桶键复制到多个桶中，搜索时只比较与查询共享至少一个桶键的记录。
/// 搜索共享读锁，插入互相串行。
pub struct SignatureIndex {
    distance_cutoff: f32,
    size: Option<usize>,
    buckets: RwLock<Buckets>,
}

impl SignatureIndex {
    /// 使用默认参数创建一个空索引
    pub fn new() -> Self {
        Self {
            distance_cutoff: DEFAULT_DISTANCE_CUTOFF,
            size: None,
            buckets: RwLock::new(Buckets::default()),
        }
    }

    pub fn builder() -> SignatureIndexBuilder {
        SignatureIndexBuilder::new()
    }

    /// 插入一条记录，返回实际写入的桶数量
    ///
    /// 若某个桶中已经存在签名完全相同的记录，则跳过该桶，已有记录不会被更新。
    /// 去重只在单个桶内进行，不同桶之间互不影响。
    /// 未固定维度时，由第一条真正写入桶的记录决定维度。
    pub fn insert(&self, record: Record) -> Result<usize> {
        validate_signature(&record.signature)?;

        let mut buckets = self.write();
        buckets.check_dimension(&record.signature)?;

        let Record { path, signature, metadata, words } = record;
        let mut stored = 0;
        for word in words.iter() {
            let bucket = buckets.map.entry(word.to_owned()).or_default();
            if bucket.iter().any(|entry| entry.signature == signature) {
                continue;
            }
            bucket.push(Entry {
                path: path.clone(),
                signature: signature.clone(),
                metadata: metadata.clone(),
            });
            stored += 1;
        }
        if stored > 0 && buckets.dimension.is_none() {
            debug!("签名维度设置为 {}", signature.len());
            buckets.dimension = Some(signature.len());
        }

        metrics::inc_insert(stored);
        Ok(stored)
    }

    /// 搜索与查询签名距离小于阈值的记录，结果按距离升序排列
    ///
    /// 同一 path 出现在多个桶中时只保留第一次出现的副本，
    /// 访问顺序为查询桶键的顺序以及桶内的插入顺序。
    pub fn search(&self, query: &Query) -> Result<Vec<SearchHit>> {
        let start = Instant::now();
        validate_signature(&query.signature)?;

        let buckets = self.read();
        buckets.check_dimension(&query.signature)?;

        let mut seen = HashSet::new();
        let mut candidates = vec![];
        for word in query.words.iter() {
            let Some(bucket) = buckets.map.get(word) else {
                continue;
            };
            for entry in bucket {
                if seen.insert(entry.path.as_str()) {
                    candidates.push(entry);
                }
            }
        }

        if candidates.is_empty() {
            metrics::observe_search(start.elapsed(), 0, 0);
            return Ok(vec![]);
        }

        let dim = query.signature.len();
        let mut flat = Vec::with_capacity(candidates.len() * dim);
        for entry in &candidates {
            flat.extend_from_slice(&entry.signature);
        }
        let matrix = Array2::from_shape_vec((candidates.len(), dim), flat)
            .map_err(|e| IndexError::invalid_record(e.to_string()))?;
        let query_view = ArrayView1::from(query.signature.as_slice());
        let dists = normalized_distances(matrix.view(), query_view);

        let hits = candidates
            .iter()
            .zip(dists.iter())
            .filter(|(_, dist)| **dist < self.distance_cutoff)
            .map(|(entry, &dist)| SearchHit {
                id: entry.path.clone(),
                metadata: entry.metadata.clone(),
                dist,
            })
            .collect::<Vec<_>>();
        let hits = self.finish(hits);

        debug!(
            "搜索完成: {} 个候选，{} 个结果，耗时 {:.2}ms",
            candidates.len(),
            hits.len(),
            start.elapsed().as_secs_f32() * 1000.
        );
        metrics::observe_search(start.elapsed(), candidates.len(), hits.len());
        Ok(hits)
    }

    /// 并行搜索多个查询，并按 id 合并结果，同一 id 保留最小距离
    ///
    /// 常用于同一张图片的多个方向的签名。
    pub fn search_many(&self, queries: &[Query]) -> Result<Vec<SearchHit>> {
        let results =
            queries.par_iter().map(|query| self.search(query)).collect::<Result<Vec<_>>>()?;

        let mut merged: HashMap<String, SearchHit> = HashMap::new();
        for hit in results.into_iter().flatten() {
            match merged.get_mut(&hit.id) {
                Some(best) if best.dist <= hit.dist => {}
                Some(best) => *best = hit,
                None => {
                    merged.insert(hit.id.clone(), hit);
                }
            }
        }
        Ok(self.finish(merged.into_values().collect()))
    }

    /// 桶的数量
    pub fn bucket_count(&self) -> usize {
        self.read().map.len()
    }

    /// 指定桶中的记录数量，桶不存在时返回 0
    pub fn bucket_len(&self, word: &str) -> usize {
        self.read().map.get(word).map_or(0, Vec::len)
    }

    /// 所有桶中的记录副本总数
    pub fn entry_count(&self) -> usize {
        self.read().map.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.read().map.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.read().dimension
    }

    pub fn distance_cutoff(&self) -> f32 {
        self.distance_cutoff
    }

    pub fn size(&self) -> Option<usize> {
        self.size
    }

    fn finish(&self, mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
        hits.sort_unstable_by(|a, b| a.dist.total_cmp(&b.dist).then_with(|| a.id.cmp(&b.id)));
        if let Some(size) = self.size {
            hits.truncate(size);
        }
        hits
    }

    // 锁中毒时直接沿用内部数据，插入在校验通过后才会修改桶
    fn read(&self) -> RwLockReadGuard<'_, Buckets> {
        self.buckets.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Buckets> {
        self.buckets.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SignatureIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_signature(signature: &[f32]) -> Result<()> {
    if signature.is_empty() {
        return Err(IndexError::invalid_record("signature 不能为空"));
    }
    if signature.iter().any(|x| !x.is_finite()) {
        return Err(IndexError::invalid_record("signature 中包含无效数值"));
    }
    Ok(())
}
