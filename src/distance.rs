use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

/// 计算两个签名之间的归一化距离：`|a - b| / (|a| + |b|)`
///
/// 结果位于 `[0, 1]` 区间，0 表示完全相同。两个向量都为零向量时返回 0。
/// 中间结果使用 f64 累加，数值很大的签名也不会溢出。
#[inline]
pub fn normalized_distance(va: &[f32], vb: &[f32]) -> f32 {
    assert_eq!(va.len(), vb.len(), "signature length mismatch");
    let top = l2_diff(va, vb);
    let bottom = l2_norm(va) + l2_norm(vb);
    ratio(top, bottom)
}

/// 批量计算候选矩阵中每一行与查询签名的归一化距离
///
/// 参数：
/// - candidates: 形状为 `(n, dim)` 的候选签名矩阵
/// - query: 长度为 `dim` 的查询签名
pub fn normalized_distances(candidates: ArrayView2<f32>, query: ArrayView1<f32>) -> Array1<f32> {
    assert_eq!(candidates.ncols(), query.len(), "signature length mismatch");
    let query_norm = l2_norm(query);
    candidates.map_axis(Axis(1), |row| ratio(l2_diff(row, query), l2_norm(row) + query_norm))
}

#[inline(always)]
fn l2_norm<'a>(v: impl IntoIterator<Item = &'a f32>) -> f64 {
    v.into_iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt()
}

#[inline(always)]
fn l2_diff<'a, 'b>(va: impl IntoIterator<Item = &'a f32>, vb: impl IntoIterator<Item = &'b f32>) -> f64 {
    va.into_iter()
        .zip(vb)
        .map(|(&a, &b)| {
            let d = f64::from(a) - f64::from(b);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[inline(always)]
fn ratio(top: f64, bottom: f64) -> f32 {
    // 分母为 0 说明两个都是零向量，即完全相同
    if bottom == 0.0 { 0.0 } else { (top / bottom) as f32 }
}
