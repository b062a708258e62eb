use serde::Serialize;
use utoipa::ToSchema;

use crate::record::SearchHit;

/// 签名记录（用于API文档）
///
/// 除下列字段外，其余字段 `f` 的值 `v` 会生成 `f:v` 形式的桶键。
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct RecordForm {
    /// 图片路径或唯一标识，搜索时可省略
    pub path: Option<String>,
    /// 图片签名
    pub signature: Vec<f32>,
    /// 桶键列表
    pub words: Option<Vec<String>>,
    /// 附加数据，原样返回
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

/// 添加记录的响应
#[derive(Debug, Serialize, ToSchema)]
pub struct AddResponse {
    /// 实际写入的桶数量
    pub stored: usize,
}

/// 单条搜索结果（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct SearchHitForm {
    /// 匹配记录的 path
    pub id: String,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    /// 归一化距离
    pub dist: f32,
}

/// 搜索响应
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// 搜索耗时，单位为毫秒
    pub time: u64,
    #[schema(value_type = Vec<SearchHitForm>)]
    pub result: Vec<SearchHit>,
}

/// 索引统计信息
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// 桶的数量
    pub buckets: usize,
    /// 所有桶中的记录副本总数
    pub entries: usize,
    /// 签名维度
    pub dimension: Option<usize>,
    /// 距离阈值
    pub distance_cutoff: f32,
}
