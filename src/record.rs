use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{IndexError, Result};

/// 单词字段名，其值直接作为桶键
const WORDS_FIELD: &str = "words";
const PATH_FIELD: &str = "path";
const SIGNATURE_FIELD: &str = "signature";
const METADATA_FIELD: &str = "metadata";

/// 有序且去重的桶键集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Words(Vec<String>);

impl Words {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个桶键，已存在时忽略
    pub fn push(&mut self, word: impl Into<String>) {
        let word = word.into();
        if !self.0.contains(&word) {
            self.0.push(word);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Words {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut seen = HashSet::new();
        let mut words = vec![];
        for word in iter {
            let word = word.into();
            if seen.insert(word.clone()) {
                words.push(word);
            }
        }
        Self(words)
    }
}

/// 待插入索引的一条签名记录
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 图片路径或唯一标识
    pub path: String,
    /// 图片签名
    pub signature: Vec<f32>,
    /// 调用方附加的任意数据，默认为空字符串
    pub metadata: Value,
    /// 由签名派生出的桶键
    pub words: Words,
}

impl Record {
    pub fn new(path: impl Into<String>, signature: Vec<f32>, words: Words) -> Self {
        Self { path: path.into(), signature, metadata: Value::String(String::new()), words }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// 从编码器输出的 JSON 对象解析记录
    ///
    /// 除 `path`、`signature`、`metadata` 以外的字段都会被当作桶键来源，见 [`Words`]。
    pub fn from_json(value: Value) -> Result<Self> {
        let mut map = into_object(value)?;
        let path = match map.remove(PATH_FIELD) {
            Some(Value::String(path)) => path,
            Some(_) => return Err(IndexError::invalid_record("path 必须为字符串")),
            None => return Err(IndexError::invalid_record("缺少 path 字段")),
        };
        let signature = take_signature(&mut map)?;
        let metadata = map.remove(METADATA_FIELD).unwrap_or_else(|| Value::String(String::new()));
        let words = take_words(map)?;
        Ok(Self { path, signature, metadata, words })
    }

    /// 转换为查询，丢弃 path 和 metadata
    pub fn to_query(&self) -> Query {
        Query { signature: self.signature.clone(), words: self.words.clone() }
    }
}

/// 一次搜索请求
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub signature: Vec<f32>,
    pub words: Words,
}

impl Query {
    pub fn new(signature: Vec<f32>, words: Words) -> Self {
        Self { signature, words }
    }

    /// 从 JSON 对象解析查询，`path` 与 `metadata` 可有可无，且会被忽略
    pub fn from_json(value: Value) -> Result<Self> {
        let mut map = into_object(value)?;
        map.remove(PATH_FIELD);
        map.remove(METADATA_FIELD);
        let signature = take_signature(&mut map)?;
        let words = take_words(map)?;
        Ok(Self { signature, words })
    }
}

impl From<Record> for Query {
    fn from(record: Record) -> Self {
        Self { signature: record.signature, words: record.words }
    }
}

/// 搜索结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// 匹配记录的 path
    pub id: String,
    pub metadata: Value,
    /// 与查询签名的归一化距离
    pub dist: f32,
}

fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(IndexError::invalid_record("记录必须是 JSON 对象")),
    }
}

fn take_signature(map: &mut Map<String, Value>) -> Result<Vec<f32>> {
    let values = match map.remove(SIGNATURE_FIELD) {
        Some(Value::Array(values)) => values,
        Some(_) => return Err(IndexError::invalid_record("signature 必须为数组")),
        None => return Err(IndexError::invalid_record("缺少 signature 字段")),
    };
    if values.is_empty() {
        return Err(IndexError::invalid_record("signature 不能为空"));
    }
    values
        .iter()
        .map(|v| match v.as_f64() {
            Some(x) if x.is_finite() => Ok(x as f32),
            _ => Err(IndexError::invalid_record(format!("signature 中包含无效数值: {}", v))),
        })
        .collect()
}

/// 从剩余字段派生桶键
///
/// - `words` 字段中的每个标量直接作为桶键
/// - 其他字段 `f` 的值 `v` 生成 `f:v` 形式的桶键，以区分不同位置的单词
fn take_words(mut map: Map<String, Value>) -> Result<Words> {
    let mut words = Words::new();
    match map.remove(WORDS_FIELD) {
        Some(Value::Array(values)) => {
            for v in values {
                if let Some(word) = scalar_text(&v)? {
                    words.push(word);
                }
            }
        }
        Some(v) => {
            if let Some(word) = scalar_text(&v)? {
                words.push(word);
            }
        }
        None => {}
    }
    // serde_json 的 Map 默认按键排序，因此这里的顺序是确定的
    for (field, v) in map {
        match v {
            Value::Null => {}
            Value::String(s) => words.push(format!("{}:{}", field, s)),
            v => words.push(format!("{}:{}", field, v)),
        }
    }
    Ok(words)
}

fn scalar_text(v: &Value) -> Result<Option<String>> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Err(IndexError::invalid_record(format!("words 中包含无效的值: {}", v))),
    }
}
