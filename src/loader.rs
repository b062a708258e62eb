use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressIterator};
use log::{info, warn};
use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;
use walkdir::WalkDir;

use crate::index::SignatureIndex;
use crate::record::Record;
use crate::utils::pb_style;

/// 批量加载的统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// 读取的文件数量
    pub files: usize,
    /// 成功解析并插入的记录数量
    pub records: usize,
    /// 实际写入的桶副本数量
    pub stored: usize,
    /// 解析或插入失败的行数
    pub failed: usize,
    /// 读取失败而被跳过的文件数量
    pub unreadable: usize,
}

/// 根据逗号分隔的后缀名构建匹配正则
pub fn suffix_regex(suffix: &str) -> Result<Regex> {
    let re = format!("^(?i)({})$", suffix.replace(',', "|"));
    Ok(Regex::new(&re)?)
}

/// 扫描文件或目录，返回所有后缀匹配的文件
pub fn scan_files(path: impl AsRef<Path>, re_suf: &Regex) -> Vec<PathBuf> {
    let path = path.as_ref();
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            let ext = path.extension()?;
            (path.is_file() && re_suf.is_match(&ext.to_string_lossy())).then(|| path.to_path_buf())
        })
        .collect::<Vec<_>>();
    files.sort();
    files
}

/// 从 JSON Lines 文件中加载记录到索引
///
/// 每行一条记录，空行会被跳过，无效的行只会记录警告。
pub fn load_records(
    index: &SignatureIndex,
    path: impl AsRef<Path>,
    re_suf: &Regex,
) -> Result<LoadReport> {
    let path = path.as_ref();
    info!("开始扫描: {}", path.display());
    let files = scan_files(path, re_suf);
    info!("扫描完成，共 {} 个文件", files.len());

    let mut report = LoadReport::default();
    let pb = ProgressBar::new(files.len() as u64).with_style(pb_style());
    for file in files.iter().progress_with(pb.clone()) {
        pb.set_message(file.display().to_string());
        let content = match fs::read(file) {
            Ok(content) => content,
            Err(e) => {
                warn!("读取 {} 失败: {}", file.display(), e);
                report.unreadable += 1;
                continue;
            }
        };
        let stats = load_lines(index, &content, file);
        report.files += 1;
        report.records += stats.records;
        report.stored += stats.stored;
        report.failed += stats.failed;
    }
    pb.finish_with_message("记录加载完成");

    info!(
        "共加载 {} 条记录，写入 {} 个桶副本，失败 {} 条，跳过 {} 个文件",
        report.records, report.stored, report.failed, report.unreadable
    );
    Ok(report)
}

/// 并行解析一段 JSON Lines 文本，再按行序依次插入
///
/// 按行解码 UTF-8，单行编码错误与 JSON 错误一样只计入失败。
fn load_lines(index: &SignatureIndex, content: &[u8], file: &Path) -> LoadReport {
    let lines = content.split(|&b| b == b'\n').enumerate().collect::<Vec<_>>();
    let parsed = lines
        .into_par_iter()
        .filter(|(_, line)| !line.trim_ascii().is_empty())
        .map(|(no, line)| (no, parse_line(line)))
        .collect::<Vec<_>>();

    let mut report = LoadReport::default();
    for (no, record) in parsed {
        match record.and_then(|record| Ok(index.insert(record)?)) {
            Ok(n) => {
                report.records += 1;
                report.stored += n;
            }
            Err(e) => {
                warn!("{}:{}: {}", file.display(), no + 1, e);
                report.failed += 1;
            }
        }
    }
    report
}

fn parse_line(line: &[u8]) -> Result<Record> {
    let line = std::str::from_utf8(line)?;
    let value = serde_json::from_str::<Value>(line)?;
    Ok(Record::from_json(value)?)
}
