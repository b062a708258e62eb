use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use log::debug;
use serde_json::Value;
use tokio::task::block_in_place;

use crate::cli::{SubCommandExtend, open_index};
use crate::config::{IndexOptions, Opts};
use crate::record::{Query, SearchHit};

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub index: IndexOptions,
    /// 查询文件，单个 JSON 对象，或每行一个查询的 JSON Lines
    /// 多个查询的结果会按 id 合并
    #[arg(verbatim_doc_comment)]
    pub query: PathBuf,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let index = open_index(opts, &self.index)?;
        let queries = read_queries(&self.query)?;
        debug!("共 {} 个查询", queries.len());

        let result = block_in_place(|| match queries.as_slice() {
            [query] => index.search(query),
            queries => index.search_many(queries),
        })?;

        print_result(&result, self)
    }
}

/// 读取查询文件，先尝试整体解析为 JSON，失败时按 JSON Lines 解析
fn read_queries(path: &Path) -> Result<Vec<Query>> {
    let content = fs::read_to_string(path)?;
    let values = match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(values)) => values,
        Ok(value) => vec![value],
        Err(_) => content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<Value>)
            .collect::<serde_json::Result<Vec<_>>>()?,
    };
    if values.is_empty() {
        bail!("查询文件为空: {}", path.display());
    }
    Ok(values.into_iter().map(Query::from_json).collect::<crate::Result<Vec<_>>>()?)
}

fn print_result(result: &[SearchHit], opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?)
        }
        OutputFormat::Table => {
            for hit in result {
                println!("{:.4}\t{}", hit.dist, hit.id);
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}
