use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::*;
use crate::error::Result;
use crate::index::{DEFAULT_DISTANCE_CUTOFF, SignatureIndex};

#[derive(Parser, Debug, Clone)]
pub struct IndexOptions {
    /// 两个相似签名允许的最大归一化距离（不含），范围从 0 到 1
    #[arg(short, long, value_name = "DIST", default_value_t = DEFAULT_DISTANCE_CUTOFF)]
    pub distance_cutoff: f32,
    /// 单次搜索返回的最大结果数量，默认不限制
    #[arg(long, value_name = "COUNT")]
    pub size: Option<usize>,
    /// 签名维度，不填则由第一条记录决定
    #[arg(long, value_name = "N")]
    pub dimension: Option<usize>,
}

impl IndexOptions {
    /// 按照当前参数创建一个空索引
    pub fn build(&self) -> Result<SignatureIndex> {
        SignatureIndex::builder()
            .distance_cutoff(self.distance_cutoff)
            .size(self.size)
            .dimension(self.dimension)
            .build()
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "imsig", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// 预先加载的签名记录，可以是 JSON Lines 文件或包含它们的目录
    #[arg(short, long, value_name = "PATH", global = true)]
    pub records: Option<PathBuf>,
    /// 扫描目录时匹配的文件后缀名，多个后缀用逗号分隔
    #[arg(long, default_value = "jsonl,json", global = true)]
    pub suffix: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 在已加载的记录中搜索签名
    Search(SearchCommand),
    /// 显示加载后的索引统计信息
    Stats(StatsCommand),
    /// 启动 HTTP 搜索服务
    Server(ServerCommand),
}
