mod search;
pub mod server;
mod stats;

pub use search::*;
pub use server::*;
pub use stats::*;

use log::info;
use tokio::task::block_in_place;

use crate::config::{IndexOptions, Opts};
use crate::index::SignatureIndex;
use crate::loader::{load_records, suffix_regex};

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}

/// 创建索引，并加载 `--records` 指定的记录
pub fn open_index(opts: &Opts, index_opts: &IndexOptions) -> anyhow::Result<SignatureIndex> {
    let index = index_opts.build()?;
    match &opts.records {
        Some(path) => {
            let re_suf = suffix_regex(&opts.suffix)?;
            block_in_place(|| load_records(&index, path, &re_suf))?;
        }
        None => info!("未指定记录文件，使用空索引"),
    }
    Ok(index)
}
