use anyhow::Result;
use clap::Parser;

use crate::cli::{SubCommandExtend, open_index};
use crate::config::{IndexOptions, Opts};

#[derive(Parser, Debug, Clone)]
pub struct StatsCommand {
    #[command(flatten)]
    pub index: IndexOptions,
}

impl SubCommandExtend for StatsCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let index = open_index(opts, &self.index)?;
        let dimension = index.dimension().map_or_else(|| "-".to_string(), |d| d.to_string());
        println!("buckets  : {}", index.bucket_count());
        println!("entries  : {}", index.entry_count());
        println!("dimension: {}", dimension);
        Ok(())
    }
}
