use clap::Parser;
use env_logger::Env;
use imsig::Opts;
use imsig::cli::SubCommandExtend;
use imsig::config::SubCommand;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let opts = Opts::parse();

    match &opts.subcmd {
        SubCommand::Search(config) => config.run(&opts).await,
        SubCommand::Stats(config) => config.run(&opts).await,
        SubCommand::Server(config) => config.run(&opts).await,
    }
}
