pub mod cli;
pub mod config;
pub mod distance;
pub mod error;
pub mod index;
pub mod loader;
mod metrics;
pub mod record;
mod server;
pub mod utils;

pub use config::Opts;
pub use error::{IndexError, Result};
pub use index::{SignatureIndex, SignatureIndexBuilder};
pub use record::{Query, Record, SearchHit, Words};
