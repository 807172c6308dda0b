pub mod aggregator;
pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod ingest;
pub mod models;
pub mod ordering;
pub mod pipeline;
pub mod reconstruct;
pub mod storage;
pub mod summary;

#[cfg(test)]
mod tests;

pub use aggregator::*;
pub use api::*;
pub use config::*;
pub use constants::*;
pub use error::*;
pub use ingest::*;
pub use models::*;
pub use ordering::*;
pub use pipeline::*;
pub use reconstruct::*;
pub use storage::*;
pub use summary::*;

use tracing::Level;

pub fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}
