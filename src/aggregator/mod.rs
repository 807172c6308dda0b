pub mod aggregator;
pub mod details;
pub mod regional;

pub use aggregator::*;
pub use details::*;
pub use regional::*;
