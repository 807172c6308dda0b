pub mod reconstructor;

pub use reconstructor::*;
