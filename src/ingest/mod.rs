pub mod export;
pub mod rows;

pub use export::*;
pub use rows::*;
