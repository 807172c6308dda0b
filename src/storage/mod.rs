pub mod columns;
pub mod reader;
pub mod writer;

pub use columns::*;
pub use reader::*;
pub use writer::*;
