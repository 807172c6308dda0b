pub mod settings;
pub mod policy;

pub use settings::*;
pub use policy::*;
