// Submodules; only the handler functions are re-exported
mod common;  // Query parsing and storage error mapping
mod health;  // Health check endpoint
mod sources;

// Chart data endpoints
mod boxplot;
mod details;
mod locations;
mod regions;

pub use health::health_check;
pub use sources::get_sources;

pub use boxplot::get_boxplot;
pub use details::get_group_details;
pub use locations::get_locations;
pub use regions::get_regions;
