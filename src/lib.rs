pub mod aggregate;
pub mod config;
pub mod correlate;
pub mod errors;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod sentiment;
pub mod store;
pub mod terms;

#[cfg(test)]
pub mod tests;

pub use config::AppConfig;
pub use errors::*;
