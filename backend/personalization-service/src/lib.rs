pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use handlers::{configure, PersonalizationState};
pub use services::RelevanceScorer;
