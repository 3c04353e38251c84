pub mod discovery;
pub mod relevance;

pub use discovery::discovery_count;
pub use relevance::RelevanceScorer;
