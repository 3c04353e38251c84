use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Share of the ranked list appended as discovery items
pub const DEFAULT_DISCOVERY_RATIO: f64 = 0.2;

/// Minimum relevance for an item to count as "for you"
pub const DEFAULT_MINIMUM_SCORE: f64 = 0.5;

/// Item paired with its relevance for one scoring pass
#[derive(Debug, PartialEq)]
pub struct ScoredItem<'a, T> {
    pub item: &'a T,
    pub score: f64,
}

impl<T> Clone for ScoredItem<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ScoredItem<'_, T> {}

/// Entry of a recommendation list
#[derive(Debug, PartialEq)]
pub struct Recommendation<'a, T> {
    pub item: &'a T,
    pub score: f64,
    /// Picked at random from non-matching items rather than by relevance
    pub discovery: bool,
}

impl<T> Clone for Recommendation<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Recommendation<'_, T> {}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendOptions {
    pub minimum_score: f64,
    pub max_results: Option<usize>,
    pub include_discovery: bool,
    pub discovery_ratio: f64,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            minimum_score: DEFAULT_MINIMUM_SCORE,
            max_results: None,
            include_discovery: true,
            discovery_ratio: DEFAULT_DISCOVERY_RATIO,
        }
    }
}

/// Content item as sent by the rendering layer.
///
/// Only `topics` matters for scoring; every other field is passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentItem {
    pub fn topics(&self) -> &[String] {
        &self.topics
    }
}
