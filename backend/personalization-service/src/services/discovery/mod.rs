// ============================================
// Discovery Blending
// ============================================
//
// Personalized lists get a few random non-matching items appended so users
// still see content outside their known interests:
//
//   ranked    = sort_by_relevance(filter_by_interest(items, minimum_score))
//   remaining = items not in ranked (by position in the input)
//   append ceil(|ranked| * discovery_ratio) uniform picks from remaining
//   truncate to max_results
//
// Discovery items are only ever appended, so they never reorder ranked items.
// Sampling works on an index set and leaves the caller's slice untouched.

use crate::models::{Recommendation, RecommendOptions, ScoredItem};
use crate::services::relevance::{sort_descending, RelevanceScorer};
use rand::seq::index;
use rand::Rng;
use tracing::debug;

/// Number of discovery items for a ranked list of `ranked_len` entries
pub fn discovery_count(ranked_len: usize, ratio: f64) -> usize {
    if ranked_len == 0 || !ratio.is_finite() || ratio <= 0.0 {
        return 0;
    }
    (ranked_len as f64 * ratio).ceil() as usize
}

impl RelevanceScorer {
    /// Personalized list with relevance scores and discovery flags
    pub fn recommend_detailed<'a, T, S, F, R>(
        &self,
        items: &'a [T],
        topics_of: F,
        options: &RecommendOptions,
        rng: &mut R,
    ) -> Vec<Recommendation<'a, T>>
    where
        F: Fn(&T) -> &[S],
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let scored = self.score_all(items, topics_of);

        let ranked_positions: Vec<usize> = (0..scored.len())
            .filter(|&i| scored[i].score >= options.minimum_score)
            .collect();
        let mut ranked: Vec<ScoredItem<'a, T>> =
            ranked_positions.iter().map(|&i| scored[i]).collect();
        sort_descending(&mut ranked);

        let mut results: Vec<Recommendation<'a, T>> = ranked
            .iter()
            .map(|scored| Recommendation {
                item: scored.item,
                score: scored.score,
                discovery: false,
            })
            .collect();

        if options.include_discovery && !ranked.is_empty() {
            let remaining: Vec<usize> = (0..scored.len())
                .filter(|i| ranked_positions.binary_search(i).is_err())
                .collect();

            let wanted = discovery_count(ranked.len(), options.discovery_ratio);
            let amount = wanted.min(remaining.len());

            for pick in index::sample(rng, remaining.len(), amount).into_iter() {
                let scored_item = scored[remaining[pick]];
                results.push(Recommendation {
                    item: scored_item.item,
                    score: scored_item.score,
                    discovery: true,
                });
            }

            debug!(
                ranked = ranked.len(),
                discovery = amount,
                candidates = remaining.len(),
                "Blended discovery items into recommendations"
            );
        }

        if let Some(max_results) = options.max_results {
            results.truncate(max_results);
        }

        results
    }

    /// Filter, rank and blend `items` for display
    pub fn recommend<'a, T, S, F, R>(
        &self,
        items: &'a [T],
        topics_of: F,
        options: &RecommendOptions,
        rng: &mut R,
    ) -> Vec<&'a T>
    where
        F: Fn(&T) -> &[S],
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        self.recommend_detailed(items, topics_of, options, rng)
            .into_iter()
            .map(|rec| rec.item)
            .collect()
    }
}
