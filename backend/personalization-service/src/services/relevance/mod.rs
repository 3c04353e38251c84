// ============================================
// Relevance Scorer
// ============================================
//
// Scores content against one snapshot of a user's interest profile.
//
// score(topics) = mean over *matching* topics of visitCount / maxVisits
//   - maxVisits: highest visit count in the profile (1 when empty)
//   - topics missing from the profile are ignored, so one strong match on an
//     item with many unrelated topics scores as high as that match alone
//   - no matching topic => 0.0
//
// Every operation is total: empty profiles, empty lists and topic-less
// items produce 0 scores or empty results.

use crate::models::ScoredItem;
use interest_profile::{InterestProfileStore, UserInterestProfile};
use std::cmp::Ordering;
use tracing::debug;

pub struct RelevanceScorer {
    profile: UserInterestProfile,
    max_visits: u32,
}

impl RelevanceScorer {
    pub fn new(profile: UserInterestProfile) -> Self {
        let max_visits = profile.max_visits();
        Self {
            profile,
            max_visits,
        }
    }

    /// Snapshot the store's current profile for one scoring pass
    pub fn from_store(store: &InterestProfileStore) -> Self {
        Self::new(store.profile())
    }

    pub fn profile(&self) -> &UserInterestProfile {
        &self.profile
    }

    /// Relevance of an item with the given topic codenames, in `[0, 1]`
    pub fn score<S: AsRef<str>>(&self, topics: &[S]) -> f64 {
        let (total, matching) = topics
            .iter()
            .filter_map(|codename| self.profile.get(codename.as_ref()))
            .fold((0.0_f64, 0usize), |(total, matching), interest| {
                (
                    total + f64::from(interest.visit_count) / f64::from(self.max_visits),
                    matching + 1,
                )
            });

        if matching == 0 {
            return 0.0;
        }

        (total / matching as f64).clamp(0.0, 1.0)
    }

    /// Score every item, keeping input order
    pub fn score_all<'a, T, S, F>(&self, items: &'a [T], topics_of: F) -> Vec<ScoredItem<'a, T>>
    where
        F: Fn(&T) -> &[S],
        S: AsRef<str>,
    {
        items
            .iter()
            .map(|item| ScoredItem {
                item,
                score: self.score(topics_of(item)),
            })
            .collect()
    }

    /// Items scoring at least `minimum_score`, in input order
    pub fn filter_by_interest<'a, T, S, F>(
        &self,
        items: &'a [T],
        topics_of: F,
        minimum_score: f64,
    ) -> Vec<&'a T>
    where
        F: Fn(&T) -> &[S],
        S: AsRef<str>,
    {
        self.filter_scored(items, topics_of, minimum_score)
            .into_iter()
            .map(|scored| scored.item)
            .collect()
    }

    pub fn filter_scored<'a, T, S, F>(
        &self,
        items: &'a [T],
        topics_of: F,
        minimum_score: f64,
    ) -> Vec<ScoredItem<'a, T>>
    where
        F: Fn(&T) -> &[S],
        S: AsRef<str>,
    {
        let kept: Vec<_> = self
            .score_all(items, topics_of)
            .into_iter()
            .filter(|scored| scored.score >= minimum_score)
            .collect();

        debug!(
            total = items.len(),
            kept = kept.len(),
            minimum_score = minimum_score,
            "Filtered items by interest"
        );

        kept
    }

    /// Items by descending relevance. Equal scores currently keep input
    /// order, but callers must not depend on tie order.
    pub fn sort_by_relevance<'a, T, S, F>(&self, items: &'a [T], topics_of: F) -> Vec<&'a T>
    where
        F: Fn(&T) -> &[S],
        S: AsRef<str>,
    {
        self.sort_scored(items, topics_of)
            .into_iter()
            .map(|scored| scored.item)
            .collect()
    }

    pub fn sort_scored<'a, T, S, F>(&self, items: &'a [T], topics_of: F) -> Vec<ScoredItem<'a, T>>
    where
        F: Fn(&T) -> &[S],
        S: AsRef<str>,
    {
        let mut scored = self.score_all(items, topics_of);
        sort_descending(&mut scored);
        scored
    }
}

pub(crate) fn sort_descending<T>(scored: &mut [ScoredItem<'_, T>]) {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}
