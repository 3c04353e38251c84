//! Topic interest profile model
//!
//! A profile maps topic codename -> visit statistics. Every entry has
//! `visit_count >= 1` and `last_visited >= first_visited`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Visit statistics for one topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicInterest {
    pub topic_name: String,
    pub topic_codename: String,
    pub visit_count: u32,
    pub last_visited: DateTime<Utc>,
    pub first_visited: DateTime<Utc>,
}

impl TopicInterest {
    pub fn first_visit(topic_name: &str, topic_codename: &str, now: DateTime<Utc>) -> Self {
        Self {
            topic_name: topic_name.to_string(),
            topic_codename: topic_codename.to_string(),
            visit_count: 1,
            last_visited: now,
            first_visited: now,
        }
    }

    /// Count another visit. Name and first visit stay as they were.
    pub fn revisit(&mut self, now: DateTime<Utc>) {
        self.visit_count = self.visit_count.saturating_add(1);
        self.last_visited = now.max(self.first_visited);
    }

    /// Display label, falling back to the codename when the name is blank
    pub fn display_name(&self) -> &str {
        if self.topic_name.trim().is_empty() {
            &self.topic_codename
        } else {
            &self.topic_name
        }
    }
}

/// (name, codename) pair describing a topic attached to a piece of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRef {
    pub name: String,
    pub codename: String,
}

impl TopicRef {
    pub fn new(name: impl Into<String>, codename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            codename: codename.into(),
        }
    }
}

/// Read-only digest of a profile for debug panels and "based on your interests" copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterestSummary {
    pub total_topics: usize,
    pub total_visits: u64,
    pub top_interests: Vec<TopicInterest>,
    pub recent_interests: Vec<TopicInterest>,
    pub has_interests: bool,
}

/// All topic interests of one user, keyed by codename
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserInterestProfile {
    topics: BTreeMap<String, TopicInterest>,
}

impl UserInterestProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn get(&self, codename: &str) -> Option<&TopicInterest> {
        self.topics.get(codename)
    }

    pub fn contains(&self, codename: &str) -> bool {
        self.topics.contains_key(codename)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopicInterest> {
        self.topics.values()
    }

    /// Insert or increment the entry for `codename`.
    ///
    /// Returns the updated entry.
    pub fn record_visit(
        &mut self,
        topic_name: &str,
        topic_codename: &str,
        now: DateTime<Utc>,
    ) -> &TopicInterest {
        self.topics
            .entry(topic_codename.to_string())
            .and_modify(|interest| interest.revisit(now))
            .or_insert_with(|| TopicInterest::first_visit(topic_name, topic_codename, now))
    }

    pub(crate) fn insert(&mut self, interest: TopicInterest) {
        self.topics
            .insert(interest.topic_codename.clone(), interest);
    }

    pub(crate) fn remove(&mut self, codename: &str) -> Option<TopicInterest> {
        self.topics.remove(codename)
    }

    /// Highest visit count in the profile, or 1 when empty
    pub fn max_visits(&self) -> u32 {
        self.topics
            .values()
            .map(|i| i.visit_count)
            .max()
            .unwrap_or(1)
            .max(1)
    }

    pub fn total_visits(&self) -> u64 {
        self.topics.values().map(|i| u64::from(i.visit_count)).sum()
    }

    /// Entries by visit count, most visited first
    pub fn top_interests(&self, limit: Option<usize>) -> Vec<TopicInterest> {
        let mut sorted: Vec<TopicInterest> = self.topics.values().cloned().collect();
        // BTreeMap iteration is codename-ordered and sort_by is stable,
        // so ties come out alphabetically.
        sorted.sort_by(|a, b| b.visit_count.cmp(&a.visit_count));
        truncate(sorted, limit)
    }

    /// Entries by last visit, most recent first
    pub fn recent_interests(&self, limit: Option<usize>) -> Vec<TopicInterest> {
        let mut sorted: Vec<TopicInterest> = self.topics.values().cloned().collect();
        sorted.sort_by(|a, b| b.last_visited.cmp(&a.last_visited));
        truncate(sorted, limit)
    }

    /// Interest in a single topic on a 0..=1 scale relative to the most visited topic
    pub fn interest_level(&self, codename: &str) -> f64 {
        match self.topics.get(codename) {
            Some(interest) => f64::from(interest.visit_count) / f64::from(self.max_visits()),
            None => 0.0,
        }
    }

    pub fn has_interest_in<S: AsRef<str>>(&self, codenames: &[S]) -> bool {
        codenames
            .iter()
            .any(|codename| self.topics.contains_key(codename.as_ref()))
    }

    /// Display names of every tracked topic
    pub fn topic_names(&self) -> Vec<String> {
        self.topics
            .values()
            .map(|i| i.display_name().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn summary(&self, top_n: usize, recent_m: usize) -> InterestSummary {
        InterestSummary {
            total_topics: self.topics.len(),
            total_visits: self.total_visits(),
            top_interests: self.top_interests(Some(top_n)),
            recent_interests: self.recent_interests(Some(recent_m)),
            has_interests: !self.topics.is_empty(),
        }
    }
}

fn truncate(mut interests: Vec<TopicInterest>, limit: Option<usize>) -> Vec<TopicInterest> {
    if let Some(limit) = limit {
        interests.truncate(limit);
    }
    interests
}

impl FromIterator<TopicInterest> for UserInterestProfile {
    fn from_iter<I: IntoIterator<Item = TopicInterest>>(iter: I) -> Self {
        let mut profile = Self::new();
        for interest in iter {
            profile.insert(interest);
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn profile_with(counts: &[(&str, u32, i64)]) -> UserInterestProfile {
        counts
            .iter()
            .map(|(codename, count, minutes)| TopicInterest {
                topic_name: codename.to_uppercase(),
                topic_codename: codename.to_string(),
                visit_count: *count,
                last_visited: at(*minutes),
                first_visited: at(0),
            })
            .collect()
    }

    #[test]
    fn test_record_visit_inserts_then_increments() {
        let mut profile = UserInterestProfile::new();
        profile.record_visit("Jazz", "jazz", at(0));
        profile.record_visit("Jazz (renamed)", "jazz", at(5));

        let jazz = profile.get("jazz").unwrap();
        assert_eq!(jazz.visit_count, 2);
        assert_eq!(jazz.topic_name, "Jazz");
        assert_eq!(jazz.first_visited, at(0));
        assert_eq!(jazz.last_visited, at(5));
    }

    #[test]
    fn test_revisit_never_moves_last_visit_before_first() {
        let mut profile = UserInterestProfile::new();
        profile.record_visit("Jazz", "jazz", at(10));
        profile.record_visit("Jazz", "jazz", at(0));

        let jazz = profile.get("jazz").unwrap();
        assert!(jazz.last_visited >= jazz.first_visited);
    }

    #[test]
    fn test_max_visits_defaults_to_one() {
        assert_eq!(UserInterestProfile::new().max_visits(), 1);
        assert_eq!(profile_with(&[("jazz", 4, 0), ("rock", 2, 0)]).max_visits(), 4);
    }

    #[test]
    fn test_top_interests_orders_by_count_then_codename() {
        let profile = profile_with(&[("rock", 2, 0), ("jazz", 4, 0), ("blues", 2, 0)]);
        let top: Vec<_> = profile
            .top_interests(None)
            .into_iter()
            .map(|i| i.topic_codename)
            .collect();
        assert_eq!(top, vec!["jazz", "blues", "rock"]);
        assert_eq!(profile.top_interests(Some(1)).len(), 1);
    }

    #[test]
    fn test_recent_interests_orders_by_last_visit() {
        let profile = profile_with(&[("rock", 9, 30), ("jazz", 1, 60), ("blues", 3, 10)]);
        let recent: Vec<_> = profile
            .recent_interests(Some(2))
            .into_iter()
            .map(|i| i.topic_codename)
            .collect();
        assert_eq!(recent, vec!["jazz", "rock"]);
    }

    #[test]
    fn test_interest_level_and_membership() {
        let profile = profile_with(&[("jazz", 4, 0), ("rock", 2, 0)]);
        assert!((profile.interest_level("rock") - 0.5).abs() < f64::EPSILON);
        assert_eq!(profile.interest_level("pop"), 0.0);
        assert!(profile.has_interest_in(&["pop", "rock"]));
        assert!(!profile.has_interest_in(&["pop"]));
        assert!(!profile.has_interest_in::<&str>(&[]));
    }

    #[test]
    fn test_summary() {
        let profile = profile_with(&[("jazz", 4, 0), ("rock", 2, 0)]);
        let summary = profile.summary(5, 3);
        assert_eq!(summary.total_topics, 2);
        assert_eq!(summary.total_visits, 6);
        assert!(summary.has_interests);

        let empty = UserInterestProfile::new().summary(5, 3);
        assert!(!empty.has_interests);
        assert_eq!(empty.total_visits, 0);
        assert!(empty.top_interests.is_empty());
    }

    #[test]
    fn test_topic_names_fall_back_to_codename() {
        let mut profile = UserInterestProfile::new();
        profile.record_visit("", "lofi", at(0));
        profile.record_visit("Jazz", "jazz", at(0));
        assert_eq!(profile.topic_names(), vec!["Jazz", "lofi"]);
    }
}
