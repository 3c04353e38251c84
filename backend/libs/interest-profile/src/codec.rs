//! Wire format for a persisted profile
//!
//! Value = percent-encoded JSON object keyed by topic codename, so it can sit
//! in a cookie unchanged.

use crate::error::{ProfileError, ProfileResult};
use crate::profile::{TopicInterest, UserInterestProfile};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

pub fn encode_profile(profile: &UserInterestProfile) -> ProfileResult<String> {
    let json = serde_json::to_string(profile)?;
    Ok(urlencoding::encode(&json).into_owned())
}

/// Decode a stored value, repairing entries that break profile invariants.
pub fn decode_profile(raw: &str) -> ProfileResult<UserInterestProfile> {
    if raw.trim().is_empty() {
        return Ok(UserInterestProfile::new());
    }

    let json = urlencoding::decode(raw).map_err(|e| ProfileError::Encoding(e.to_string()))?;
    let entries: BTreeMap<String, Value> = serde_json::from_str(&json)?;

    Ok(entries
        .into_iter()
        .filter_map(|(codename, entry)| match serde_json::from_value(entry) {
            Ok(interest) => sanitize(codename, interest),
            Err(e) => {
                warn!(
                    codename = %codename,
                    error = %e,
                    "Dropping unreadable stored topic interest"
                );
                None
            }
        })
        .collect())
}

fn sanitize(codename: String, mut interest: TopicInterest) -> Option<TopicInterest> {
    if codename.trim().is_empty() || interest.visit_count == 0 {
        warn!(codename = %codename, "Dropping invalid stored topic interest");
        return None;
    }

    if interest.topic_codename != codename {
        interest.topic_codename = codename;
    }
    if interest.last_visited < interest.first_visited {
        interest.last_visited = interest.first_visited;
    }

    Some(interest)
}
