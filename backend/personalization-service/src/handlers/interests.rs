use actix_web::{web, HttpRequest, HttpResponse};
use interest_profile::TopicRef;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{PersonalizationState, RequestProfile};
use crate::error::{AppError, Result};
use crate::metrics::observe_request;

/// Upper bound on topics per recorded view
const MAX_TOPICS_PER_VISIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct RecordVisitsRequest {
    pub topics: Vec<TopicRef>,
}

#[derive(Debug, Serialize)]
pub struct InterestTopic {
    pub codename: String,
    pub name: String,
    pub visit_count: u32,
    pub interest_level: f64,
}

#[derive(Debug, Serialize)]
pub struct InterestTopicsResponse {
    pub topics: Vec<InterestTopic>,
    pub topic_names: Vec<String>,
}

/// POST /api/v1/interests/visits
pub async fn record_visits(
    req: HttpRequest,
    body: web::Json<RecordVisitsRequest>,
    state: web::Data<PersonalizationState>,
) -> Result<HttpResponse> {
    observe_request("record_visits");

    if body.topics.len() > MAX_TOPICS_PER_VISIT {
        return Err(AppError::ValidationError(format!(
            "At most {} topics may be recorded per visit",
            MAX_TOPICS_PER_VISIT
        )));
    }

    let profile = RequestProfile::open(&req, &state);
    profile.store.record_visits(&body.topics);
    let summary = profile.store.summary();

    debug!(
        topics = body.topics.len(),
        total_topics = summary.total_topics,
        total_visits = summary.total_visits,
        "Recorded content visit"
    );

    let mut response = HttpResponse::Ok();
    profile.finish(&mut response);
    Ok(response.json(summary))
}

/// GET /api/v1/interests
pub async fn get_profile(
    req: HttpRequest,
    state: web::Data<PersonalizationState>,
) -> Result<HttpResponse> {
    observe_request("get_profile");

    let profile = RequestProfile::open(&req, &state);
    let interests = profile.store.profile();

    let mut response = HttpResponse::Ok();
    profile.finish(&mut response);
    Ok(response.json(interests))
}

/// GET /api/v1/interests/summary
pub async fn get_summary(
    req: HttpRequest,
    state: web::Data<PersonalizationState>,
) -> Result<HttpResponse> {
    observe_request("get_summary");

    let profile = RequestProfile::open(&req, &state);
    let summary = profile.store.summary();

    let mut response = HttpResponse::Ok();
    profile.finish(&mut response);
    Ok(response.json(summary))
}

/// GET /api/v1/interests/topics
///
/// Topics by visit count with their relative interest level, plus the display
/// names used to seed recommendation prompts.
pub async fn get_interest_topics(
    req: HttpRequest,
    state: web::Data<PersonalizationState>,
) -> Result<HttpResponse> {
    observe_request("get_interest_topics");

    let profile = RequestProfile::open(&req, &state);
    let interests = profile.store.profile();

    let topics = interests
        .top_interests(None)
        .into_iter()
        .map(|interest| InterestTopic {
            interest_level: interests.interest_level(&interest.topic_codename),
            name: interest.display_name().to_string(),
            codename: interest.topic_codename,
            visit_count: interest.visit_count,
        })
        .collect();

    let mut response = HttpResponse::Ok();
    profile.finish(&mut response);
    Ok(response.json(InterestTopicsResponse {
        topics,
        topic_names: interests.topic_names(),
    }))
}

/// DELETE /api/v1/interests
pub async fn clear_interests(
    req: HttpRequest,
    state: web::Data<PersonalizationState>,
) -> Result<HttpResponse> {
    observe_request("clear_interests");

    let profile = RequestProfile::open(&req, &state);
    profile.store.clear();
    info!("Interest profile reset requested");

    let mut response = HttpResponse::NoContent();
    profile.finish(&mut response);
    Ok(response.finish())
}
