use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{PersonalizationState, RequestProfile};
use crate::error::{AppError, Result};
use crate::metrics::{observe_items_scored, observe_request};
use crate::models::{ContentItem, RecommendOptions, ScoredItem};
use crate::services::RelevanceScorer;

/// Upper bound on items per scoring request
const MAX_ITEMS_PER_REQUEST: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub score: f64,
    /// Whether any of the topics is in the profile
    pub matched: bool,
}

#[derive(Debug, Deserialize)]
pub struct ItemsRequest {
    pub items: Vec<ContentItem>,
    pub minimum_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub items: Vec<ContentItem>,
    pub minimum_score: Option<f64>,
    pub max_results: Option<usize>,
    pub include_discovery: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ScoredContent<'a> {
    pub item: &'a ContentItem,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct ScoredItemsResponse<'a> {
    pub items: Vec<ScoredContent<'a>>,
    pub has_interests: bool,
}

#[derive(Debug, Serialize)]
pub struct RecommendedContent<'a> {
    pub item: &'a ContentItem,
    pub score: f64,
    pub discovery: bool,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse<'a> {
    pub items: Vec<RecommendedContent<'a>>,
    pub has_interests: bool,
}

fn scored_response(
    scored: Vec<ScoredItem<'_, ContentItem>>,
    has_interests: bool,
) -> ScoredItemsResponse<'_> {
    ScoredItemsResponse {
        items: scored
            .into_iter()
            .map(|s| ScoredContent {
                item: s.item,
                score: s.score,
            })
            .collect(),
        has_interests,
    }
}

fn validate_items(items: &[ContentItem]) -> Result<()> {
    if items.len() > MAX_ITEMS_PER_REQUEST {
        return Err(AppError::ValidationError(format!(
            "At most {} items may be scored per request",
            MAX_ITEMS_PER_REQUEST
        )));
    }
    Ok(())
}

fn resolve_minimum_score(requested: Option<f64>, default: f64) -> Result<f64> {
    match requested {
        Some(score) if !score.is_finite() => Err(AppError::ValidationError(
            "minimum_score must be a finite number".to_string(),
        )),
        Some(score) => Ok(score),
        None => Ok(default),
    }
}

/// POST /api/v1/personalization/score
pub async fn score_topics(
    req: HttpRequest,
    body: web::Json<ScoreRequest>,
    state: web::Data<PersonalizationState>,
) -> Result<HttpResponse> {
    observe_request("score");

    let profile = RequestProfile::open(&req, &state);
    let scorer = RelevanceScorer::from_store(&profile.store);

    let response = ScoreResponse {
        score: scorer.score(&body.topics),
        matched: scorer.profile().has_interest_in(&body.topics),
    };

    let mut builder = HttpResponse::Ok();
    profile.finish(&mut builder);
    Ok(builder.json(response))
}

/// POST /api/v1/personalization/filter
pub async fn filter_items(
    req: HttpRequest,
    body: web::Json<ItemsRequest>,
    state: web::Data<PersonalizationState>,
) -> Result<HttpResponse> {
    observe_request("filter");
    validate_items(&body.items)?;
    let minimum_score =
        resolve_minimum_score(body.minimum_score, state.config.default_minimum_score)?;

    let profile = RequestProfile::open(&req, &state);
    let scorer = RelevanceScorer::from_store(&profile.store);
    let scored = scorer.filter_scored(&body.items, ContentItem::topics, minimum_score);
    observe_items_scored("filter", body.items.len());

    let mut builder = HttpResponse::Ok();
    let response = scored_response(scored, !scorer.profile().is_empty());
    profile.finish(&mut builder);
    Ok(builder.json(response))
}

/// POST /api/v1/personalization/sort
pub async fn sort_items(
    req: HttpRequest,
    body: web::Json<ItemsRequest>,
    state: web::Data<PersonalizationState>,
) -> Result<HttpResponse> {
    observe_request("sort");
    validate_items(&body.items)?;

    let profile = RequestProfile::open(&req, &state);
    let scorer = RelevanceScorer::from_store(&profile.store);
    let scored = scorer.sort_scored(&body.items, ContentItem::topics);
    observe_items_scored("sort", body.items.len());

    let mut builder = HttpResponse::Ok();
    let response = scored_response(scored, !scorer.profile().is_empty());
    profile.finish(&mut builder);
    Ok(builder.json(response))
}

/// POST /api/v1/personalization/recommend
pub async fn recommend_items(
    req: HttpRequest,
    body: web::Json<RecommendRequest>,
    state: web::Data<PersonalizationState>,
) -> Result<HttpResponse> {
    observe_request("recommend");
    validate_items(&body.items)?;

    let options = RecommendOptions {
        minimum_score: resolve_minimum_score(
            body.minimum_score,
            state.config.default_minimum_score,
        )?,
        max_results: body.max_results,
        include_discovery: body.include_discovery.unwrap_or(true),
        discovery_ratio: state.config.discovery_ratio,
    };

    let profile = RequestProfile::open(&req, &state);
    let scorer = RelevanceScorer::from_store(&profile.store);
    let recommendations = {
        let mut rng = rand::thread_rng();
        scorer.recommend_detailed(&body.items, ContentItem::topics, &options, &mut rng)
    };
    observe_items_scored("recommend", body.items.len());

    debug!(
        candidates = body.items.len(),
        returned = recommendations.len(),
        discovery = recommendations.iter().filter(|r| r.discovery).count(),
        "Built personalized recommendations"
    );

    let response = RecommendResponse {
        items: recommendations
            .into_iter()
            .map(|r| RecommendedContent {
                item: r.item,
                score: r.score,
                discovery: r.discovery,
            })
            .collect(),
        has_interests: !scorer.profile().is_empty(),
    };

    let mut builder = HttpResponse::Ok();
    profile.finish(&mut builder);
    Ok(builder.json(response))
}
