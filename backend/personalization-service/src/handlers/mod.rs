pub mod interests;
pub mod personalization;

use actix_web::cookie::time::OffsetDateTime;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponseBuilder};
use interest_profile::{CookieStorage, CookieUpdate, InterestProfileStore};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::metrics::serve_metrics;

pub use interests::{
    clear_interests, get_interest_topics, get_profile, get_summary, record_visits,
    RecordVisitsRequest,
};
pub use personalization::{
    filter_items, recommend_items, score_topics, sort_items, ItemsRequest, RecommendRequest,
    ScoreRequest,
};

pub struct PersonalizationState {
    pub config: Config,
}

impl PersonalizationState {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

/// Profile store scoped to one request, backed by the request's cookies.
///
/// Call `finish` with the response builder to emit any `Set-Cookie` headers.
pub struct RequestProfile {
    pub store: InterestProfileStore,
    cookies: Arc<CookieStorage>,
    secure: bool,
}

impl RequestProfile {
    pub fn open(req: &HttpRequest, state: &PersonalizationState) -> Self {
        // Values stay percent-encoded; the profile codec decodes them
        let parsed = req
            .headers()
            .get_all(header::COOKIE)
            .filter_map(|value| value.to_str().ok())
            .flat_map(cookie::Cookie::split_parse)
            .filter_map(|cookie| match cookie {
                Ok(cookie) => Some((cookie.name().to_string(), cookie.value().to_string())),
                Err(e) => {
                    debug!(error = %e, "Skipping unparsable request cookie");
                    None
                }
            });

        let cookies = Arc::new(CookieStorage::from_pairs(parsed));
        let store = InterestProfileStore::new(cookies.clone())
            .with_config(state.config.store_config());

        Self {
            store,
            cookies,
            secure: state.config.cookie_secure,
        }
    }

    pub fn finish(self, builder: &mut HttpResponseBuilder) {
        for update in self.cookies.take_updates() {
            match update {
                CookieUpdate::Set {
                    name,
                    value,
                    expires_at,
                } => {
                    let mut cookie = Cookie::build(name, value)
                        .path("/")
                        .same_site(SameSite::Lax)
                        .secure(self.secure)
                        .finish();
                    match OffsetDateTime::from_unix_timestamp(expires_at.timestamp()) {
                        Ok(expires) => cookie.set_expires(expires),
                        Err(e) => warn!(error = %e, "Interest cookie expiry out of range"),
                    }
                    builder.cookie(cookie);
                }
                CookieUpdate::Remove { name } => {
                    let mut cookie = Cookie::build(name, "").path("/").finish();
                    cookie.make_removal();
                    builder.cookie(cookie);
                }
            }
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(serve_metrics))
        .service(
            web::scope("/api/v1/interests")
                .route("", web::get().to(get_profile))
                .route("", web::delete().to(clear_interests))
                .route("/visits", web::post().to(record_visits))
                .route("/summary", web::get().to(get_summary))
                .route("/topics", web::get().to(get_interest_topics)),
        )
        .service(
            web::scope("/api/v1/personalization")
                .route("/score", web::post().to(score_topics))
                .route("/filter", web::post().to(filter_items))
                .route("/sort", web::post().to(sort_items))
                .route("/recommend", web::post().to(recommend_items)),
        );
}

async fn health_check() -> actix_web::HttpResponse {
    actix_web::HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "personalization-service"
    }))
}
