use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use personalization_service::error::json_error_handler;
use personalization_service::{configure, Config, PersonalizationState};
use serde_json::{json, Value};

const COOKIE: &str = "user_topic_interests";

macro_rules! init_app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(PersonalizationState::new(Config::default())))
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .configure(configure),
        )
        .await
    };
}

/// Raw value of the interest cookie set on a response, if any
fn interest_cookie<B>(resp: &ServiceResponse<B>) -> Option<String> {
    let prefix = format!("{}=", COOKIE);
    resp.headers()
        .get_all(header::SET_COOKIE)
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| value.strip_prefix(prefix.as_str()))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
}

fn visit(topics: &[(&str, &str)]) -> Value {
    json!({
        "topics": topics
            .iter()
            .map(|(name, codename)| json!({ "name": name, "codename": codename }))
            .collect::<Vec<_>>()
    })
}

#[actix_web::test]
async fn test_health() {
    let app = init_app!();
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn test_empty_profile_without_cookie() {
    let app = init_app!();

    let req = test::TestRequest::get()
        .uri("/api/v1/interests/summary")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(interest_cookie(&resp).is_none());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["has_interests"], json!(false));
    assert_eq!(body["total_topics"], json!(0));
}

#[actix_web::test]
async fn test_visits_accumulate_through_cookie() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/interests/visits")
        .set_json(visit(&[("Jazz", "jazz"), ("Rock", "rock"), ("Jazz", "jazz")]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = interest_cookie(&resp).expect("interest cookie set");

    let req = test::TestRequest::post()
        .uri("/api/v1/interests/visits")
        .insert_header((header::COOKIE, format!("{}={}", COOKIE, cookie)))
        .set_json(visit(&[("Jazz", "jazz"), ("Jazz", "jazz")]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = interest_cookie(&resp).expect("interest cookie set");

    let req = test::TestRequest::get()
        .uri("/api/v1/interests")
        .insert_header((header::COOKIE, format!("{}={}", COOKIE, cookie)))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["jazz"]["visitCount"], json!(4));
    assert_eq!(profile["rock"]["visitCount"], json!(1));
    assert_eq!(profile["jazz"]["topicName"], json!("Jazz"));

    let req = test::TestRequest::get()
        .uri("/api/v1/interests/topics")
        .insert_header((header::COOKIE, format!("{}={}", COOKIE, cookie)))
        .to_request();
    let topics: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(topics["topics"][0]["codename"], json!("jazz"));
    assert_eq!(topics["topics"][0]["interest_level"], json!(1.0));
    assert_eq!(topics["topics"][1]["interest_level"], json!(0.25));
}

#[actix_web::test]
async fn test_blank_codename_is_ignored() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/interests/visits")
        .set_json(visit(&[("Nothing", "")]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(interest_cookie(&resp).is_none());
}

#[actix_web::test]
async fn test_corrupt_cookie_degrades_to_empty_profile() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/personalization/score")
        .insert_header((header::COOKIE, format!("{}=%7Bnot-json", COOKIE)))
        .set_json(json!({ "topics": ["jazz"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["score"], json!(0.0));
    assert_eq!(body["matched"], json!(false));
}

#[actix_web::test]
async fn test_clear_emits_removal_cookie() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/interests/visits")
        .set_json(visit(&[("Jazz", "jazz")]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = interest_cookie(&resp).expect("interest cookie set");

    let req = test::TestRequest::delete()
        .uri("/api/v1/interests")
        .insert_header((header::COOKIE, format!("{}={}", COOKIE, cookie)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(interest_cookie(&resp), Some(String::new()));
}

/// Visits leaving the profile at {jazz: 4, rock: 2}
fn jazz_rock_visits() -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/v1/interests/visits")
        .set_json(visit(&[
            ("Jazz", "jazz"),
            ("Jazz", "jazz"),
            ("Jazz", "jazz"),
            ("Jazz", "jazz"),
            ("Rock", "rock"),
            ("Rock", "rock"),
        ]))
}

fn cookie_header<B>(resp: &ServiceResponse<B>) -> String {
    let value = interest_cookie(resp).expect("interest cookie set");
    format!("{}={}", COOKIE, value)
}

fn catalogue() -> Value {
    json!([
        { "id": "A", "topics": ["jazz"], "title": "Kind of Blue" },
        { "id": "B", "topics": ["rock"] },
        { "id": "C", "topics": ["jazz", "pop"] },
        { "id": "D", "topics": ["metal"] },
        { "id": "E" }
    ])
}

fn ids(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["item"]["id"].as_str().unwrap().to_string())
        .collect()
}

#[actix_web::test]
async fn test_filter_and_sort() {
    let app = init_app!();
    let resp = test::call_service(&app, jazz_rock_visits().to_request()).await;
    let cookie = cookie_header(&resp);

    let req = test::TestRequest::post()
        .uri("/api/v1/personalization/filter")
        .insert_header((header::COOKIE, cookie.clone()))
        .set_json(json!({ "items": catalogue(), "minimum_score": 0.6 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&body), vec!["A", "C"]);
    assert_eq!(body["items"][0]["item"]["title"], json!("Kind of Blue"));
    assert_eq!(body["has_interests"], json!(true));

    let req = test::TestRequest::post()
        .uri("/api/v1/personalization/sort")
        .insert_header((header::COOKIE, cookie))
        .set_json(json!({ "items": catalogue() }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let sorted = ids(&body);
    // A and C tie at 1.0; their order is not part of the contract
    let mut head = sorted[..2].to_vec();
    head.sort();
    assert_eq!(head, vec!["A", "C"]);
    assert_eq!(sorted[2], "B");
    assert_eq!(body["items"][2]["score"], json!(0.5));
}

#[actix_web::test]
async fn test_recommend_with_discovery() {
    let app = init_app!();
    let resp = test::call_service(&app, jazz_rock_visits().to_request()).await;
    let cookie = cookie_header(&resp);

    let req = test::TestRequest::post()
        .uri("/api/v1/personalization/recommend")
        .insert_header((header::COOKIE, cookie.clone()))
        .set_json(json!({ "items": catalogue() }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let items = body["items"].as_array().unwrap();

    // A, C, B ranked (minimum 0.5) + ceil(3 * 0.2) = 1 discovery pick from D/E
    assert_eq!(items.len(), 4);
    assert!(items[..3].iter().all(|i| i["discovery"] == json!(false)));
    assert_eq!(items[3]["discovery"], json!(true));
    let picked = items[3]["item"]["id"].as_str().unwrap();
    assert!(picked == "D" || picked == "E");

    let req = test::TestRequest::post()
        .uri("/api/v1/personalization/recommend")
        .insert_header((header::COOKIE, cookie))
        .set_json(json!({
            "items": catalogue(),
            "include_discovery": false,
            "max_results": 2
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let mut top = ids(&body);
    top.sort();
    assert_eq!(top, vec!["A", "C"]);
}

#[actix_web::test]
async fn test_recommend_without_interests_is_empty() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/personalization/recommend")
        .set_json(json!({ "items": catalogue() }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["items"].as_array().unwrap().is_empty());
    assert_eq!(body["has_interests"], json!(false));
}

#[actix_web::test]
async fn test_malformed_body_is_bad_request() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/personalization/filter")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"items\": 42}")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], json!(400));
}

#[actix_web::test]
async fn test_interest_cookie_found_among_other_cookies() {
    let app = init_app!();
    let resp = test::call_service(&app, jazz_rock_visits().to_request()).await;
    let interests = cookie_header(&resp);

    let req = test::TestRequest::post()
        .uri("/api/v1/personalization/score")
        .insert_header((
            header::COOKIE,
            format!("theme=dark; broken; {}; session=abc", interests),
        ))
        .set_json(json!({ "topics": ["rock"] }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["score"], json!(0.5));
    assert_eq!(body["matched"], json!(true));
}
