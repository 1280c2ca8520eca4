// HTTP tests for the /api/v1 surface

use std::sync::Arc;

use actix_web::{http::StatusCode, test, web, App};
use chrono::{Duration, Utc};
use heartconnect_match::core::Recommender;
use heartconnect_match::models::{Gender, Profile};
use heartconnect_match::routes::{self, AppState, Claims, JwtVerifier};
use heartconnect_match::services::{
    MatchService, MatchingOptions, MemoryPairingStore, MemoryProfileDirectory,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

const SECRET: &str = "test-secret";

fn create_test_profile(id: &str, gender: Gender, interested_in: Gender) -> Profile {
    let now = Utc::now();
    Profile {
        id: id.to_string(),
        first_name: id.to_string(),
        last_name: String::new(),
        date_of_birth: Some(now - Duration::days(28 * 365 + 30)),
        gender,
        interested_in: vec![interested_in],
        bio: None,
        photos: vec![],
        interests: vec![],
        lifestyle: Default::default(),
        location: Default::default(),
        preferences: Default::default(),
        is_online: true,
        last_active: now,
        is_verified: false,
        is_premium: false,
        is_blocked: false,
        blocked_users: vec![],
        stats: Default::default(),
    }
}

fn bearer(sub: &str) -> (&'static str, String) {
    let claims = Claims {
        sub: sub.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
    ("Authorization", format!("Bearer {}", token))
}

fn state() -> AppState {
    let profiles = MemoryProfileDirectory::with_profiles(vec![
        create_test_profile("alice", Gender::Female, Gender::Male),
        create_test_profile("bob", Gender::Male, Gender::Female),
        create_test_profile("carol", Gender::Female, Gender::Male),
    ]);

    AppState {
        service: Arc::new(MatchService::new(
            Arc::new(MemoryPairingStore::new()),
            Arc::new(profiles),
            Recommender::default(),
            MatchingOptions::default(),
        )),
    }
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::Data::new(JwtVerifier::new(SECRET)))
                .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
                .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
                .configure(routes::configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_is_public() {
    let app = app!(state());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_missing_token_is_unauthorized() {
    let app = app!(state());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/v1/matches").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "unauthenticated");
    assert_eq!(body["status_code"], 401);
}

#[actix_web::test]
async fn test_swipe_flow_over_http() {
    let app = app!(state());

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/swipe")
        .insert_header(bearer("alice"))
        .set_json(json!({ "userId": "bob", "action": "like" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["result"]["status"], "pending");
    assert_eq!(body["result"]["isNewMatch"], false);

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/swipe")
        .insert_header(bearer("bob"))
        .set_json(json!({ "userId": "alice", "action": "like" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "It's a match!");
    assert_eq!(body["result"]["status"], "matched");
    assert!(body["result"]["compatibilityScore"].is_number());
    let id = body["result"]["pairingId"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/matches/{}", id))
        .insert_header(bearer("carol"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/matches?status=matched")
        .insert_header(bearer("alice"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["matches"][0]["otherUser"]["id"], "bob");

    let req = test::TestRequest::get()
        .uri("/api/v1/matches/stats")
        .insert_header(bearer("alice"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["matches"], 1);
}

#[actix_web::test]
async fn test_repeat_swipe_conflicts() {
    let app = app!(state());

    for expected in [StatusCode::OK, StatusCode::CONFLICT] {
        let req = test::TestRequest::post()
            .uri("/api/v1/matches/swipe")
            .insert_header(bearer("alice"))
            .set_json(json!({ "userId": "bob", "action": "like" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), expected);
    }
}

#[actix_web::test]
async fn test_bad_input_is_bad_request() {
    let app = app!(state());

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/swipe")
        .insert_header(bearer("alice"))
        .set_json(json!({ "userId": "bob", "action": "wink" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/swipe")
        .insert_header(bearer("alice"))
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");

    let req = test::TestRequest::get()
        .uri("/api/v1/matches/not-a-uuid")
        .insert_header(bearer("alice"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/matches?status=bogus")
        .insert_header(bearer("alice"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_schedule_date_on_pending_is_conflict() {
    let app = app!(state());

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/swipe")
        .insert_header(bearer("alice"))
        .set_json(json!({ "userId": "bob", "action": "like" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["result"]["pairingId"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/{}/schedule-date", id))
        .insert_header(bearer("alice"))
        .set_json(json!({ "scheduledAt": "2030-01-01T18:00:00Z", "activity": "Coffee" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_state");
}

#[actix_web::test]
async fn test_recommendations_route() {
    let app = app!(state());

    let req = test::TestRequest::get()
        .uri("/api/v1/matches/recommendations?limit=5&excludeUserIds=carol")
        .insert_header(bearer("bob"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let recs = body["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0]["profile"]["id"], "alice");
}
