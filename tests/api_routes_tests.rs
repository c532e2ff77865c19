// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end route tests with a mock Strava behind the router.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use run_dashboard::config::Config;
use run_dashboard::models::RunProjection;
use run_dashboard::routes::strava::AuthUrlResponse;
use run_dashboard::store::CredentialStore;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{header as header_matcher, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{create_test_app, credential_expiring_in, test_store, token_response};

async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect location")
        .to_str()
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = create_test_app(&server, Config::default(), Arc::new(test_store(dir.path())));

    let response = get(app, "/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    assert_eq!(body.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_auth_url() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = create_test_app(&server, Config::default(), Arc::new(test_store(dir.path())));

    let response = get(app, "/api/strava/auth-url").await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: AuthUrlResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(body.url.contains("/oauth/authorize?client_id=test_client_id"));
    assert!(body.url.contains("scope=read,activity:read_all"));
}

#[tokio::test]
async fn test_auth_url_unconfigured() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.strava.client_id = None;
    let (app, _) = create_test_app(&server, config, Arc::new(test_store(dir.path())));

    let response = get(app, "/api/strava/auth-url").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "configuration_error");
}

#[tokio::test]
async fn test_callback_completes_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response(
            "cb_access",
            "cb_refresh",
            Utc::now() + Duration::hours(6),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(test_store(dir.path()));
    let (app, _) = create_test_app(&server, Config::default(), store.clone());

    let response = get(
        app,
        "/api/strava/oauth/callback?state=&code=abc123&scope=read,activity:read_all",
    )
    .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "http://localhost:4200/login?connected=1");

    let stored = store.read().await.expect("credential stored");
    assert_eq!(stored.access_token, "cb_access");
}

#[tokio::test]
async fn test_callback_without_code() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = create_test_app(&server, Config::default(), Arc::new(test_store(dir.path())));

    let response = get(app, "/api/strava/oauth/callback").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_callback_with_denied_access() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = create_test_app(&server, Config::default(), Arc::new(test_store(dir.path())));

    let response = get(app, "/api/strava/oauth/callback?error=access_denied").await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        "http://localhost:4200/login?error=access_denied"
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_callback_exchange_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid code"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (app, _) = create_test_app(&server, Config::default(), Arc::new(test_store(dir.path())));

    let response = get(app, "/api/strava/oauth/callback?code=stale").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"], "strava_error");
}

#[tokio::test]
async fn test_activities_requires_authorization() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = create_test_app(&server, Config::default(), Arc::new(test_store(dir.path())));

    let response = get(app, "/api/strava/activities").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "not_authorized");
}

#[tokio::test]
async fn test_activities_returns_runs_only() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(header_matcher("authorization", "Bearer stored_access"))
        .and(query_param("per_page", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": 1, "name": "Tempo", "type": "Run",
                "start_date_local": "2024-05-02T06:00:00Z",
                "distance": 8000.0, "moving_time": 2400, "average_speed": 3.33
            },
            {
                "id": 2, "name": "Spin", "type": "Ride",
                "start_date_local": "2024-05-01T18:00:00Z",
                "distance": 30000.0, "moving_time": 3600, "average_speed": 8.3
            },
            {
                "id": 3, "name": "Easy", "type": "run",
                "start_date_local": "2024-04-30T06:00:00Z",
                "distance": 5000.0, "moving_time": 1800, "average_speed": 2.78
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(test_store(dir.path()));
    store
        .write(&credential_expiring_in(Duration::hours(3)))
        .await
        .unwrap();
    let (app, _) = create_test_app(&server, Config::default(), store);

    let response = get(app, "/api/strava/activities").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body[0].get("distanceKm").is_some(), "camelCase fields");
    assert!(body[0].get("averagePaceMinPerKm").is_some());

    let runs: Vec<RunProjection> = serde_json::from_value(body).unwrap();
    let ids: Vec<u64> = runs.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(runs[0].distance_km, 8.0);
    assert_eq!(runs[1].distance_km, 5.0);
    assert!((runs[1].average_pace_min_per_km - 6.0).abs() < 0.1);
}

#[tokio::test]
async fn test_activities_refreshes_expired_token_first() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response(
            "refreshed_access",
            "refreshed_refresh",
            Utc::now() + Duration::hours(6),
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(header_matcher("authorization", "Bearer refreshed_access"))
        .and(query_param("per_page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(test_store(dir.path()));
    store
        .write(&credential_expiring_in(-Duration::minutes(10)))
        .await
        .unwrap();
    let (app, _) = create_test_app(&server, Config::default(), store);

    let response = get(app, "/api/strava/activities?perPage=3").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_activities_page_size_bounds() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = create_test_app(&server, Config::default(), Arc::new(test_store(dir.path())));

    for uri in [
        "/api/strava/activities?perPage=0",
        "/api/strava/activities?perPage=201",
    ] {
        let response = get(app.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_activities_malformed_page_size() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = create_test_app(&server, Config::default(), Arc::new(test_store(dir.path())));

    for uri in [
        "/api/strava/activities?perPage=abc",
        "/api/strava/activities?perPage=-1",
    ] {
        let response = get(app.clone(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);

        let body = body_json(response).await;
        assert_eq!(body["error"], "bad_request");
        assert!(body["details"].as_str().is_some(), "{}", uri);
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_activities_upstream_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(test_store(dir.path()));
    store
        .write(&credential_expiring_in(Duration::hours(3)))
        .await
        .unwrap();
    let (app, _) = create_test_app(&server, Config::default(), store);

    let response = get(app, "/api/strava/activities").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
