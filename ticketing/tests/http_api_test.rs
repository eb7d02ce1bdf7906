//! HTTP API integration tests.
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`; identity comes
//! from the gateway headers.
//!
//! Run with: `cargo test --test http_api_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use momenta::aggregates::TicketingEnvironment;
use momenta::config::PaymentDestinations;
use momenta::notification::InMemoryOutbox;
use momenta::server::{build_router, AppState};
use momenta::{TicketingService, TicketingStore};
use momenta_testing::test_clock;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

struct Caller {
    id: Uuid,
    name: &'static str,
    admin: bool,
}

const ADMIN: Caller = Caller {
    id: Uuid::from_u128(1),
    name: "nalisa",
    admin: true,
};
const MWILA: Caller = Caller {
    id: Uuid::from_u128(2),
    name: "mwila",
    admin: false,
};
const CHANDA: Caller = Caller {
    id: Uuid::from_u128(3),
    name: "chanda",
    admin: false,
};

fn app() -> Router {
    let env = TicketingEnvironment::new(Arc::new(test_clock()), Arc::new(InMemoryOutbox::new()));
    let service = TicketingService::new(TicketingStore::new(env), PaymentDestinations::default());
    build_router(AppState::new(service))
}

async fn call(app: &Router, method: &str, uri: &str, caller: Option<&Caller>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        request = request
            .header("x-user-id", caller.id.to_string())
            .header("x-user-name", caller.name)
            .header("x-user-email", format!("{}@example.com", caller.name))
            .header("x-user-admin", if caller.admin { "true" } else { "false" });
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("request");

    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

async fn create_event(app: &Router, vip: u32) -> String {
    let (status, _) = call(app, "GET", "/api/categories/music/events", None, None).await;
    if status == StatusCode::NOT_FOUND {
        let (status, _) = call(app, "POST", "/api/categories", Some(&ADMIN), Some(json!({"name": "Music"}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = call(
        app,
        "POST",
        "/api/events",
        Some(&ADMIN),
        Some(json!({
            "category": "music",
            "title": "Lusaka Jazz Night",
            "date": "2025-03-14",
            "location": "Mulungushi Conference Centre",
            "organizer_name": "Nalisa Events",
            "organizer_phone": "0977000000",
            "vip_seats": vip,
            "gold_seats": 10,
            "standard_seats": 50
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = call(&app(), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn metrics_endpoint_needs_an_exporter() {
    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_admins_register_events() {
    let app = app();
    let (status, body) = call(&app, "POST", "/api/events", Some(&MWILA), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = call(&app, "POST", "/api/events", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let event_id = create_event(&app, 5).await;
    let (status, body) = call(&app, "GET", &format!("/api/events/{event_id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tiers"][0]["tier"], "vip");
    assert_eq!(body["tiers"][0]["price"], 1500);
    assert_eq!(body["tiers"][0]["remaining"], 5);
}

#[tokio::test]
async fn booking_to_approval_over_http() {
    let app = app();
    let event_id = create_event(&app, 5).await;

    let (status, booking) = call(
        &app,
        "POST",
        &format!("/api/events/{event_id}/bookings"),
        Some(&MWILA),
        Some(json!({"tier": "vip", "quantity": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["total_price"], 4500);
    assert_eq!(booking["reference"], "#000001");
    let booking_id = booking["id"].as_str().unwrap().to_string();

    // Someone else cannot pay for it
    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/bookings/{booking_id}/claim"),
        Some(&CHANDA),
        Some(json!({"method": "airtel", "contact": "0977123456"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/bookings/{booking_id}/claim"),
        Some(&MWILA),
        Some(json!({"method": "airtel"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "MISSING_CONTACT");

    let (status, claim) = call(
        &app,
        "POST",
        &format!("/api/bookings/{booking_id}/claim"),
        Some(&MWILA),
        Some(json!({"method": "airtel", "contact": "0977123456", "amount": 100})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(claim["status"], "pending");
    assert_eq!(claim["amount"], 4500);
    let claim_id = claim["id"].as_str().unwrap().to_string();

    let (status, pending) = call(&app, "GET", "/api/claims?status=pending", Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, "POST", &format!("/api/claims/{claim_id}/approve"), Some(&MWILA), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, approved) = call(&app, "POST", &format!("/api/claims/{claim_id}/approve"), Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "completed");

    let (status, body) = call(&app, "POST", &format!("/api/claims/{claim_id}/approve"), Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ILLEGAL_TRANSITION");

    let (_, event) = call(&app, "GET", &format!("/api/events/{event_id}"), None, None).await;
    assert_eq!(event["tiers"][0]["remaining"], 2);

    let (status, mine) = call(&app, "GET", "/api/bookings", Some(&MWILA), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["payment_status"], "completed");

    let (status, sales) = call(&app, "GET", &format!("/api/events/{event_id}/sales"), Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sales["confirmed_tickets"], 3);
    assert_eq!(sales["confirmed_revenue"], 4500);
}

#[tokio::test]
async fn errors_map_to_statuses() {
    let app = app();
    let event_id = create_event(&app, 2).await;

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/events/{event_id}/bookings"),
        Some(&MWILA),
        Some(json!({"tier": "vip", "quantity": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_INVENTORY");

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/events/{event_id}/bookings"),
        Some(&MWILA),
        Some(json!({"tier": "balcony", "quantity": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_TIER");

    let (status, body) = call(&app, "GET", &format!("/api/events/{}", Uuid::new_v4()), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = call(&app, "GET", "/api/claims?status=lost", Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn payment_instructions_per_method() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/payment-methods/bank", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bank_name"], "Example Bank");

    let (status, body) = call(&app, "GET", "/api/payment-methods/mtn", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["mobile_number"].is_string());
    assert!(body.get("bank_name").is_none());

    let (status, _) = call(&app, "GET", "/api/payment-methods/cash", None, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn batch_decisions_report_skipped_claims() {
    let app = app();
    let event_id = create_event(&app, 5).await;

    let mut claim_ids = Vec::new();
    for _ in 0..2 {
        let (_, booking) = call(
            &app,
            "POST",
            &format!("/api/events/{event_id}/bookings"),
            Some(&MWILA),
            Some(json!({"tier": "standard", "quantity": 1})),
        )
        .await;
        let (_, claim) = call(
            &app,
            "POST",
            &format!("/api/bookings/{}/claim", booking["id"].as_str().unwrap()),
            Some(&MWILA),
            Some(json!({"method": "bank", "proof": "DEP-1"})),
        )
        .await;
        claim_ids.push(claim["id"].clone());
    }
    let first = claim_ids[0].as_str().unwrap().to_string();
    call(&app, "POST", &format!("/api/claims/{first}/reject"), Some(&ADMIN), None).await;

    let (status, outcome) = call(
        &app,
        "POST",
        "/api/claim-batches/approve",
        Some(&ADMIN),
        Some(json!({"claim_ids": claim_ids})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["applied"].as_array().unwrap().len(), 1);
    assert_eq!(outcome["skipped"][0]["code"], "ILLEGAL_TRANSITION");
}

#[tokio::test]
async fn malformed_requests_answer_with_json_errors() {
    let app = app();
    let event_id = create_event(&app, 5).await;

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/events/{event_id}/bookings"),
        Some(&MWILA),
        Some(json!({"tier": "vip", "quantity": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("quantity"));

    let (status, body) = call(&app, "GET", "/api/bookings/not-a-uuid", Some(&MWILA), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = call(&app, "POST", "/api/claims/42/approve", Some(&ADMIN), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let request = Request::builder()
        .method("POST")
        .uri("/api/claim-batches/approve")
        .header("x-user-id", ADMIN.id.to_string())
        .header("x-user-name", ADMIN.name)
        .header("x-user-admin", "true")
        .header("content-type", "application/json")
        .body(Body::from("{\"claim_ids\": ["))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = call(
        &app,
        "GET",
        &format!("/api/events/{event_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tiers"][0]["remaining"], 5);
}

#[tokio::test]
async fn categories_over_http() {
    let app = app();

    let (status, body) = call(&app, "POST", "/api/categories", Some(&MWILA), Some(json!({"name": "Sports"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, body) = call(
        &app,
        "POST",
        "/api/categories",
        Some(&ADMIN),
        Some(json!({"name": "Food & Festivals"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "food-festivals");

    let (status, body) = call(
        &app,
        "POST",
        "/api/categories",
        Some(&ADMIN),
        Some(json!({"name": "Food & Festivals"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "INVALID_CATEGORY");

    let event_id = create_event(&app, 3).await;
    let (status, body) = call(&app, "GET", "/api/categories/music/events", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"]["name"], "Music");
    assert_eq!(body["events"][0]["id"], event_id.as_str());
    assert_eq!(body["events"][0]["category"], "music");

    let (status, body) = call(&app, "GET", "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = call(&app, "GET", "/api/categories/opera/events", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = call(
        &app,
        "POST",
        "/api/events",
        Some(&ADMIN),
        Some(json!({
            "category": "opera",
            "title": "La Traviata",
            "date": "2025-09-01",
            "location": "Lusaka Playhouse",
            "organizer_name": "Nalisa Events",
            "organizer_phone": "0977000000",
            "vip_seats": 1,
            "gold_seats": 1,
            "standard_seats": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}
