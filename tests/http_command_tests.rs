//! Runs the shipped commands against a local mock control plane.

mod common;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use common::{serial, StaticAuth, StaticResolver};
use serde_json::{json, Value};
use stackadm::client::DefaultClientFactory;
use stackadm::commands::gallery::ListGalleryItemsCommand;
use stackadm::commands::offers::ListOffersCommand;
use stackadm::commands::plans::ListPlansCommand;
use stackadm::commands::usage::{Granularity, UsageCommand};
use stackadm::commands::TlsArgs;
use stackadm::output::CollectingOutput;
use stackadm::tls;
use stackadm::{AdminError, CommandHost};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const OFFERS: &str = "/subscriptions/sub-1/providers/Microsoft.Subscriptions.Admin/offers";

fn spawn_control_plane() -> String {
    let router = Router::new()
        .route(OFFERS, get(offers))
        .route(
            "/subscriptions/sub-1/resourceGroups/rg1/providers/Microsoft.Subscriptions.Admin/offers/gold",
            get(gold_offer),
        )
        .route(
            "/subscriptions/sub-1/resourceGroups/rg1/providers/Microsoft.Subscriptions.Admin/plans",
            get(plans),
        )
        .route("/providers/Microsoft.Gallery.Admin/galleryItems", get(gallery))
        .route(
            "/subscriptions/sub-1/providers/Microsoft.Commerce/subscriberUsageAggregates",
            get(usage),
        )
        .fallback(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({"error": {"code": "ResourceNotFound"}})),
            )
        });
    serve(router)
}

fn serve(router: Router) -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, router).await.unwrap();
        });
    });
    let addr = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    format!("http://{}/", addr)
}

fn check(headers: &HeaderMap, query: &HashMap<String, String>, version: &str) -> Option<Response> {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer test-token");
    if !authorized {
        return Some((StatusCode::UNAUTHORIZED, "missing token").into_response());
    }
    if query.get("api-version").map(String::as_str) != Some(version) {
        return Some((StatusCode::BAD_REQUEST, "unsupported api-version").into_response());
    }
    None
}

async fn offers(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if let Some(rejection) = check(&headers, &query, "2015-11-01") {
        return rejection;
    }
    if query.get("page").map(String::as_str) == Some("2") {
        return Json(json!({"value": [{"name": "offer3"}]})).into_response();
    }
    Json(json!({
        "value": [{"name": "offer1"}, {"name": "offer2"}],
        "nextLink": offers_link(&headers, None, "2"),
    }))
    .into_response()
}

fn offers_link(headers: &HeaderMap, host: Option<&str>, page: &str) -> String {
    let host = host.map(str::to_string).unwrap_or_else(|| {
        headers
            .get("host")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    });
    format!("http://{}{}?api-version=2015-11-01&page={}", host, OFFERS, page)
}

/// Offers whose pages link a → b → a.
async fn cycling_offers(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if let Some(rejection) = check(&headers, &query, "2015-11-01") {
        return rejection;
    }
    let next = match query.get("page").map(String::as_str) {
        Some("a") => "b",
        _ => "a",
    };
    Json(json!({
        "value": [{"name": format!("offer-{}", next)}],
        "nextLink": offers_link(&headers, None, next),
    }))
    .into_response()
}

static FOREIGN_FETCHES: AtomicUsize = AtomicUsize::new(0);

/// Offers whose second page is advertised under another host name.
async fn redirecting_offers(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if query.get("page").map(String::as_str) == Some("elsewhere") {
        FOREIGN_FETCHES.fetch_add(1, Ordering::SeqCst);
        return Json(json!({"value": [{"name": "stolen"}]})).into_response();
    }
    if let Some(rejection) = check(&headers, &query, "2015-11-01") {
        return rejection;
    }
    let port = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.rsplit(':').next())
        .unwrap_or_default()
        .to_string();
    let other = format!("localhost:{}", port);
    Json(json!({
        "value": [{"name": "offer1"}],
        "nextLink": offers_link(&headers, Some(&other), "elsewhere"),
    }))
    .into_response()
}

async fn gold_offer(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if let Some(rejection) = check(&headers, &query, "2015-11-01") {
        return rejection;
    }
    Json(json!({
        "name": "gold",
        "properties": {"basePlanIds": ["/plans/gold-plan"]}
    }))
    .into_response()
}

async fn plans(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if let Some(rejection) = check(&headers, &query, "2015-11-01") {
        return rejection;
    }
    Json(json!({"value": [{"id": "/plans/gold-plan"}, {"id": "/plans/silver-plan"}]})).into_response()
}

async fn gallery(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if let Some(rejection) = check(&headers, &query, "2015-04-01") {
        return rejection;
    }
    Json(json!({"value": [{"identity": "Microsoft.WindowsServer.1.0.0"}]})).into_response()
}

async fn usage(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if let Some(rejection) = check(&headers, &query, "2015-06-01-preview") {
        return rejection;
    }
    let expected = [
        ("reportedStartTime", "2015-06-01T00:00:00+00:00"),
        ("reportedEndTime", "2015-06-03T00:00:00+00:00"),
        ("aggregationGranularity", "Daily"),
    ];
    for (key, value) in expected {
        if query.get(key).map(String::as_str) != Some(value) {
            return (StatusCode::BAD_REQUEST, format!("bad {}", key)).into_response();
        }
    }
    Json(json!({"value": [{"name": "day1"}, {"name": "day2"}]})).into_response()
}

fn host(base: &str) -> CommandHost<DefaultClientFactory> {
    CommandHost::new(
        StaticResolver::present(base),
        StaticAuth::default(),
        DefaultClientFactory::with_timeout(Duration::from_secs(10)),
    )
}

fn names(items: &[Value], key: &str) -> Vec<String> {
    items
        .iter()
        .map(|i| i[key].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_offers_list_follows_next_link() {
    let _serial = serial();
    let base = spawn_control_plane();
    let mut sink = CollectingOutput::default();

    let emitted = host(&base)
        .execute(&ListOffersCommand::default(), &mut sink)
        .unwrap();

    assert_eq!(emitted, 3);
    assert_eq!(names(&sink.items, "name"), vec!["offer1", "offer2", "offer3"]);
}

#[test]
fn test_gallery_uses_gallery_api_version() {
    let _serial = serial();
    let base = spawn_control_plane();
    let mut sink = CollectingOutput::default();

    host(&base)
        .execute(&ListGalleryItemsCommand::default(), &mut sink)
        .unwrap();

    assert_eq!(names(&sink.items, "identity"), vec!["Microsoft.WindowsServer.1.0.0"]);
}

#[test]
fn test_usage_sends_reporting_window() {
    let _serial = serial();
    let base = spawn_control_plane();
    let mut sink = CollectingOutput::default();
    let command = UsageCommand {
        start: "2015-06-01".parse().unwrap(),
        end: "2015-06-03".parse().unwrap(),
        granularity: Granularity::Daily,
        show_details: false,
        tls: TlsArgs::default(),
    };

    let emitted = host(&base).execute(&command, &mut sink).unwrap();

    assert_eq!(emitted, 2);
}

#[test]
fn test_plans_filtered_by_offer() {
    let _serial = serial();
    let base = spawn_control_plane();
    let mut sink = CollectingOutput::default();
    let command = ListPlansCommand {
        resource_group: Some("rg1".to_string()),
        offer: Some("gold".to_string()),
        tls: TlsArgs::default(),
    };

    host(&base).execute(&command, &mut sink).unwrap();

    assert_eq!(names(&sink.items, "id"), vec!["/plans/gold-plan"]);
}

#[test]
fn test_missing_resource_is_api_error_with_no_output() {
    let _serial = serial();
    let base = spawn_control_plane();
    let mut sink = CollectingOutput::default();
    let command = ListOffersCommand {
        resource_group: Some("rg-missing".to_string()),
        name: Some("nope".to_string()),
        tls: TlsArgs::default(),
    };

    let failure = host(&base).execute(&command, &mut sink).unwrap_err();

    assert_eq!(failure.operation, "offers list");
    match failure.source {
        AdminError::Api { status, body, .. } => {
            assert_eq!(status, 404);
            assert!(body.contains("ResourceNotFound"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(sink.items.is_empty());
}

#[test]
fn test_skip_certificate_validation_does_not_leak() {
    let _serial = serial();
    let base = spawn_control_plane();
    let before = tls::current_policy();
    let command = ListOffersCommand {
        tls: TlsArgs {
            skip_certificate_validation: true,
            ca_certificate: None,
        },
        ..ListOffersCommand::default()
    };

    host(&base)
        .execute(&command, &mut CollectingOutput::default())
        .unwrap();

    assert_eq!(tls::current_policy(), before);
}

#[test]
fn test_next_link_cycle_fails_instead_of_looping() {
    let _serial = serial();
    let base = serve(Router::new().route(OFFERS, get(cycling_offers)));
    let mut sink = CollectingOutput::default();

    let failure = host(&base)
        .execute(&ListOffersCommand::default(), &mut sink)
        .unwrap_err();

    assert!(matches!(failure.source, AdminError::CoreExecution(_)));
    assert!(failure.to_string().contains("already fetched"));
    assert!(sink.items.is_empty());
}

#[test]
fn test_next_link_to_other_origin_is_not_followed() {
    let _serial = serial();
    let base = serve(Router::new().route(OFFERS, get(redirecting_offers)));
    let mut sink = CollectingOutput::default();

    let failure = host(&base)
        .execute(&ListOffersCommand::default(), &mut sink)
        .unwrap_err();

    assert!(matches!(failure.source, AdminError::CoreExecution(_)));
    assert!(failure.to_string().contains("origin"));
    assert_eq!(FOREIGN_FETCHES.load(Ordering::SeqCst), 0);
    assert!(sink.items.is_empty());
}
