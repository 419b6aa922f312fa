//! HTTP endpoint tests against the router, without binding a socket

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use nutrition_insights::server::{AppState, router};
use nutrition_insights::{AppConfig, Artifact, BlobStore, IngestionTrigger, MemoryBlobStore};

const SOURCE: &str = "Diet_type,Recipe_name,Cuisine_type,Protein(g),Carbs(g),Fat(g)\n\
    keto,Omelette,french,10,5,20\n\
    Keto,Pork Belly,american,25,0,30\n\
    vegan,Tofu Bowl,asian,12,40,12\n";

async fn app(ingest: bool) -> (Arc<MemoryBlobStore>, Router) {
    let store = Arc::new(MemoryBlobStore::new());
    if ingest {
        IngestionTrigger::new(store.clone(), "outputs")
            .handle("All_Diets.csv", SOURCE.as_bytes())
            .await
            .unwrap();
    }
    let state = AppState::new(store.clone(), &AppConfig::new());
    (store, router(state))
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_raw_returns_cached_csv() {
    let (store, app) = app(true).await;

    let (status, headers, body) = get(app, "/raw").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv");

    let stored = store
        .get("outputs", Artifact::CleanedCsv.blob_name())
        .await
        .unwrap();
    assert_eq!(body, stored);
}

#[tokio::test]
async fn test_raw_error_is_plain_text() {
    let (_, app) = app(false).await;

    let (status, _, body) = get(app, "/raw").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let text = String::from_utf8(body).unwrap();
    assert!(text.starts_with("Error: "), "{text}");
}

#[tokio::test]
async fn test_page_defaults() {
    let (_, app) = app(true).await;

    let (status, json) = get_json(app, "/page").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["page"], 1);
    assert_eq!(json["pageSize"], 20);
    assert_eq!(json["totalPages"], 1);
    assert_eq!(json["totalRows"], 3);
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_page_filters_and_slices() {
    let (_, app) = app(true).await;

    let (status, json) = get_json(app, "/page?diet=KETO&page=2&pageSize=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalRows"], 2);
    assert_eq!(json["totalPages"], 2);

    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["Recipe_name"], "Pork Belly");
    assert_eq!(data[0]["Protein(g)"], 25);
    // 0 carbs over 30 fat, and 25 protein over 0 carbs
    assert_eq!(data[0]["Carbs_to_Fat_ratio"], 0.0);
    assert_eq!(data[0]["Protein_to_Carbs_ratio"], "inf");
}

#[tokio::test]
async fn test_page_keyword_aliases() {
    let (_, app) = app(true).await;

    let (_, json) = get_json(app.clone(), "/page?q=tofu").await;
    assert_eq!(json["totalRows"], 1);

    let (_, json) = get_json(app, "/page?filter=OMELETTE").await;
    assert_eq!(json["totalRows"], 1);
}

#[tokio::test]
async fn test_page_rejects_unparseable_numbers() {
    let (_, app) = app(true).await;

    let (status, json) = get_json(app, "/page?pageSize=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("pageSize"));
}

#[tokio::test]
async fn test_page_error_is_json() {
    let (_, app) = app(false).await;

    let (status, json) = get_json(app, "/page").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_stats() {
    let (_, app) = app(true).await;

    let (status, json) = get_json(app, "/stats?diet=keto&filter=french").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rows_processed"], 1);
    assert!(json["processing_time_ms"].is_u64());
    assert_eq!(
        json["uploaded_files"],
        serde_json::json!([
            "avg_macros_bar_chart.png",
            "macronutrient_heatmap.png",
            "top5_protein_scatter.png"
        ])
    );
}

#[tokio::test]
async fn test_stats_allows_any_origin() {
    let (_, app) = app(true).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stats")
                .header(header::ORIGIN, "https://dashboard.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
