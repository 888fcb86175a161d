// HTTP server - serves the browser UI and the conversion API

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::engines::gtranslate::SUPPORTED_LANGUAGES;
use crate::orchestrator::{ConvertError, Converter};
use crate::types::{ConvertRequest, ConvertResponse};

const INDEX_HTML: &str = include_str!("../assets/index.html");

#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Root serves the single-page UI
        .route("/", get(index))
        .route("/api", get(api_info))
        .route("/api/health", get(health))
        .route("/api/engines", get(engines))
        .route("/api/voices", get(voices))
        .route("/api/languages", get(languages))
        .route("/api/convert", post(convert))
        .layer(cors)
        .with_state(state)
}

pub async fn run_http_server(converter: Arc<Converter>, port: u16) {
    let app = build_router(AppState { converter });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind HTTP server to port {}: {}", port, e);
            error!("Try setting VOXBOX_HTTP_PORT to a different port, e.g.:");
            error!("  VOXBOX_HTTP_PORT=3002 voxbox-server");
            return;
        }
    };
    info!("Listening on http://localhost:{}", port);
    if let Err(e) = axum::serve(listener, app).await {
        error!("HTTP server error: {}", e);
    }
}

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

// Shows API info and available endpoints
async fn api_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "voxbox API",
        "version": "1.0.0",
        "status": "running",
        "endpoints": {
            "health": "/api/health",
            "engines": "/api/engines",
            "voices": "/api/voices",
            "languages": "/api/languages",
            "convert": "POST /api/convert"
        },
        "docs": "Use /api/health to check server status"
    }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn engines(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "offline": {
            "available": state.converter.offline_available(),
            "name": state.converter.offline_name(),
            "voices": state.converter.catalog().len(),
        },
        "cloud": {
            "available": true,
            "name": state.converter.cloud_name(),
        }
    }))
}

async fn voices(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.converter.catalog().voices().to_vec())
}

async fn languages() -> impl IntoResponse {
    let entries: Vec<serde_json::Value> = SUPPORTED_LANGUAGES
        .iter()
        .map(|(label, region)| serde_json::json!({ "label": label, "region": region }))
        .collect();
    Json(entries)
}

async fn convert(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let request: ConvertRequest = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    };

    match state.converter.convert(&request).await {
        Ok(synthesis) => {
            let response = ConvertResponse::new(
                synthesis.filename,
                synthesis.format,
                &synthesis.audio,
                synthesis.duration_secs,
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => (
            error_status(&e),
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

fn error_status(error: &ConvertError) -> StatusCode {
    match error {
        ConvertError::EmptyInput => StatusCode::BAD_REQUEST,
        ConvertError::EngineUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ConvertError::RenderFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ConvertError::NetworkOrServiceFailure(_) => StatusCode::BAD_GATEWAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::mock::{MockCloud, MockCloudBehavior, MockOffline, MockOfflineBehavior};
    use crate::engines::OfflineEngine;

    fn test_state(offline: Option<MockOffline>, cloud: MockCloud) -> AppState {
        let converter = Converter::new(
            offline.map(|mock| Box::new(mock) as Box<dyn OfflineEngine>),
            Box::new(cloud),
            None,
        );
        AppState {
            converter: Arc::new(converter),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_languages_endpoint_lists_accent_menu() {
        let response = languages().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 25);
        assert_eq!(entries[0]["label"], "English (US)");
        assert_eq!(entries[0]["region"], "en");
        assert_eq!(entries[1]["region"], "co.uk");
    }

    #[tokio::test]
    async fn test_voices_endpoint_lists_catalog() {
        let state = test_state(Some(MockOffline::new()), MockCloud::new());
        let response = voices(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1]["name"], "Microsoft Zira Desktop");
        assert_eq!(entries[1]["gender"], "Female");
        assert_eq!(entries[1]["index"], 1);
    }

    #[tokio::test]
    async fn test_engines_endpoint_reports_availability() {
        let state = test_state(Some(MockOffline::new()), MockCloud::new());
        let json = body_json(engines(State(state)).await.into_response()).await;
        assert_eq!(json["offline"]["available"], true);
        assert_eq!(json["offline"]["voices"], 3);
        assert_eq!(json["cloud"]["name"], "mock-cloud");

        let state = test_state(None, MockCloud::new());
        let json = body_json(engines(State(state)).await.into_response()).await;
        assert_eq!(json["offline"]["available"], false);
        assert_eq!(json["offline"]["voices"], 0);
    }

    #[tokio::test]
    async fn test_convert_success_returns_envelope() {
        let state = test_state(Some(MockOffline::new()), MockCloud::new());
        let body = serde_json::json!({
            "text": "Hello world",
            "engine": "offline"
        });

        let response = convert(State(state), Json(body)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["format"], "WAV");
        assert_eq!(json["mime"], "audio/wav");
        assert!(json["filename"].as_str().unwrap().starts_with("tts_offline_"));
        assert!(json["sizeBytes"].as_u64().unwrap() > 0);
        assert!(!json["audioBase64"].as_str().unwrap().is_empty());
        assert!(json["durationSecs"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_convert_cloud_success() {
        let state = test_state(None, MockCloud::new());
        let body = serde_json::json!({
            "text": "Hello world",
            "engine": "cloud",
            "region": "co.uk",
            "slow": false
        });

        let response = convert(State(state), Json(body)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["format"], "MP3");
        assert_eq!(json["mime"], "audio/mpeg");
        assert!(json["filename"].as_str().unwrap().ends_with(".mp3"));
        assert!(json["durationSecs"].is_null());
    }

    #[tokio::test]
    async fn test_convert_empty_input_is_400() {
        let state = test_state(Some(MockOffline::new()), MockCloud::new());
        let body = serde_json::json!({ "text": "   ", "engine": "offline" });

        let response = convert(State(state), Json(body)).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("enter some text"));
    }

    #[tokio::test]
    async fn test_convert_unavailable_engine_is_503() {
        let state = test_state(None, MockCloud::new());
        let body = serde_json::json!({ "text": "hi", "engine": "offline" });

        let response = convert(State(state), Json(body)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_convert_render_failure_is_500() {
        let state = test_state(
            Some(MockOffline::with_behavior(MockOfflineBehavior::RenderError)),
            MockCloud::new(),
        );
        let body = serde_json::json!({ "text": "hi", "engine": "offline" });

        let response = convert(State(state), Json(body)).await.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_convert_network_failure_is_502_with_hint() {
        let state = test_state(
            None,
            MockCloud::with_behavior(MockCloudBehavior::NetworkError),
        );
        let body = serde_json::json!({
            "text": "hi",
            "engine": "cloud",
            "region": "de"
        });

        let response = convert(State(state), Json(body)).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let json = body_json(response).await;
        assert!(json["error"]
            .as_str()
            .unwrap()
            .ends_with("Check your internet connection."));
    }

    #[tokio::test]
    async fn test_convert_malformed_body_is_400() {
        let state = test_state(Some(MockOffline::new()), MockCloud::new());
        // Unknown engine tag never reaches the orchestrator
        let body = serde_json::json!({ "text": "hi", "engine": "sing" });

        let response = convert(State(state), Json(body)).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(error_status(&ConvertError::EmptyInput), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_status(&ConvertError::EngineUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_status(&ConvertError::RenderFailure("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            error_status(&ConvertError::NetworkOrServiceFailure("x".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }
}
