use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod poll;
pub mod search;
pub mod state;
pub mod stream;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .route("/api/search", get(search::start_search))
        .route("/api/search/cancel", post(search::cancel_search))
        .route("/ws/result/stream", get(stream::websocket_handler))
        .route("/api/result/sse", get(stream::sse_handler))
        .route("/api/result/longpoll", get(poll::longpoll_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use skyfare_search::SearchOrchestrator;
    use skyfare_store::app_config::SearchRules;
    use skyfare_store::{MemoryStore, SearchStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(rules: SearchRules) -> AppState {
        let store: Arc<dyn SearchStore> = Arc::new(MemoryStore::new());
        let orchestrator = Arc::new(SearchOrchestrator::new(store.clone(), rules.clone()));
        AppState {
            store,
            orchestrator,
            rules,
            port: 3001,
        }
    }

    fn fast_rules() -> SearchRules {
        SearchRules {
            flights_per_source_min: 8,
            flights_per_source_max: 8,
            delay_min_ms: 1,
            delay_max_ms: 3,
            poll_interval_ms: 20,
            poll_timeout_seconds: 1,
            stream_timeout_seconds: 5,
            ..SearchRules::default()
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn test_search_returns_query_id_and_ws_url() {
        let state = test_state(fast_rules());
        let app = app(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/search?from=CGK&to=DPS&trip_type=one_way&departure_date=2026-09-01&pax=2")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let query_id = body["query_id"].as_str().expect("query_id");
        assert_eq!(query_id.len(), 64);
        assert!(body["ws_url"]
            .as_str()
            .unwrap()
            .contains(&format!("query_id={}", query_id)));

        // Stop the background workers.
        state.orchestrator.cancel(query_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_unknown_query_is_a_noop() {
        let app = app(test_state(fast_rules()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/search/cancel?query_id=deadbeef")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "cancelled");
    }

    #[tokio::test]
    async fn test_cancel_requires_query_id() {
        let app = app(test_state(fast_rules()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/search/cancel")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_longpoll_unknown_query_times_out_with_cursor() {
        let app = app(test_state(fast_rules()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/result/longpoll?query_id=missing&last_seen_index=3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["type"], "timeout");
        assert_eq!(body["last_seen_index"], 3);
    }

    #[tokio::test]
    async fn test_sse_streams_frames_until_completion() {
        let state = test_state(SearchRules {
            delay_min_ms: 10,
            delay_max_ms: 20,
            ..fast_rules()
        });
        let app = app(state.clone());

        let request = skyfare_shared::SearchRequest {
            origin: "CGK".into(),
            destination: "SIN".into(),
            trip_type: "one_way".into(),
            departure_date: "2026-09-01".into(),
            return_date: None,
            pax: 1,
        };
        let query_id = state.orchestrator.start(request).await.unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/result/sse?query_id={}", query_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        // The stream closes on the terminal frame, so the body is finite.
        let bytes = axum::body::to_bytes(response.into_body(), 4 * 1024 * 1024)
            .await
            .expect("collect sse body");
        let body = String::from_utf8_lossy(&bytes);

        assert!(body.contains("event: progress"));
        assert!(body.contains("event: flight"));
        assert!(body.contains("event: completed"));
        assert!(body.contains(r#""total_flights":24"#));
    }

    #[tokio::test]
    async fn test_stream_endpoints_reject_missing_query_id() {
        let state = test_state(fast_rules());

        for uri in ["/api/result/sse", "/ws/result/stream", "/api/result/longpoll"] {
            let response = app(state.clone())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert!(response.status().is_client_error(), "uri {}", uri);
        }
    }
}
