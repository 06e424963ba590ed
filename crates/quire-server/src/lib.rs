//! HTTP server for quire.
//!
//! Exposes one append endpoint per document role plus a lookup endpoint for
//! the latest version of a document. Every response is a small JSON
//! envelope: `{"success": true, ...}` or `{"success": false, "error": ...}`.
//!
//! | Method | Path | |
//! |---|---|---|
//! | `GET` | `/v1/health` | liveness |
//! | `POST` | `/v1/append/customer` | append a page to the customer PDF |
//! | `POST` | `/v1/append/lulu_interior` | append a page to the print interior |
//! | `GET` | `/v1/documents/:role/:job_id` | latest version and its pages |

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{LockConfig, QuireConfig};
pub use error::{ApiError, ServerError, ServerResult};
pub use server::QuireServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, Response, StatusCode};
    use quire_assembler::fixtures;
    use quire_store::{BlobStore, InMemoryBlobStore};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn test_config() -> QuireConfig {
        QuireConfig {
            public_base_url: "https://cdn.example.com".into(),
            image_url_prefixes: vec!["https://legacy.example.com/uploads/".into()],
            lock: LockConfig {
                base_delay_ms: 1,
                max_delay_ms: 5,
                jitter_ms: 1,
                ..LockConfig::default()
            },
            ..QuireConfig::default()
        }
    }

    async fn app() -> (Arc<InMemoryBlobStore>, axum::Router) {
        let store = Arc::new(InMemoryBlobStore::with_public_base("https://cdn.example.com"));
        store
            .put("images/j1/p1.png", fixtures::png(32, 32).into())
            .await
            .unwrap();
        let state = AppState::with_store(&test_config(), store.clone());
        (store, router::build_router(state))
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (_, app) = app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn append_returns_pdf_url() {
        let (_, app) = app().await;
        let response = app
            .oneshot(post(
                "/v1/append/customer",
                json!({
                    "jobId": "J1",
                    "key": "storyPage1",
                    "imagePath": "j1/p1.png",
                    "heroName": "Kit",
                    "comicTitle": "Kit Saves the Day"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(
            body["pdfUrl"],
            "https://cdn.example.com/pdfs/customer_J1__v1.pdf"
        );
    }

    #[tokio::test]
    async fn repeat_append_returns_same_version() {
        let (_, app) = app().await;
        let body = json!({
            "jobId": "J1",
            "key": "cover",
            "imagePath": "https://cdn.example.com/images/j1/p1.png"
        });
        let first = json_body(
            app.clone()
                .oneshot(post("/v1/append/lulu_interior", body.clone()))
                .await
                .unwrap(),
        )
        .await;
        let second = json_body(
            app.oneshot(post("/v1/append/lulu_interior", body))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(
            first["pdfUrl"],
            "https://cdn.example.com/pdfs/lulu_interior_J1__v1.pdf"
        );
        assert_eq!(first["pdfUrl"], second["pdfUrl"]);
    }

    #[tokio::test]
    async fn legacy_prefix_is_stripped() {
        let (store, app) = app().await;
        store
            .put("images/j1/p2.png", fixtures::png(32, 40).into())
            .await
            .unwrap();
        let response = app
            .oneshot(post(
                "/v1/append/customer",
                json!({
                    "jobId": "J1",
                    "key": "storyPage2",
                    "imagePath": "https://legacy.example.com/uploads/j1/p2.png"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_image_path_is_422() {
        for path in ["", "../etc/passwd", "/abs.png", "https://other.host/j1/p1.png"] {
            let (_, app) = app().await;
            let response = app
                .oneshot(post(
                    "/v1/append/customer",
                    json!({"jobId": "J1", "key": "k", "imagePath": path}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
            let body = json_body(response).await;
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "Invalid image path");
        }
    }

    #[tokio::test]
    async fn malformed_body_is_422() {
        let (_, app) = app().await;
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/append/customer")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = app
            .oneshot(post("/v1/append/customer", json!({"jobId": "J1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["success"], false);
    }

    #[tokio::test]
    async fn bad_job_id_is_422() {
        let (_, app) = app().await;
        let response = app
            .oneshot(post(
                "/v1/append/customer",
                json!({"jobId": "../J1", "key": "k", "imagePath": "j1/p1.png"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn missing_image_is_500() {
        let (_, app) = app().await;
        let response = app
            .oneshot(post(
                "/v1/append/customer",
                json!({"jobId": "J1", "key": "k", "imagePath": "j1/missing.png"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("image fetch failed"));
    }

    #[tokio::test]
    async fn bare_options_is_ok() {
        let (_, app) = app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/v1/append/customer")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cors_preflight() {
        let (_, app) = app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/v1/append/lulu_interior")
                    .header("origin", "https://shop.example.com")
                    .header("access-control-request-method", "POST")
                    .header("access-control-request-headers", "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn document_lookup() {
        let (_, app) = app().await;
        let missing = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/v1/documents/customer/J1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(missing).await["success"], false);

        app.clone()
            .oneshot(post(
                "/v1/append/customer",
                json!({"jobId": "J1", "key": "cover", "imagePath": "j1/p1.png"}),
            ))
            .await
            .unwrap();

        let found = app
            .oneshot(
                Request::builder()
                    .uri("/v1/documents/customer/J1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(found.status(), StatusCode::OK);
        let body = json_body(found).await;
        assert_eq!(body["versionKey"], "customer_J1__v1.pdf");
        assert_eq!(body["pages"], json!(["cover"]));
    }

    #[tokio::test]
    async fn unknown_role_is_404() {
        let (_, app) = app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/documents/admin/J1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
