//! Embedded HTTP server exposing the site collection API.
//!
//! Routes mirror the original serverless surface: list/create/update/delete
//! under `/api/sites` and bookmark-HTML import under `/api/import`. Mutating
//! routes are gated by a capability token carried in the `X-Edit-Token`
//! header; with no token configured the gate is open for local use.

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::bookmarks::{NewSite, Site};
use crate::storage::{SiteStore, StorageError};

/// Largest accepted import payload (8 MiB of bookmark HTML).
const MAX_IMPORT_BYTES: usize = 8 * 1024 * 1024;

/// Server state shared across requests.
pub struct AppState {
    /// Persisted site collection.
    pub sites: SiteStore,
    /// Token required on mutating requests; `None` disables the gate.
    pub edit_token: Option<String>,
}

/// API error surfaced to clients as `{ "error": "..." }` JSON.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid edit token")]
    InvalidToken,

    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::EmptyImport)
            | ApiError::Storage(StorageError::InvalidSite(_)) => StatusCode::BAD_REQUEST,
            ApiError::Storage(err) => {
                log::error!("Store operation failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/sites",
            get(list_sites)
                .post(create_site)
                .put(update_site)
                .delete(delete_sites),
        )
        .route("/api/import", post(import_bookmarks))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Generate a random alphanumeric edit token.
pub fn generate_edit_token() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn check_edit_token(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.edit_token.as_deref() else {
        return Ok(());
    };
    let provided = headers.get("x-edit-token").and_then(|v| v.to_str().ok());
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(ApiError::InvalidToken)
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_sites(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Site>>, ApiError> {
    Ok(Json(state.sites.list()?))
}

async fn create_site(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(new): Json<NewSite>,
) -> Result<(StatusCode, Json<Site>), ApiError> {
    check_edit_token(&state, &headers)?;
    let site = state.sites.add(new)?;
    Ok((StatusCode::CREATED, Json(site)))
}

async fn update_site(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(site): Json<Site>,
) -> Result<Json<Vec<Site>>, ApiError> {
    check_edit_token(&state, &headers)?;
    Ok(Json(state.sites.update(site)?))
}

#[derive(Deserialize)]
struct DeleteRequest {
    ids: Vec<String>,
}

async fn delete_sites(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    check_edit_token(&state, &headers)?;
    state.sites.delete(&request.ids)?;
    Ok(Json(json!({ "success": true })))
}

async fn import_bookmarks(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
) -> Result<Json<serde_json::Value>, ApiError> {
    check_edit_token(&state, &headers)?;
    let html = extract_import_html(&headers, request).await?;
    let summary = state.sites.import_html(&html)?;
    Ok(Json(json!({
        "success": true,
        "imported": summary.imported,
        "skipped": summary.skipped,
    })))
}

/// Pull the bookmark HTML out of the request: a `file` (or `html`) part of a
/// multipart upload, a JSON `{ "html": "..." }` body, or the raw body text.
async fn extract_import_html(headers: &HeaderMap, request: Request) -> Result<String, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|err| ApiError::BadRequest(format!("Invalid multipart payload: {}", err)))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| ApiError::BadRequest(format!("Invalid multipart payload: {}", err)))?
        {
            if matches!(field.name(), Some("file") | Some("html")) {
                return field
                    .text()
                    .await
                    .map_err(|err| ApiError::BadRequest(format!("Unreadable upload: {}", err)));
            }
        }
        return Err(ApiError::BadRequest("No file provided".to_string()));
    }

    let bytes = axum::body::to_bytes(request.into_body(), MAX_IMPORT_BYTES)
        .await
        .map_err(|err| ApiError::BadRequest(format!("Unreadable request body: {}", err)))?;
    let text = String::from_utf8(bytes.to_vec())
        .map_err(|_| ApiError::BadRequest("Import payload is not valid UTF-8".to_string()))?;

    if content_type.starts_with("application/json") {
        #[derive(Deserialize)]
        struct InlineImport {
            html: String,
        }
        let inline: InlineImport = serde_json::from_str(&text)
            .map_err(|err| ApiError::BadRequest(format!("Invalid JSON payload: {}", err)))?;
        return Ok(inline.html);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKvStore;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use tower::ServiceExt;

    fn test_state(edit_token: Option<String>) -> Arc<AppState> {
        Arc::new(AppState {
            sites: SiteStore::new(Box::new(MemoryKvStore::new())),
            edit_token,
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_starts_empty() {
        let app = router(test_state(None));
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/sites")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let state = test_state(None);

        let response = router(state.clone())
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/sites")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"name":"Docs","url":"docs.rs","category":"Dev"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["url"], "https://docs.rs");

        let sites = state.sites.list().unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].category, "Dev");
    }

    #[tokio::test]
    async fn test_import_inline_html_body() {
        let state = test_state(None);
        let html = r#"<DL><DT><A href="https://a.com">A</A><DT><A href="https://b.com">B</A></DL>"#;

        let response = router(state.clone())
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/import")
                    .header("content-type", "text/html")
                    .body(Body::from(html))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["imported"], 2);
        assert_eq!(body["skipped"], 0);
        assert_eq!(state.sites.list().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_import_json_payload() {
        let response = router(test_state(None))
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/import")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"html":"<DL><DT><A href=\"https://a.com\">A</A></DL>"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["imported"], 1);
    }

    #[tokio::test]
    async fn test_import_multipart_file_part() {
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\ncontent-disposition: form-data; name=\"file\"; filename=\"bookmarks.html\"\r\ncontent-type: text/html\r\n\r\n<DL><DT><A href=\"https://a.com\">A</A></DL>\r\n--{b}--\r\n",
            b = boundary
        );
        let response = router(test_state(None))
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/import")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["imported"], 1);
    }

    #[tokio::test]
    async fn test_import_empty_body_rejected() {
        let response = router(test_state(None))
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/import")
                    .header("content-type", "text/html")
                    .body(Body::from("   "))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await.get("error").is_some());
    }

    #[tokio::test]
    async fn test_edit_token_gates_mutations_not_reads() {
        let state = test_state(Some("secret".to_string()));

        let response = router(state.clone())
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/sites")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"A","url":"https://a.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router(state.clone())
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/sites")
                    .header("content-type", "application/json")
                    .header("x-edit-token", "secret")
                    .body(Body::from(r#"{"name":"A","url":"https://a.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router(state)
            .oneshot(
                HttpRequest::builder()
                    .uri("/api/sites")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_404() {
        let response = router(test_state(None))
            .oneshot(
                HttpRequest::builder()
                    .method("PUT")
                    .uri("/api/sites")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"id":"missing","name":"A","url":"https://a.com","category":"","createdAt":"2024-01-01T00:00:00Z"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_by_ids() {
        let state = test_state(None);
        let site = state
            .sites
            .add(NewSite {
                name: "A".into(),
                url: "https://a.com".into(),
                category: String::new(),
            })
            .unwrap();

        let response = router(state.clone())
            .oneshot(
                HttpRequest::builder()
                    .method("DELETE")
                    .uri("/api/sites")
                    .header("content-type", "application/json")
                    .body(Body::from(format!(r#"{{"ids":["{}"]}}"#, site.id)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["success"], true);
        assert!(state.sites.list().unwrap().is_empty());
    }

    #[test]
    fn test_generate_edit_token_shape() {
        let token = generate_edit_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_edit_token());
    }
}
