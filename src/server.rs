use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{debug, error, info};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::{config::Config, error::Error, store::LineStore, Indexable};

pub type AppState = Arc<LineStore>;

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/lines/:line_index", get(serve_line))
        .with_state(state)
}

/// Serve `store` until Ctrl-C is pressed
pub async fn run(config: &Config, store: LineStore) -> crate::Result<()> {
    let listener = TcpListener::bind(config.server_addr()).await?;
    info!(
        "Serving '{}' on http://{}",
        store.path().display(),
        listener.local_addr()?
    );

    axum::serve(listener, create_router(Arc::new(store)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[derive(Debug, Serialize)]
pub struct RootInfo {
    pub message: &'static str,
    pub file_being_served: String,
    pub total_lines: usize,
}

pub async fn root(State(store): State<AppState>) -> Json<RootInfo> {
    Json(RootInfo {
        message: "Welcome to the Line Server!",
        file_being_served: store.path().display().to_string(),
        total_lines: store.total_lines(),
    })
}

pub async fn health() -> &'static str {
    "ok"
}

/// Returns line `line_index` of the served file as plain text
pub async fn serve_line(
    State(store): State<AppState>,
    Path(line_index): Path<i64>,
) -> Result<Response, ApiError> {
    debug!("GET /lines/{}", line_index);

    let line = store.get_line(line_index).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], line).into_response())
}

/// Error response body:
/// ```json
/// { "ok": false, "error": { "code": "<code>", "message": "<message>" } }
/// ```
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorResponse {
    pub ok: bool,
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorResponse {
                ok: false,
                error: ApiErrorBody {
                    code: code.into(),
                    message: message.into(),
                },
            },
        }
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::OutOfRange { .. } => {
                Self::new(StatusCode::PAYLOAD_TOO_LARGE, "out_of_range", err.to_string())
            }
            err => {
                error!("Failed to serve line: {}", err);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;

    async fn store() -> AppState {
        Arc::new(LineStore::build("./testfiles/simple").await.unwrap())
    }

    async fn body(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_serve_line() {
        let state = store().await;
        let expected = std::fs::read_to_string("./testfiles/simple").unwrap();

        for (i, line) in expected.lines().enumerate() {
            let response = serve_line(State(Arc::clone(&state)), Path(i as i64))
                .await
                .into_response();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "text/plain; charset=utf-8"
            );
            assert_eq!(body(response).await, line.as_bytes());
        }
    }

    #[tokio::test]
    async fn test_out_of_range() {
        let state = store().await;
        let total = state.total_lines() as i64;

        for line in [-1, total, total + 10] {
            let response = serve_line(State(Arc::clone(&state)), Path(line))
                .await
                .into_response();
            assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

            let body: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
            assert_eq!(body["ok"], false);
            assert_eq!(body["error"]["code"], "out_of_range");
        }
    }

    #[test]
    fn test_io_error_status() {
        let err: ApiError = Error::Io(std::io::ErrorKind::NotFound.into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_root() {
        let state = store().await;
        let Json(info) = root(State(Arc::clone(&state))).await;
        assert_eq!(info.total_lines, state.total_lines());
        assert_eq!(info.file_being_served, "./testfiles/simple");

        assert_eq!(health().await, "ok");
    }

    async fn request(state: &AppState, uri: &str) -> Response {
        create_router(Arc::clone(state))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_router() {
        let state = store().await;
        let content = std::fs::read_to_string("./testfiles/simple").unwrap();
        let first = content.lines().next().unwrap();

        let response = request(&state, "/lines/0").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, first.as_bytes());

        let response = request(&state, "/lines/abc").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        for uri in ["/lines/-1".to_string(), format!("/lines/{}", state.total_lines())] {
            let response = request(&state, &uri).await;
            assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE, "{}", uri);
        }

        let response = request(&state, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let info: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
        assert_eq!(info["total_lines"], state.total_lines());
        assert_eq!(info["file_being_served"], "./testfiles/simple");
        assert_eq!(info["message"], "Welcome to the Line Server!");

        let response = request(&state, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, b"ok");
    }

    #[tokio::test]
    async fn test_router_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truncated");
        std::fs::write(&path, "first\nsecond\nthird\n").unwrap();
        let state = Arc::new(LineStore::build(&path).await.unwrap());

        std::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(6)
            .unwrap();

        let response = request(&state, "/lines/2").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body_json: serde_json::Value = serde_json::from_slice(&body(response).await).unwrap();
        assert_eq!(body_json["error"]["code"], "internal");

        let response = request(&state, "/lines/0").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, b"first");
    }

    #[tokio::test]
    async fn test_router_unchecked_bytes() {
        // Lines are sent as they are stored, even if they aren't valid utf-8
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary");
        std::fs::write(&path, b"\xff\xfe\nok\n").unwrap();
        let state = Arc::new(LineStore::build(&path).await.unwrap());

        let response = request(&state, "/lines/0").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, vec![0xffu8, 0xfe]);
    }
}
