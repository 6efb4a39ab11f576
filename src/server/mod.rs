//! HTTP front end: upload form, upload endpoint and result downloads.

pub mod handlers;
pub mod render;

use crate::config::Config;
use crate::error::{FollowbackError, Result};
use crate::pipeline::Pipeline;
use crate::results::RESULTS_ROUTE;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared across handlers. The pipeline keeps no per-request state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit =
        usize::try_from(state.pipeline.archive_config().max_upload_bytes).unwrap_or(usize::MAX);
    let results = ServeDir::new(state.pipeline.results_dir());

    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/health", get(handlers::health))
        .nest_service(RESULTS_ROUTE, results)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM, letting
/// in-flight uploads finish.
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.socket_addr()?;
    let state = AppState::new(Pipeline::new(config)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| FollowbackError::Server {
            message: format!("cannot bind {}: {}", addr, e),
        })?;

    info!(
        %addr,
        uploads = %config.storage.uploads_dir.display(),
        results = %config.storage.results_dir.display(),
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| FollowbackError::Server {
            message: e.to_string(),
        })?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining in-flight requests");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_export_zip;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "followback-test-boundary";

    struct TestServer {
        root: TempDir,
        config: Config,
    }

    impl TestServer {
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            let mut config = Config::default();
            config.storage.uploads_dir = root.path().join("uploads");
            config.storage.results_dir = root.path().join("results");
            Self { root, config }
        }

        fn router(&self) -> Router {
            build_router(AppState::new(Pipeline::new(&self.config).unwrap()))
        }

        fn uploads_entries(&self) -> usize {
            std::fs::read_dir(&self.config.storage.uploads_dir)
                .unwrap()
                .count()
        }

        fn results_entries(&self) -> usize {
            std::fs::read_dir(&self.config.storage.results_dir)
                .unwrap()
                .count()
        }

        fn export(&self, following: &[&str], followers: &[&str]) -> Vec<u8> {
            let path = self.root.path().join("fixture.zip");
            write_export_zip(&path, following, followers);
            std::fs::read(path).unwrap()
        }
    }

    fn multipart_request(file_name: Option<&str>, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\n"),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let server = TestServer::new();
        let response = server
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    #[tokio::test]
    async fn test_index_serves_form() {
        let server = TestServer::new();
        let response = server
            .router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("multipart/form-data"));
    }

    #[tokio::test]
    async fn test_upload_lists_accounts_and_serves_download() {
        let server = TestServer::new();
        let archive = server.export(&["alice", "bob", "carol"], &["bob"]);
        let router = server.router();

        let response = router
            .clone()
            .oneshot(multipart_request(Some("export.zip"), &archive))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("@alice"));
        assert!(html.contains("@carol"));
        assert!(!html.contains("@bob"));
        assert_eq!(server.uploads_entries(), 0);
        assert_eq!(server.results_entries(), 1);

        let start = html.find("/results/").unwrap();
        let end = start + html[start..].find('"').unwrap();
        let url = &html[start..end];

        let download = router
            .oneshot(Request::get(url).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(download.status(), StatusCode::OK);
        assert_eq!(body_text(download).await, "@alice\n@carol");
    }

    #[tokio::test]
    async fn test_upload_where_everyone_follows_back() {
        let server = TestServer::new();
        let archive = server.export(&["x"], &["x"]);

        let response = server
            .router()
            .oneshot(multipart_request(Some("export.zip"), &archive))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("All good"));
        assert_eq!(server.results_entries(), 0);
        assert_eq!(server.uploads_entries(), 0);
    }

    #[tokio::test]
    async fn test_wrong_extension_is_bad_request() {
        let server = TestServer::new();
        let archive = server.export(&["alice"], &[]);

        let response = server
            .router()
            .oneshot(multipart_request(Some("export.rar"), &archive))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Upload rejected"));
        assert_eq!(server.uploads_entries(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_bad_request() {
        let server = TestServer::new();

        let response = server
            .router()
            .oneshot(multipart_request(None, b"just a note"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(server.uploads_entries(), 0);
    }

    #[tokio::test]
    async fn test_archive_without_export_is_server_error() {
        let server = TestServer::new();
        let path = server.root.path().join("other.zip");
        crate::test_support::build_zip(
            &path,
            &[("notes/readme.txt".to_string(), "hello".to_string())],
        );
        let archive = std::fs::read(&path).unwrap();

        let response = server
            .router()
            .oneshot(multipart_request(Some("other.zip"), &archive))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = body_text(response).await;
        assert!(html.contains("We could not process your file"));
        assert!(!html.contains("following.html"));
        assert_eq!(server.uploads_entries(), 0);
        assert_eq!(server.results_entries(), 0);
    }

    #[tokio::test]
    async fn test_unwritable_results_dir_is_server_error() {
        let server = TestServer::new();
        let archive = server.export(&["alice"], &[]);
        let router = server.router();

        let results_dir = &server.config.storage.results_dir;
        std::fs::remove_dir(results_dir).unwrap();
        std::fs::write(results_dir, b"not a directory").unwrap();

        let response = router
            .oneshot(multipart_request(Some("export.zip"), &archive))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = body_text(response).await;
        assert!(html.contains("We could not process your file"));
        assert!(!html.contains("@alice"));
        assert_eq!(server.uploads_entries(), 0);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let mut server = TestServer::new();
        server.config.archive.max_upload_bytes = 64;
        server.config.archive.max_unpacked_bytes = 64;
        let archive = server.export(&["alice"], &[]);

        let response = server
            .router()
            .oneshot(multipart_request(Some("export.zip"), &archive))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(server.uploads_entries(), 0);
    }
}
