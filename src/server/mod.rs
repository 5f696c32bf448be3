//! REST API over the verification pipeline.
//!
//! - `POST /predict` takes a multipart upload and returns the combined result
//! - `GET /health` reports liveness and model availability

mod handlers;
mod routes;

pub use handlers::ServerError;
pub use routes::create_router;

use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::pipeline::FraudEngine;
use crate::storage::OutputDir;
use crate::vision::models::ModelStatus;

/// Subdirectory of the output directory receiving API uploads
pub const UPLOAD_SUBDIR: &str = "api_uploads";

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    /// One engine for the whole process; predictions run one at a time
    pub engine: Arc<Mutex<FraudEngine>>,
    pub outputs: OutputDir,
    /// Model status captured at startup
    pub models: Arc<Vec<ModelStatus>>,
}

impl AppState {
    pub fn new(engine: FraudEngine, models: Vec<ModelStatus>) -> Self {
        let outputs = engine.outputs().clone();
        Self {
            engine: Arc::new(Mutex::new(engine)),
            outputs,
            models: Arc::new(models),
        }
    }
}

/// Start the web server.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{card_region, fake_engine};
    use crate::vision::ClassScores;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    const BOUNDARY: &str = "shield-test-boundary";

    fn setup_test_app(regions: bool) -> (axum::Router, TempDir) {
        let dir = tempdir().unwrap();
        let regions = if regions {
            vec![card_region(2.0, 2.0, 12.0, 10.0)]
        } else {
            vec![]
        };
        let engine = fake_engine(
            &dir.path().join("outputs"),
            regions,
            ClassScores {
                fake: 0.2,
                real: 0.8,
            },
            "Ravi Singh\n10/10/1999\n9999 8888 7777",
        );
        let app = create_router(AppState::new(engine, vec![]));
        (app, dir)
    }

    fn png_bytes() -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        RgbImage::from_pixel(16, 16, Rgb([200, 200, 200]))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn multipart_request(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_predict_returns_combined_result() {
        let (app, dir) = setup_test_app(true);

        let response = app
            .oneshot(multipart_request("file", "card.PNG", &png_bytes()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["fraud"]["label"], "REAL");
        assert_eq!(json["ocr"]["Name"], "Ravi Singh");
        assert_eq!(json["ocr"]["AadhaarNumber"], "9999 8888 7777");

        let image_path = json["image_path"].as_str().unwrap();
        assert!(image_path.ends_with(".png"));
        assert!(image_path.contains(UPLOAD_SUBDIR));
        assert!(std::path::Path::new(image_path).exists());

        let crop_path = json["crop_path"].as_str().unwrap();
        assert!(crop_path.starts_with(dir.path().join("outputs").to_str().unwrap()));
        assert!(crop_path.contains("cropped_"));
    }

    #[tokio::test]
    async fn test_predict_without_region_echoes_path() {
        let (app, _dir) = setup_test_app(false);

        let response = app
            .oneshot(multipart_request("file", "scan.jpg", &png_bytes()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["image_path"], json["crop_path"]);
        assert!(json["region"].is_null());
    }

    #[tokio::test]
    async fn test_predict_missing_file_field() {
        let (app, _dir) = setup_test_app(false);

        let response = app
            .oneshot(multipart_request("document", "card.png", &png_bytes()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("file"));
    }

    #[tokio::test]
    async fn test_predict_undecodable_image() {
        let (app, _dir) = setup_test_app(false);

        let response = app
            .oneshot(multipart_request("file", "card.jpg", b"not an image"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = json_body(response).await;
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = setup_test_app(false);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["models"].is_array());
    }
}
