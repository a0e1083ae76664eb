// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Upload endpoint tests for POST /upload
//!
//! These tests verify that the upload handler:
//! - Rejects requests without a usable `file` part with 400
//! - Rejects malformed multipart bodies with 400
//! - Reports "Plate not detected" when the detector finds nothing
//! - Returns the plate text and a fetchable annotated image
//! - Keeps each request's result separate in both naming modes
//! - Fails with 500 on bytes that are not an image

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use image::GenericImageView;
use plate_reader_node::{storage::ResultNaming, vision::image_utils::MAX_IMAGE_SIZE};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

use super::common::*;

#[cfg(test)]
mod upload_handler_tests {
    use super::*;

    // =============================================================================
    // Client errors
    // =============================================================================

    /// Test 1: Multipart body without a `file` part
    #[tokio::test]
    async fn test_missing_file_field_returns_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(dir.path(), Arc::new(CentrePlateDetector), ResultNaming::Unique, MAX_IMAGE_SIZE);

        let response = app
            .oneshot(upload_request(&[Part::Text {
                name: "note",
                value: "no image here",
            }]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "No file uploaded");
    }

    /// Test 2: Request that is not multipart at all
    #[tokio::test]
    async fn test_non_multipart_request_returns_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(dir.path(), Arc::new(CentrePlateDetector), ResultNaming::Unique, MAX_IMAGE_SIZE);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await.get("error").is_some());
    }

    /// Test 3: File part with an empty filename
    #[tokio::test]
    async fn test_empty_filename_returns_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(dir.path(), Arc::new(CentrePlateDetector), ResultNaming::Unique, MAX_IMAGE_SIZE);

        let png = png_bytes(16, 16, BLUE);
        let response = app.oneshot(upload_file("", &png)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Empty filename");
    }

    /// Test 4: Body larger than the configured limit
    #[tokio::test]
    async fn test_oversized_upload_returns_413() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(dir.path(), Arc::new(CentrePlateDetector), ResultNaming::Unique, 1024);

        let big = vec![0xAB_u8; 8 * 1024];
        let response = app.oneshot(upload_file("big.png", &big)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    /// Test 5: File part cut off before the closing boundary
    #[tokio::test]
    async fn test_truncated_multipart_returns_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(dir.path(), Arc::new(CentrePlateDetector), ResultNaming::Unique, MAX_IMAGE_SIZE);

        let mut body = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"car.png\"\r\n\
             Content-Type: image/png\r\n\r\n",
            BOUNDARY
        )
        .into_bytes();
        body.extend_from_slice(&png_bytes(16, 16, BLUE));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Malformed multipart request"));
        assert!(!dir.path().join("uploads/car.png").exists());
    }

    // =============================================================================
    // Recognition results
    // =============================================================================

    /// Test 6: Nothing detected still succeeds with the sentinel text
    #[tokio::test]
    async fn test_no_plate_returns_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(dir.path(), Arc::new(EmptyDetector), ResultNaming::Unique, MAX_IMAGE_SIZE);

        let png = png_bytes(64, 32, WHITE);
        let response = app.oneshot(upload_file("empty_road.png", &png)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["text"], "Plate not detected");
        assert!(json["image_url"].as_str().unwrap().starts_with("/static/result-"));
    }

    /// Test 7: Plate text and annotated image are returned
    #[tokio::test]
    async fn test_plate_text_and_fetchable_image() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(dir.path(), Arc::new(CentrePlateDetector), ResultNaming::Unique, MAX_IMAGE_SIZE);

        let png = png_bytes(160, 80, BLUE);
        let response = app
            .clone()
            .oneshot(upload_file("car.png", &png))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["text"], "BLUE001");

        // Upload kept under its own name
        assert!(dir.path().join("uploads/car.png").exists());

        let image_url = json["image_url"].as_str().unwrap().to_string();
        let response = app.oneshot(get(&image_url)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = body_bytes(response).await;
        let annotated = image::load_from_memory(&bytes).unwrap();
        assert_eq!(annotated.dimensions(), (160, 80));

        let rgb = annotated.to_rgb8();
        // Selected box outline on the left edge of the plate (x = 40)
        let outline = rgb.get_pixel(41, 40);
        assert!(outline[0] > 120 && outline[0] > outline[2]);
        // Untouched background
        assert!(roughly(rgb.get_pixel(80, 40), BLUE));
    }

    /// Test 8: Path components in the client filename are stripped
    #[tokio::test]
    async fn test_filename_path_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(dir.path(), Arc::new(CentrePlateDetector), ResultNaming::Unique, MAX_IMAGE_SIZE);

        let png = png_bytes(32, 32, WHITE);
        let response = app
            .oneshot(upload_file("../../escape.png", &png))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(dir.path().join("uploads/escape.png").exists());
        assert!(!dir.path().join("escape.png").exists());
    }

    /// Test 9: Fixed naming, second upload replaces the first result
    #[tokio::test]
    async fn test_sequential_uploads_fixed_naming() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(dir.path(), Arc::new(CentrePlateDetector), ResultNaming::Fixed, MAX_IMAGE_SIZE);

        let first = app
            .clone()
            .oneshot(upload_file("blue.png", &png_bytes(160, 80, BLUE)))
            .await
            .unwrap();
        let first = body_json(first).await;
        assert_eq!(first["text"], "BLUE001");
        assert_eq!(first["image_url"], "/static/result.jpg");

        let rgb = image::load_from_memory(&body_bytes(app.clone().oneshot(get("/static/result.jpg")).await.unwrap()).await)
            .unwrap()
            .to_rgb8();
        assert!(roughly(rgb.get_pixel(80, 40), BLUE));

        let second = app
            .clone()
            .oneshot(upload_file("white.png", &png_bytes(160, 80, WHITE)))
            .await
            .unwrap();
        let second = body_json(second).await;
        assert_eq!(second["text"], "WHITE002");
        assert_eq!(second["image_url"], "/static/result.jpg");

        let rgb = image::load_from_memory(&body_bytes(app.oneshot(get("/static/result.jpg")).await.unwrap()).await)
            .unwrap()
            .to_rgb8();
        assert!(roughly(rgb.get_pixel(80, 40), WHITE));
    }

    /// Test 10: Unique naming, each upload keeps its own result
    #[tokio::test]
    async fn test_sequential_uploads_unique_naming() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(dir.path(), Arc::new(CentrePlateDetector), ResultNaming::Unique, MAX_IMAGE_SIZE);

        let mut urls = Vec::new();
        for (name, colour) in [("blue.png", BLUE), ("white.png", WHITE)] {
            let response = app
                .clone()
                .oneshot(upload_file(name, &png_bytes(160, 80, colour)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let json = body_json(response).await;
            urls.push((json["image_url"].as_str().unwrap().to_string(), colour));
        }
        assert_ne!(urls[0].0, urls[1].0);

        for (url, colour) in urls {
            let response = app.clone().oneshot(get(&url)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let rgb = image::load_from_memory(&body_bytes(response).await)
                .unwrap()
                .to_rgb8();
            assert!(roughly(rgb.get_pixel(80, 40), colour));
        }
    }

    // =============================================================================
    // Server errors
    // =============================================================================

    /// Test 11: Bytes that are not an image
    #[tokio::test]
    async fn test_corrupt_image_returns_500() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(dir.path(), Arc::new(CentrePlateDetector), ResultNaming::Unique, MAX_IMAGE_SIZE);

        let response = app
            .oneshot(upload_file("broken.jpg", b"\xFF\xD8\xFF\xE0 definitely not a jpeg"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("Failed to load image"));
    }
}
