// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared helpers for the HTTP tests: fake models, image fixtures and a
//! hand-built multipart body.

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use plate_reader_node::{
    api::{create_app, AppState},
    storage::{FileStore, ResultNaming},
    vision::{
        detection::{BoundingBox, Detection, DetectorBackend, PlateDetector, SelectionPolicy},
        ocr::{OcrReading, Readings, TextReader},
    },
    PlateRecognizer,
};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

pub const BOUNDARY: &str = "plate-test-boundary-7MA4YWxkTrZu0gW";

pub const BLUE: Rgb<u8> = Rgb([20, 40, 220]);
pub const WHITE: Rgb<u8> = Rgb([250, 250, 250]);

/// Finds one plate covering the middle half of every image
pub struct CentrePlateDetector;

impl PlateDetector for CentrePlateDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<Detection>> {
        let (w, h) = image.dimensions();
        let (w, h) = (w as f32, h as f32);
        Ok(vec![Detection {
            bbox: BoundingBox::new(w / 4.0, h / 4.0, 3.0 * w / 4.0, 3.0 * h / 4.0),
            confidence: 0.9,
            class_id: 0,
        }])
    }

    fn backend(&self) -> DetectorBackend {
        DetectorBackend::Packaged
    }
}

/// Never finds anything
pub struct EmptyDetector;

impl PlateDetector for EmptyDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<Detection>> {
        Ok(Vec::new())
    }

    fn backend(&self) -> DetectorBackend {
        DetectorBackend::Raw
    }
}

/// "Reads" a plate from the colour at the centre of the crop
pub struct ColourReader;

impl ColourReader {
    pub fn text_for(pixel: Rgb<u8>) -> &'static str {
        if pixel[2] > 150 && pixel[0] < 100 {
            "BLUE001"
        } else {
            "WHITE002"
        }
    }
}

impl TextReader for ColourReader {
    fn read_text<'a>(&'a self, crop: &'a DynamicImage) -> Result<Readings<'a>> {
        let (w, h) = crop.dimensions();
        let centre = crop.to_rgb8().get_pixel(w / 2, h / 2).to_owned();
        Ok(Box::new(std::iter::once(Ok(OcrReading {
            polygon: [[0.0, 0.0], [w as f32, 0.0], [w as f32, h as f32], [0.0, h as f32]],
            text: Self::text_for(centre).to_string(),
            confidence: 0.99,
        }))))
    }

    fn name(&self) -> &'static str {
        "paddleocr"
    }
}

pub fn build_app(
    dir: &Path,
    detector: Arc<dyn PlateDetector>,
    naming: ResultNaming,
    max_upload_bytes: usize,
) -> Router {
    let store = FileStore::new(dir.join("uploads"), dir.join("static"), naming);
    store.ensure_dirs().unwrap();

    let recognizer = PlateRecognizer::new(detector, Arc::new(ColourReader), store, SelectionPolicy::Best);
    create_app(Arc::new(AppState::new(recognizer, max_upload_bytes)))
}

/// Solid-colour PNG
pub fn png_bytes(width: u32, height: u32, colour: Rgb<u8>) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, colour));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

pub enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File {
                name,
                filename,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn upload_file(filename: &str, data: &[u8]) -> Request<Body> {
    upload_request(&[Part::File {
        name: "file",
        filename,
        data,
    }])
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Channel-wise closeness, JPEG output is lossy
pub fn roughly(pixel: &Rgb<u8>, expected: Rgb<u8>) -> bool {
    pixel
        .0
        .iter()
        .zip(expected.0.iter())
        .all(|(a, b)| (*a as i32 - *b as i32).abs() <= 40)
}
