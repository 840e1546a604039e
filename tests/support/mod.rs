#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
    Router,
};
use docqa::{
    embedding::{EmbeddingClient, EmbeddingTask},
    generation::{GenerationClient, GenerationRequest},
    provider::{ModelConnector, ProviderError},
};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "docqa-integration-boundary";
const DIMENSION: usize = 16;

/// Three pages of lorem ipsum, each comfortably under one chunk.
pub fn lorem_pages() -> Vec<Vec<String>> {
    vec![
        vec![
            "Lorem ipsum dolor sit amet, consectetur adipiscing elit.".into(),
            "Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.".into(),
        ],
        vec![
            "Ut enim ad minim veniam, quis nostrud exercitation ullamco.".into(),
            "Laboris nisi ut aliquip ex ea commodo consequat.".into(),
        ],
        vec![
            "Duis aute irure dolor in reprehenderit in voluptate velit esse.".into(),
            "Cillum dolore eu fugiat nulla pariatur (excepteur sint).".into(),
        ],
    ]
}

/// Build a minimal PDF with one Helvetica text line per entry on each page.
pub fn pdf_with_pages(pages: &[Vec<String>]) -> Vec<u8> {
    let kids = (0..pages.len())
        .map(|page| format!("{} 0 R", 4 + 2 * page))
        .collect::<Vec<_>>()
        .join(" ");
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];
    for (page, lines) in pages.iter().enumerate() {
        let contents = 5 + 2 * page;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 3 0 R >> >> /Contents {contents} 0 R >>"
        ));
        let mut stream = String::from("BT\n/F1 12 Tf\n72 720 Td\n");
        for (position, line) in lines.iter().enumerate() {
            if position > 0 {
                stream.push_str("0 -14 Td\n");
            }
            stream.push_str(&format!("({}) Tj\n", escape(line)));
        }
        stream.push_str("ET");
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}\nendstream",
            stream.len()
        ));
    }

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{object}\nendobj\n", index + 1).as_bytes());
    }
    let xref_offset = pdf.len();
    let size = objects.len() + 1;
    let mut tail = format!("xref\n0 {size}\n0000000000 65535 f \n");
    for offset in offsets {
        tail.push_str(&format!("{offset:010} 00000 n \n"));
    }
    tail.push_str(&format!(
        "trailer\n<< /Size {size} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
    ));
    pdf.extend_from_slice(tail.as_bytes());
    pdf
}

fn escape(line: &str) -> String {
    line.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Bag-of-words embedder: each word bumps one of a handful of dimensions.
pub struct HashingEmbedder;

pub fn embed_text(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; DIMENSION];
    for word in text.split_whitespace() {
        let bucket = word
            .to_lowercase()
            .bytes()
            .fold(0usize, |acc, byte| acc.wrapping_mul(31).wrapping_add(byte as usize));
        vector[bucket % DIMENSION] += 1.0;
    }
    vector[0] += 0.01;
    vector
}

#[async_trait]
impl EmbeddingClient for HashingEmbedder {
    async fn embed(
        &self,
        texts: Vec<String>,
        _task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        Ok(texts.iter().map(|text| embed_text(text)).collect())
    }
}

/// Generator that reports how much context it was given.
pub struct EchoGenerator;

#[async_trait]
impl GenerationClient for EchoGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, ProviderError> {
        let lorem = request.prompt.contains("Lorem") || request.prompt.contains("dolor");
        Ok(format!(
            "This document is placeholder text (lorem ipsum: {lorem})."
        ))
    }
}

/// Connector returning the in-process embedder and generator.
pub struct LocalConnector;

#[async_trait]
impl ModelConnector for LocalConnector {
    fn embedding_client(&self, _api_key: &str) -> Arc<dyn EmbeddingClient> {
        Arc::new(HashingEmbedder)
    }

    fn generation_client(&self, _api_key: &str) -> Arc<dyn GenerationClient> {
        Arc::new(EchoGenerator)
    }

    fn generation_model(&self) -> &str {
        "models/local"
    }

    async fn list_models(&self, _api_key: &str) -> Result<Vec<String>, ProviderError> {
        Ok(vec!["models/local".into()])
    }
}

pub fn json_request(uri: &str, body: Value, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(session) = session {
        builder = builder.header("x-session-id", session);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn upload_request(filename: &str, contents: &[u8], session: Option<&str>) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(session) = session {
        builder = builder.header("x-session-id", session);
    }
    builder.body(Body::from(body)).expect("request")
}

pub fn get_request(uri: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(session) = session {
        builder = builder.header("x-session-id", session);
    }
    builder.body(Body::empty()).expect("request")
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}
