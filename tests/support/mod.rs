#![allow(dead_code)]

use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use upload_analyzer::{analyzer::ContentAnalyzer, errors::AnalysisError, payload::Payload};

/// Records every call and answers with a canned result.
pub struct RecordingAnalyzer {
    reply: Result<String, String>,
    calls: Mutex<Vec<(String, Payload)>>,
}

impl RecordingAnalyzer {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Payload)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentAnalyzer for RecordingAnalyzer {
    async fn analyze(&self, prompt: &str, payload: &Payload) -> Result<String, AnalysisError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), payload.clone()));
        self.reply.clone().map_err(AnalysisError::Downstream)
    }
}

pub fn encoded_image(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let image = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 7) as u8, (y * 11) as u8, 64])
    });
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut std::io::Cursor::new(&mut output), format)
        .unwrap();
    output
}

pub const BOUNDARY: &str = "upload-analyzer-test-boundary";

pub fn multipart_body(field: &str, file_name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    let disposition =
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n");
    body.extend_from_slice(disposition.as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Sleeps inside every call and remembers the highest number of overlapping calls.
pub struct SlowAnalyzer {
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl SlowAnalyzer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentAnalyzer for SlowAnalyzer {
    async fn analyze(&self, _prompt: &str, _payload: &Payload) -> Result<String, AnalysisError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("done".to_string())
    }
}

/// Serves `router` on an ephemeral local port and returns a Gemini-style base URL.
pub async fn spawn_model_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/v1beta")
}
