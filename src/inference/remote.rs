//! Hosted detector reached over HTTP.
//!
//! Speaks the Roboflow-style protocol: the image is POSTed as a base64 body
//! to `{endpoint}/{model_id}?api_key=...` and the service answers with
//! `{"predictions": [{"x", "y", "width", "height", "confidence", "class"}], "image": {...}}`.

use crate::config::{BoxFormat, ConfidenceScale, RemoteBackendConfig, resolve_api_key};
use crate::constants::remote::{CONNECT_TIMEOUT_SECS, TIMEOUT_GRACE_SECS};
use crate::error::{Error, Result};
use crate::inference::Detector;
use crate::inference::normalize::{normalize_box, normalize_confidence};
use crate::inference::types::{RawDetection, Vocabulary};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Longest slice of an error body included in a detection error.
const ERROR_BODY_PREVIEW: usize = 200;

/// Detector backed by a hosted inference service.
pub struct RemoteDetector {
    name: String,
    client: Client,
    runtime: tokio::runtime::Runtime,
    url: Url,
    timeout: Duration,
    bbox_format: BoxFormat,
    confidence_scale: ConfidenceScale,
}

impl RemoteDetector {
    /// Build a client for a remote backend.
    pub fn from_config(name: &str, config: &RemoteBackendConfig) -> Result<Self> {
        let api_key =
            resolve_api_key(config.api_key.as_deref()).ok_or_else(|| Error::MissingApiKey {
                backend: name.to_string(),
            })?;
        let url = request_url(&config.endpoint, &config.model_id, &api_key).map_err(|e| {
            Error::DetectorBuild {
                backend: name.to_string(),
                reason: format!("invalid endpoint '{}': {e}", config.endpoint),
            }
        })?;

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::DetectorBuild {
                backend: name.to_string(),
                reason: e.to_string(),
            })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::DetectorBuild {
                backend: name.to_string(),
                reason: format!("failed to create async runtime: {e}"),
            })?;

        Ok(Self {
            name: name.to_string(),
            client,
            runtime,
            url,
            timeout,
            bbox_format: config.bbox_format,
            confidence_scale: config.confidence_scale,
        })
    }

    fn post_image(&self, image_path: &Path, body: String) -> std::result::Result<String, String> {
        let request = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        let guard = self.timeout + Duration::from_secs(TIMEOUT_GRACE_SECS);

        let exchange = self.runtime.block_on(async {
            tokio::time::timeout(guard, async {
                let response = request.send().await?;
                let status = response.status();
                let text = response.text().await?;
                Ok::<(StatusCode, String), reqwest::Error>((status, text))
            })
            .await
        });

        match exchange {
            Err(_) => Err(format!("request timed out after {}s", guard.as_secs())),
            Ok(Err(e)) if e.is_timeout() => Err(format!(
                "request timed out after {}s",
                self.timeout.as_secs()
            )),
            Ok(Err(e)) => Err(format!("request failed: {e}")),
            Ok(Ok((status, text))) if !status.is_success() => {
                debug!("{} answered HTTP {status} for {}", self.name, image_path.display());
                Err(format!("HTTP {status}: {}", preview(&text)))
            }
            Ok(Ok((_, text))) => Ok(text),
        }
    }
}

impl Detector for RemoteDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn vocabulary(&self) -> Option<&Vocabulary> {
        None
    }

    fn detect(&mut self, image_path: &Path) -> Result<Vec<RawDetection>> {
        let detection_error = |reason: String| Error::Detection {
            path: image_path.to_path_buf(),
            reason,
        };

        let bytes = std::fs::read(image_path).map_err(|e| detection_error(e.to_string()))?;
        let text = self
            .post_image(image_path, BASE64.encode(&bytes))
            .map_err(detection_error)?;
        let response = parse_response(&text).map_err(detection_error)?;

        let (width, height) = match response.image {
            Some(ImageInfo { width, height }) if width > 0 && height > 0 => (width, height),
            _ => image::image_dimensions(image_path)
                .map_err(|e| detection_error(format!("cannot read image size: {e}")))?,
        };

        to_raw_detections(
            &response.predictions,
            self.bbox_format,
            self.confidence_scale,
            width,
            height,
        )
        .map_err(detection_error)
    }
}

/// Response body of the inference service.
#[derive(Debug, Deserialize)]
pub struct RemoteResponse {
    /// Detections, in service order.
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    /// Size of the analyzed image, when reported.
    #[serde(default)]
    pub image: Option<ImageInfo>,
}

/// A single prediction of the service.
#[derive(Debug, Deserialize)]
pub struct Prediction {
    /// First box value (center x for Roboflow).
    pub x: f32,
    /// Second box value.
    pub y: f32,
    /// Third box value.
    pub width: f32,
    /// Fourth box value.
    pub height: f32,
    /// Reported confidence, in the backend's scale.
    pub confidence: f32,
    /// Class label.
    pub class: String,
}

/// Image size echoed by the service.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ImageInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Parse a service response body.
pub fn parse_response(text: &str) -> std::result::Result<RemoteResponse, String> {
    serde_json::from_str(text).map_err(|e| format!("malformed response: {e}"))
}

/// Normalize predictions into canonical detections.
///
/// A single invalid confidence rejects the whole response.
pub fn to_raw_detections(
    predictions: &[Prediction],
    bbox_format: BoxFormat,
    confidence_scale: ConfidenceScale,
    image_width: u32,
    image_height: u32,
) -> std::result::Result<Vec<RawDetection>, String> {
    predictions
        .iter()
        .map(|p| {
            let confidence = normalize_confidence(p.confidence, confidence_scale)?;
            let bbox = normalize_box(
                [p.x, p.y, p.width, p.height],
                bbox_format,
                image_width,
                image_height,
            );
            Ok(RawDetection::new(p.class.clone(), confidence, bbox))
        })
        .collect()
}

fn request_url(endpoint: &str, model_id: &str, api_key: &str) -> std::result::Result<Url, String> {
    let base = format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        model_id.trim_matches('/')
    );
    Url::parse_with_params(&base, &[("api_key", api_key)]).map_err(|e| e.to_string())
}

fn preview(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(ERROR_BODY_PREVIEW) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::inference::BoundingBox;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    const SAMPLE: &str = r#"{
        "time": 0.12,
        "image": {"width": 1000, "height": 800},
        "predictions": [
            {"x": 100, "y": 100, "width": 40, "height": 60, "confidence": 0.91, "class": "deer"},
            {"x": 500, "y": 300, "width": 200, "height": 100, "confidence": 0.42, "class": "fox"}
        ]
    }"#;

    /// Serve one canned HTTP response on a local port, returning the endpoint.
    fn serve_once(status: &'static str, body: &'static str, delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            let mut request_body = vec![0; content_length];
            reader.read_exact(&mut request_body).unwrap();

            thread::sleep(delay);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = stream;
            let _ = stream.write_all(response.as_bytes());
        });

        format!("http://{addr}")
    }

    fn config(endpoint: String, timeout_secs: u64) -> RemoteBackendConfig {
        RemoteBackendConfig {
            endpoint,
            model_id: "trailcam/3".to_string(),
            api_key: Some("secret".to_string()),
            timeout_secs,
            bbox_format: BoxFormat::Center,
            confidence_scale: ConfidenceScale::Auto,
        }
    }

    fn sample_image() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        image::RgbImage::new(8, 8)
            .save(dir.path().join("IMG_0001.jpg"))
            .unwrap();
        dir
    }

    #[test]
    fn test_parse_and_normalize_sample() {
        let response = parse_response(SAMPLE).unwrap();
        let image = response.image.unwrap();
        let detections = to_raw_detections(
            &response.predictions,
            BoxFormat::Auto,
            ConfidenceScale::Auto,
            image.width,
            image.height,
        )
        .unwrap();

        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].label, "deer");
        assert_eq!(detections[0].bbox, BoundingBox::new(80.0, 70.0, 120.0, 130.0));
        assert_eq!(detections[1].bbox, BoundingBox::new(400.0, 250.0, 600.0, 350.0));
    }

    #[test]
    fn test_percent_confidences_are_scaled() {
        let response =
            parse_response(r#"{"predictions": [{"x": 1, "y": 1, "width": 1, "height": 1, "confidence": 87, "class": "bear"}]}"#)
                .unwrap();
        let detections = to_raw_detections(
            &response.predictions,
            BoxFormat::Center,
            ConfidenceScale::Auto,
            100,
            100,
        )
        .unwrap();
        assert!((detections[0].confidence - 0.87).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_confidence_rejects_response() {
        let response =
            parse_response(r#"{"predictions": [{"x": 1, "y": 1, "width": 1, "height": 1, "confidence": 250, "class": "bear"}]}"#)
                .unwrap();
        let result = to_raw_detections(
            &response.predictions,
            BoxFormat::Center,
            ConfidenceScale::Auto,
            100,
            100,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_response_is_error() {
        assert!(parse_response("<html>Bad Gateway</html>").is_err());
        assert!(parse_response(r#"{"predictions": [{"x": 1}]}"#).is_err());
    }

    #[test]
    fn test_request_url_includes_model_and_key() {
        let url = request_url("https://detect.example.com/", "/trailcam/3", "k&y").unwrap();
        assert_eq!(
            url.as_str(),
            "https://detect.example.com/trailcam/3?api_key=k%26y"
        );
    }

    #[test]
    fn test_missing_api_key_is_error() {
        let mut cfg = config("https://detect.example.com".to_string(), 30);
        cfg.api_key = Some("  ".to_string());
        if std::env::var(crate::constants::remote::API_KEY_ENV).is_err() {
            assert!(matches!(
                RemoteDetector::from_config("remote", &cfg),
                Err(Error::MissingApiKey { .. })
            ));
        }
    }

    #[test]
    fn test_detect_against_local_server() {
        let endpoint = serve_once("200 OK", SAMPLE, Duration::ZERO);
        let dir = sample_image();

        let mut detector = RemoteDetector::from_config("remote", &config(endpoint, 5)).unwrap();
        let detections = detector.detect(&dir.path().join("IMG_0001.jpg")).unwrap();

        assert!(detector.vocabulary().is_none());
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[1].label, "fox");
    }

    #[test]
    fn test_detect_http_error_is_detection_error() {
        let endpoint = serve_once("500 Internal Server Error", "model unavailable", Duration::ZERO);
        let dir = sample_image();

        let mut detector = RemoteDetector::from_config("remote", &config(endpoint, 5)).unwrap();
        let err = detector
            .detect(&dir.path().join("IMG_0001.jpg"))
            .unwrap_err();

        assert!(matches!(err, Error::Detection { .. }));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_detect_times_out() {
        let endpoint = serve_once("200 OK", SAMPLE, Duration::from_secs(4));
        let dir = sample_image();

        let mut detector = RemoteDetector::from_config("remote", &config(endpoint, 1)).unwrap();
        let err = detector
            .detect(&dir.path().join("IMG_0001.jpg"))
            .unwrap_err();

        assert!(err.to_string().contains("timed out"));
    }
}
