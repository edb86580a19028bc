//! Plant-health inference client.
//!
//! Uploads a JPEG to `<server_url>/predict` as `multipart/form-data` with a
//! single part named `image`, and reads back `{"result": "<label>"}`.
//! A 400 carries `{"error": "<message>"}` (e.g. no image in the request).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection`, with the ESP-IDF
//!   certificate bundle attached for `https://` endpoints.
//! - **all other targets**: scripted responses for host tests.

use core::fmt::Write as _;

use log::{debug, warn};
use serde::Deserialize;

use crate::app::ports::InferencePort;
use crate::app::status::PlantHealth;
use crate::error::CommsError;

pub const PREDICT_PATH: &str = "/predict";
pub const BOUNDARY: &str = "----AquaponicsBoundary7MA4YWxkTrZu0gW";
pub const CONTENT_TYPE: &str =
    "multipart/form-data; boundary=----AquaponicsBoundary7MA4YWxkTrZu0gW";
pub const FORM_FIELD: &str = "image";
pub const FILENAME: &str = "capture.jpg";

/// Largest response body read back; the server's JSON is tiny.
pub const MAX_RESPONSE: usize = 512;

/// Wire-format request and response handling, independent of transport.
pub mod wire {
    use super::*;

    /// Full request body around `jpeg`.
    pub fn multipart_body(jpeg: &[u8]) -> Vec<u8> {
        let mut head = String::with_capacity(160);
        let _ = write!(
            head,
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{FORM_FIELD}\"; \
             filename=\"{FILENAME}\"\r\nContent-Type: image/jpeg\r\n\r\n"
        );
        let tail = format!("\r\n--{BOUNDARY}--\r\n");

        let mut body = Vec::with_capacity(head.len() + jpeg.len() + tail.len());
        body.extend_from_slice(head.as_bytes());
        body.extend_from_slice(jpeg);
        body.extend_from_slice(tail.as_bytes());
        body
    }

    #[derive(Deserialize)]
    struct Prediction {
        result: String,
    }

    #[derive(Deserialize)]
    struct ServerError {
        error: String,
    }

    /// Map an HTTP status and body to a classification.
    pub fn parse_response(status: u16, body: &[u8]) -> Result<PlantHealth, CommsError> {
        if !(200..300).contains(&status) {
            match serde_json::from_slice::<ServerError>(body) {
                Ok(e) => warn!("Inference server {}: {}", status, e.error),
                Err(_) => warn!("Inference server returned HTTP {}", status),
            }
            return Err(CommsError::HttpStatus(status));
        }
        let p: Prediction =
            serde_json::from_slice(body).map_err(|_| CommsError::InvalidResponse)?;
        let health = PlantHealth::from_label(&p.result);
        if health == PlantHealth::Unknown {
            debug!("Unrecognised label '{}'", p.result);
        }
        Ok(health)
    }

    /// Response body, cut at [`MAX_RESPONSE`] bytes.
    #[derive(Debug, PartialEq, Eq)]
    pub struct Body {
        pub bytes: Vec<u8>,
        /// The server sent more than [`MAX_RESPONSE`] bytes.
        pub truncated: bool,
    }

    /// Drain a response through `read`, which returns 0 at end of body.
    /// Anything past [`MAX_RESPONSE`] is read and discarded.
    pub fn read_body<E>(mut read: impl FnMut(&mut [u8]) -> Result<usize, E>) -> Result<Body, E> {
        let mut bytes = vec![0u8; MAX_RESPONSE];
        let mut n = 0;
        while n < MAX_RESPONSE {
            let got = read(&mut bytes[n..])?;
            if got == 0 {
                bytes.truncate(n);
                return Ok(Body { bytes, truncated: false });
            }
            n += got;
        }
        let mut scratch = [0u8; 64];
        let mut truncated = false;
        while read(&mut scratch)? != 0 {
            truncated = true;
        }
        Ok(Body { bytes, truncated })
    }

    /// Classify a complete exchange. The status wins over an oversized body.
    pub fn classify_response(status: u16, body: &Body) -> Result<PlantHealth, CommsError> {
        if body.truncated && (200..300).contains(&status) {
            return Err(CommsError::PayloadTooLarge);
        }
        parse_response(status, &body.bytes)
    }
}

pub struct InferenceClient {
    url: String,
    #[cfg(not(target_os = "espidf"))]
    sim: SimServer,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimServer {
    responses: std::collections::VecDeque<Result<(u16, Vec<u8>), CommsError>>,
    uploads: Vec<Vec<u8>>,
}

impl InferenceClient {
    pub fn new(server_url: &str) -> Self {
        let mut url = String::from(server_url.trim_end_matches('/'));
        url.push_str(PREDICT_PATH);
        Self {
            url,
            #[cfg(not(target_os = "espidf"))]
            sim: SimServer::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[cfg(target_os = "espidf")]
    fn post(&mut self, body: &[u8]) -> Result<(u16, wire::Body), CommsError> {
        use core::time::Duration;
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
        use esp_idf_svc::io::{Read, Write};

        fn failed<E: core::fmt::Display>(e: E) -> CommsError {
            warn!("HTTP: {e}");
            CommsError::HttpRequestFailed
        }

        let mut conn = EspHttpConnection::new(&Configuration {
            timeout: Some(Duration::from_secs(20)),
            crt_bundle_attach: Some(esp_idf_sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(failed)?;

        let len = body.len().to_string();
        let headers = [("Content-Type", CONTENT_TYPE), ("Content-Length", len.as_str())];
        conn.initiate_request(Method::Post, &self.url, &headers).map_err(failed)?;
        conn.write_all(body).map_err(failed)?;
        conn.initiate_response().map_err(failed)?;
        let status = conn.status();
        let resp = wire::read_body(|buf| conn.read(buf)).map_err(failed)?;
        Ok((status, resp))
    }

    #[cfg(not(target_os = "espidf"))]
    fn post(&mut self, body: &[u8]) -> Result<(u16, wire::Body), CommsError> {
        self.sim.uploads.push(body.to_vec());
        let (status, resp) = self
            .sim
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok((200, br#"{"result":"healthy"}"#.to_vec())))?;
        let mut rest = resp.as_slice();
        let body = wire::read_body(|buf: &mut [u8]| -> Result<usize, core::convert::Infallible> {
            let k = buf.len().min(rest.len());
            buf[..k].copy_from_slice(&rest[..k]);
            rest = &rest[k..];
            Ok(k)
        })
        .unwrap_or_else(|never| match never {});
        Ok((status, body))
    }

    /// Queue the next simulated server answer.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_respond(&mut self, status: u16, body: &[u8]) {
        self.sim.responses.push_back(Ok((status, body.to_vec())));
    }

    /// Queue a transport failure.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_fail(&mut self, err: CommsError) {
        self.sim.responses.push_back(Err(err));
    }

    /// Request bodies received by the simulated server.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_uploads(&self) -> &[Vec<u8>] {
        &self.sim.uploads
    }
}

impl InferencePort for InferenceClient {
    fn classify(&mut self, jpeg: &[u8]) -> Result<PlantHealth, CommsError> {
        let body = wire::multipart_body(jpeg);
        debug!("POST {} ({} bytes)", self.url, body.len());
        let (status, resp) = self.post(&body)?;
        wire::classify_response(status, &resp)
    }
}
