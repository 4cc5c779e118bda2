use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::http::header::CONTENT_LENGTH;
use actix_web::{FromRequest, HttpRequest};
use bytes::BytesMut;
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use serde_json::Error as JsonError;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::trace_ctx;

/// Body size accepted when no [`JsonBodyLimit`] is registered.
pub const DEFAULT_JSON_LIMIT: usize = 64 * 1024;

/// Per-app override of the body cap, registered with `App::app_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonBodyLimit(pub usize);

impl Default for JsonBodyLimit {
    fn default() -> Self {
        Self(DEFAULT_JSON_LIMIT)
    }
}

/// JSON body extractor whose failures come back as problem details.
///
/// Bodies over the configured limit are refused with 413 before they are
/// buffered in full. A missing required field maps to `MISSING_FIELD`; every
/// other parse failure maps to `BAD_REQUEST` with a sanitized detail.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> ValidatedJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> FromRequest for ValidatedJson<T>
where
    T: DeserializeOwned + 'static,
{
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let limit = req
            .app_data::<JsonBodyLimit>()
            .copied()
            .unwrap_or_default()
            .0;
        let declared = req
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok());
        let mut payload = payload.take();

        Box::pin(async move {
            let trace_id = trace_ctx::trace_id();

            if let Some(len) = declared.filter(|len| *len > limit) {
                debug!(trace_id = %trace_id, declared = len, limit, "body refused by length");
                return Err(too_large(limit));
            }

            let mut body = BytesMut::with_capacity(declared.unwrap_or(0).min(limit));
            while let Some(chunk) = payload.next().await {
                let chunk = chunk.map_err(|e| {
                    warn!(trace_id = %trace_id, error = %e, "request body read failed");
                    AppError::bad_request(ErrorCode::BadRequest, "Failed to read request body")
                })?;
                if body.len() + chunk.len() > limit {
                    debug!(trace_id = %trace_id, limit, "body refused while streaming");
                    return Err(too_large(limit));
                }
                body.extend_from_slice(&chunk);
            }

            serde_json::from_slice::<T>(&body)
                .map(ValidatedJson)
                .map_err(|e| {
                    debug!(
                        trace_id = %trace_id,
                        error = %e,
                        body_size = body.len(),
                        "request body rejected"
                    );
                    parse_error(&e)
                })
        })
    }
}

fn too_large(limit: usize) -> AppError {
    AppError::payload_too_large(format!("Request body exceeds {limit} bytes"))
}

fn parse_error(error: &JsonError) -> AppError {
    match missing_field(error) {
        Some(field) => AppError::invalid(
            ErrorCode::MissingField,
            format!("Missing required field '{field}'"),
        ),
        None => AppError::bad_request(ErrorCode::BadRequest, describe(error)),
    }
}

/// Name of the absent field when serde reports "missing field `x`".
fn missing_field(error: &JsonError) -> Option<String> {
    if error.classify() != Category::Data {
        return None;
    }
    let msg = error.to_string();
    let rest = msg.strip_prefix("missing field `")?;
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}

/// Client-safe summary; never echoes body content.
fn describe(error: &JsonError) -> String {
    match error.classify() {
        Category::Syntax => format!("Invalid JSON at line {}", error.line()),
        Category::Eof => "Invalid JSON: unexpected end of input".into(),
        Category::Data => "Invalid JSON: wrong types for one or more fields".into(),
        Category::Io => "Invalid JSON: body could not be read".into(),
    }
}
