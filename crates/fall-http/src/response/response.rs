//! Response abstraction for building HTTP responses
//!
//! Provides fluent response building with status codes, headers, and JSON serialization.

use crate::errors::{HttpError, HttpResult};
use crate::foundation::constants::{CONTENT_TYPE_HTML, CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT};
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};
use serde::Serialize;

/// Response builder for creating HTTP responses with fluent API
#[derive(Debug)]
pub struct FallResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

/// Response body types
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Text(String),
    Bytes(Bytes),
    Json(serde_json::Value),
}

impl FallResponse {
    /// Create new response with OK status
    pub fn new() -> Self {
        Self::with_status(StatusCode::OK)
    }

    /// Create response with specific status code
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: ResponseBody::Empty,
        }
    }

    pub fn ok() -> Self {
        Self::with_status(StatusCode::OK)
    }

    pub fn created() -> Self {
        Self::with_status(StatusCode::CREATED)
    }

    pub fn no_content() -> Self {
        Self::with_status(StatusCode::NO_CONTENT)
    }

    pub fn bad_request() -> Self {
        Self::with_status(StatusCode::BAD_REQUEST)
    }

    pub fn not_found() -> Self {
        Self::with_status(StatusCode::NOT_FOUND)
    }

    pub fn method_not_allowed() -> Self {
        Self::with_status(StatusCode::METHOD_NOT_ALLOWED)
    }

    pub fn internal_server_error() -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Set response status code (consuming)
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set response status code (borrowing - for middleware use)
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Header value as a string, if present and valid UTF-8
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Add header to response (consuming)
    pub fn header<K, V>(mut self, key: K, value: V) -> HttpResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.add_header(key, value)?;
        Ok(self)
    }

    /// Add header to response (borrowing - for middleware use)
    pub fn add_header<K, V>(&mut self, key: K, value: V) -> HttpResult<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let name = HeaderName::from_bytes(key.as_ref().as_bytes())
            .map_err(|e| HttpError::internal(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::from_str(value.as_ref())
            .map_err(|e| HttpError::internal(format!("Invalid header value: {}", e)))?;
        self.headers.append(name, value);
        Ok(())
    }

    /// Add header to response, never fails
    ///
    /// Returns a 500 response on invalid header names or values.
    pub fn with_header<K, V>(self, key: K, value: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.header(key, value).unwrap_or_else(|err| {
            tracing::error!("Header creation failed in with_header: {}", err);
            FallResponse::internal_server_error()
        })
    }

    /// Set text body
    pub fn text<S: Into<String>>(mut self, content: S) -> Self {
        self.body = ResponseBody::Text(content.into());
        self.set_default_content_type(CONTENT_TYPE_TEXT);
        self
    }

    /// Set HTML body
    pub fn html<S: Into<String>>(mut self, content: S) -> Self {
        self.body = ResponseBody::Text(content.into());
        self.set_default_content_type(CONTENT_TYPE_HTML);
        self
    }

    /// Set raw bytes body
    pub fn bytes(mut self, content: Bytes) -> Self {
        self.body = ResponseBody::Bytes(content);
        self
    }

    /// Serialize `data` as the JSON body
    pub fn json<T: Serialize>(self, data: &T) -> HttpResult<Self> {
        let value = serde_json::to_value(data)?;
        Ok(self.json_value(value))
    }

    /// Set a JSON body from an already built value
    pub fn json_value(mut self, value: serde_json::Value) -> Self {
        self.body = ResponseBody::Json(value);
        self.set_default_content_type(CONTENT_TYPE_JSON);
        self
    }

    /// Set JSON body, never fails
    ///
    /// Returns a 500 response on serialization failure.
    pub fn with_json<T: Serialize>(self, data: &T) -> Self {
        self.json(data).unwrap_or_else(|err| {
            tracing::error!("JSON serialization failed in with_json: {}", err);
            FallResponse::internal_server_error()
        })
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Body as text, for text and JSON bodies
    pub fn body_text(&self) -> Option<String> {
        match &self.body {
            ResponseBody::Empty => None,
            ResponseBody::Text(text) => Some(text.clone()),
            ResponseBody::Bytes(bytes) => String::from_utf8(bytes.to_vec()).ok(),
            ResponseBody::Json(value) => Some(value.to_string()),
        }
    }

    /// Body as JSON, parsing text and byte bodies when needed
    pub fn body_json(&self) -> Option<serde_json::Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value.clone()),
            ResponseBody::Text(text) => serde_json::from_str(text).ok(),
            ResponseBody::Bytes(bytes) => serde_json::from_slice(bytes).ok(),
            ResponseBody::Empty => None,
        }
    }

    fn set_default_content_type(&mut self, content_type: &'static str) {
        if !self.headers.contains_key(header::CONTENT_TYPE) {
            self.headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
    }

    /// Drop the body, keeping status and headers
    pub(crate) fn clear_body(&mut self) {
        self.body = ResponseBody::Empty;
    }

    /// Convert into an axum response (framework internals)
    pub(crate) fn into_axum_response(self) -> Response {
        let body = match self.body {
            ResponseBody::Empty => Body::empty(),
            ResponseBody::Text(text) => Body::from(text),
            ResponseBody::Bytes(bytes) => Body::from(bytes),
            ResponseBody::Json(value) => Body::from(value.to_string()),
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for FallResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Conversion of handler return values into responses
pub trait IntoFallResponse {
    fn into_response(self) -> FallResponse;
}

impl IntoFallResponse for FallResponse {
    fn into_response(self) -> FallResponse {
        self
    }
}

impl<T: IntoFallResponse> IntoFallResponse for HttpResult<T> {
    fn into_response(self) -> FallResponse {
        match self {
            Ok(value) => value.into_response(),
            Err(error) => error.into_response(),
        }
    }
}

impl IntoFallResponse for HttpError {
    fn into_response(self) -> FallResponse {
        HttpError::into_response(self)
    }
}

impl IntoFallResponse for &'static str {
    fn into_response(self) -> FallResponse {
        FallResponse::ok().text(self)
    }
}

impl IntoFallResponse for String {
    fn into_response(self) -> FallResponse {
        FallResponse::ok().text(self)
    }
}

impl IntoFallResponse for StatusCode {
    fn into_response(self) -> FallResponse {
        FallResponse::with_status(self)
    }
}

impl IntoFallResponse for (StatusCode, String) {
    fn into_response(self) -> FallResponse {
        FallResponse::with_status(self.0).text(self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response_sets_content_type() {
        let response = FallResponse::ok().text("hello");

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.header_str("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(response.body_text().as_deref(), Some("hello"));
    }

    #[test]
    fn test_json_response() {
        #[derive(Serialize)]
        struct Item {
            id: u32,
        }

        let response = FallResponse::created().json(&Item { id: 7 }).unwrap();

        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.body_json().unwrap()["id"], 7);
    }

    #[test]
    fn test_invalid_header_falls_back_to_500() {
        let response = FallResponse::ok().with_header("bad header", "value");
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_result_conversion() {
        let ok: HttpResult<FallResponse> = Ok(FallResponse::no_content());
        assert_eq!(ok.into_response().status_code(), StatusCode::NO_CONTENT);

        let err: HttpResult<FallResponse> = Err(HttpError::bad_request("missing id"));
        assert_eq!(err.into_response().status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_into_axum_response() {
        let response = FallResponse::with_status(StatusCode::ACCEPTED)
            .with_header("x-trace", "abc")
            .text("queued")
            .into_axum_response();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-trace"], "abc");
    }
}
