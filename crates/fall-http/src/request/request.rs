//! Request abstraction for handling HTTP requests
//!
//! Carries the parsed request plus the values the router places on it
//! during dispatch (path parameters and the matched route pattern).

use crate::errors::{HttpError, HttpResult};
use axum::{
    body::Bytes,
    http::{HeaderMap, HeaderName, HeaderValue, Method, Uri},
};
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Router-private context key holding `"METHOD /pattern"` of the matched route
#[derive(Debug, Clone)]
pub(crate) struct MatchedRoute(pub(crate) String);

/// Request abstraction that wraps Axum's request parts
/// with parameter and body extraction helpers
#[derive(Debug)]
pub struct FallRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub path_params: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    body_bytes: Option<Bytes>,
    remote_addr: Option<SocketAddr>,
}

impl FallRequest {
    /// Create a new request; query parameters are parsed from the URI
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        let query_params = uri
            .query()
            .and_then(|query| serde_urlencoded::from_str::<HashMap<String, String>>(query).ok())
            .unwrap_or_default();

        Self {
            method,
            uri,
            headers,
            path_params: HashMap::new(),
            query_params,
            extensions: HashMap::new(),
            body_bytes: None,
            remote_addr: None,
        }
    }

    /// Create a request from a method and a URI string
    pub fn parse(method: Method, uri: &str) -> HttpResult<Self> {
        let uri = uri
            .parse::<Uri>()
            .map_err(|e| HttpError::bad_request(format!("Invalid URI '{}': {}", uri, e)))?;
        Ok(Self::new(method, uri, HeaderMap::new()))
    }

    /// Set request body bytes (consuming)
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body_bytes = Some(body.into());
        self
    }

    /// Set request body bytes (borrowing - for middleware use)
    pub fn set_body(&mut self, body: Bytes) {
        self.body_bytes = Some(body);
    }

    /// Add header (consuming)
    pub fn with_header<K, V>(mut self, key: K, value: V) -> HttpResult<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.add_header(key, value)?;
        Ok(self)
    }

    /// Add header to request (for middleware use)
    pub fn add_header<K, V>(&mut self, key: K, value: V) -> HttpResult<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let name = HeaderName::from_bytes(key.as_ref().as_bytes())
            .map_err(|e| HttpError::bad_request(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::from_str(value.as_ref())
            .map_err(|e| HttpError::bad_request(format!("Invalid header value: {}", e)))?;

        self.headers.insert(name, value);
        Ok(())
    }

    /// Set the peer address of the connection
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Peer address, when the request came through a socket
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Get path parameter by name
    pub fn path_param(&self, name: &str) -> Option<&String> {
        self.path_params.get(name)
    }

    /// Get path parameter by name, parsed to specific type
    pub fn path_param_parsed<T>(&self, name: &str) -> HttpResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let param = self
            .path_param(name)
            .ok_or_else(|| HttpError::bad_request(format!("Missing path parameter: {}", name)))?;

        param
            .parse::<T>()
            .map_err(|e| HttpError::bad_request(format!("Invalid path parameter {}: {}", name, e)))
    }

    /// Get query parameter by name
    pub fn query_param(&self, name: &str) -> Option<&String> {
        self.query_params.get(name)
    }

    /// Get query parameter by name, parsed to specific type
    pub fn query_param_parsed<T>(&self, name: &str) -> HttpResult<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.query_param(name) {
            Some(param) => param.parse::<T>().map(Some).map_err(|e| {
                HttpError::bad_request(format!("Invalid query parameter {}: {}", name, e))
            }),
            None => Ok(None),
        }
    }

    /// Parse query parameters to specified type
    pub fn query<T: DeserializeOwned>(&self) -> HttpResult<T> {
        let query_str = self.uri.query().unwrap_or("");
        serde_urlencoded::from_str::<T>(query_str)
            .map_err(|e| HttpError::bad_request(format!("Invalid query parameters: {}", e)))
    }

    /// Get header value as string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Get request body as bytes
    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body_bytes.as_ref()
    }

    /// Parse JSON body to specified type
    pub fn json<T: DeserializeOwned>(&self) -> HttpResult<T> {
        let bytes = self
            .body_bytes()
            .ok_or_else(|| HttpError::bad_request("No request body"))?;

        serde_json::from_slice(bytes)
            .map_err(|e| HttpError::bad_request(format!("Invalid JSON body: {}", e)))
    }

    /// Get request path
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Pattern of the route that matched this request, e.g. `"GET /items/{id}"`
    ///
    /// Only set once the router has dispatched the request.
    pub fn route_pattern(&self) -> Option<&str> {
        self.get_extension::<MatchedRoute>()
            .map(|matched| matched.0.as_str())
    }

    /// Insert typed data into request extensions (helper for middleware)
    pub fn insert_extension<T: Send + Sync + 'static>(&mut self, data: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(data));
    }

    /// Get typed data from request extensions (helper for middleware)
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|any| any.downcast_ref::<T>())
    }

    /// Convert an Axum request into a FallRequest, buffering at most `limit` body bytes
    pub(crate) async fn from_axum_request(
        request: axum::extract::Request,
        limit: usize,
    ) -> HttpResult<Self> {
        let (parts, body) = request.into_parts();
        let remote_addr = parts
            .extensions
            .get::<axum::extract::ConnectInfo<SocketAddr>>()
            .map(|info| info.0);

        let bytes = axum::body::to_bytes(body, limit)
            .await
            .map_err(|_| HttpError::RequestTooLarge { limit })?;

        let mut request = Self::new(parts.method, parts.uri, parts.headers);
        if !bytes.is_empty() {
            request.body_bytes = Some(bytes);
        }
        request.remote_addr = remote_addr;
        Ok(request)
    }
}
