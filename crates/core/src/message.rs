//! Request and response model exchanged between the worker and its host.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
use url::Url;

use crate::Error;

/// An intercepted outgoing request.
///
/// Immutable once built: the worker classifies requests but never rewrites them.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
}

impl Request {
    /// Create a request with no headers.
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new() }
    }

    /// Shorthand for a GET request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Build a request from loosely typed parts, as delivered by a host adapter.
    pub fn parse(method: &str, url: &str) -> Result<Self, Error> {
        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {method:?}: {e}")))?;
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self::new(method, url))
    }

    /// Add a header, consuming and returning the request.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Add a header from string parts.
    pub fn try_with_header(self, name: &str, value: &str) -> Result<Self, Error> {
        let name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidInput(format!("header name: {e}")))?;
        let value = HeaderValue::from_str(value).map_err(|e| Error::InvalidInput(format!("header value: {e}")))?;
        Ok(self.with_header(name, value))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The `Accept` header, if present and valid UTF-8.
    pub fn accept(&self) -> Option<&str> {
        self.headers.get(header::ACCEPT).and_then(|v| v.to_str().ok())
    }

    /// Whether the worker may answer this request itself.
    ///
    /// Only safe retrievals are intercepted; everything else goes to the network untouched.
    pub fn is_interceptable(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }
}

/// A response produced by the network or read back from a cache store.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self { status, headers: HeaderMap::new(), body: body.into() }
    }

    /// 200 OK with the given content type and body.
    pub fn ok(content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body).with_header(header::CONTENT_TYPE, HeaderValue::from_static(content_type))
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
