//! The request descriptor handed to every handler.

use std::collections::HashMap;

use axum::extract::{Query, Request};
use axum::http::{HeaderMap, Method};
use bytes::Bytes;

use crate::error::{AppError, Result};

/// Method, path parameters, query, headers and body of one request.
///
/// Path parameters are percent-decoded but otherwise untouched: the router
/// does no validation of file names or job ids.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub method: Method,
    pub params: Vec<(&'static str, String)>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HandlerRequest {
    /// Build a descriptor from a raw request and its named path parameters.
    ///
    /// The body is buffered up to `body_limit` bytes.
    pub async fn from_request(
        request: Request,
        params: Vec<(&'static str, String)>,
        body_limit: usize,
    ) -> Result<Self> {
        let (parts, body) = request.into_parts();

        // A malformed query string is treated as absent
        let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();

        let body = axum::body::to_bytes(body, body_limit)
            .await
            .map_err(|e| AppError::validation(format!("Failed to read request body: {}", e)))?;

        Ok(Self {
            method: parts.method,
            params,
            query,
            headers: parts.headers,
            body,
        })
    }

    /// A descriptor with no query, headers or body
    pub fn new(method: Method, params: Vec<(&'static str, String)>) -> Self {
        Self {
            method,
            params,
            query: HashMap::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Value of the named path parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of the named query parameter
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[tokio::test]
    async fn test_from_request() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/process/video.mp4?targetColor=FF0000&threshold=20")
            .header("x-trace", "1")
            .body(Body::from("payload"))
            .unwrap();

        let req = HandlerRequest::from_request(
            request,
            vec![("filename", "video.mp4".to_string())],
            1024,
        )
        .await
        .unwrap();

        assert_eq!(req.method, Method::POST);
        assert_eq!(req.param("filename"), Some("video.mp4"));
        assert_eq!(req.param("jobId"), None);
        assert_eq!(req.query("targetColor"), Some("FF0000"));
        assert_eq!(req.query("threshold"), Some("20"));
        assert_eq!(req.headers.get("x-trace").unwrap(), "1");
        assert_eq!(&req.body[..], b"payload");
    }

    #[tokio::test]
    async fn test_body_over_limit() {
        let request = Request::builder()
            .uri("/process/video.mp4")
            .body(Body::from(vec![0u8; 64]))
            .unwrap();

        let err = HandlerRequest::from_request(request, vec![], 16)
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }
}
