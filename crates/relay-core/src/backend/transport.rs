use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

use crate::{errors::Error, Result};

pub const PARTNER_HEADER: &str = "X-Partner-Id";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One backend call, as handed to the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendRequest {
    pub method: Method,
    /// Always starts with exactly one `/`.
    pub path: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
    pub partner_id: Option<String>,
}

impl BackendRequest {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: normalize_path(path),
            body: None,
            query: Vec::new(),
            partner_id: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Empty ids are dropped so the header is never sent blank.
    pub fn with_partner(mut self, partner_id: Option<&str>) -> Self {
        self.partner_id = partner_id
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        self
    }
}

pub fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Connect(String),
}

/// Raw HTTP port under the backend client.
///
/// Implementations only move bytes; status interpretation and retries belong
/// to [`super::BackendClient`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, req: &BackendRequest) -> std::result::Result<HttpResponse, TransportError>;
}

/// reqwest-backed transport with a fixed per-call timeout.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    base_url: String,
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, api_token: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_token}"))
            .map_err(|_| {
                Error::Config("API_TOKEN contains invalid header characters".to_string())
            })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn classify(e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            // Strip the URL so query strings never end up in logs.
            TransportError::Connect(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        req: &BackendRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let url = format!("{}{}", self.base_url, req.path);
        let method = match req.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.http.request(method, url);
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }
        if let Some(partner_id) = &req.partner_id {
            builder = builder.header(PARTNER_HEADER, partner_id.as_str());
        }

        let resp = builder.send().await.map_err(Self::classify)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(Self::classify)?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
