//! HTTP transport used by the negotiation client.

use crate::client::ClientConfig;
use crate::Result;
use bytes::Bytes;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// Response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Returns true for a 200 response.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Returns the body as lossy UTF-8, for diagnostics.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Blocking request/response transport.
pub trait Transport {
    /// Issues a GET request.
    fn get(&self, url: &str, accept: &str) -> Result<HttpResponse>;

    /// Issues a POST request with `body`.
    fn post(&self, url: &str, content_type: &str, accept: &str, body: Vec<u8>)
        -> Result<HttpResponse>;
}

/// Transport backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Builds a transport from client settings.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(&config.user_agent);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    fn finish(response: reqwest::blocking::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes()?;
        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, accept: &str) -> Result<HttpResponse> {
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(url).header(ACCEPT, accept).send()?;
        Self::finish(response)
    }

    fn post(
        &self,
        url: &str,
        content_type: &str,
        accept: &str,
        body: Vec<u8>,
    ) -> Result<HttpResponse> {
        tracing::debug!(url = %url, bytes = body.len(), "POST");
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .header(ACCEPT, accept)
            .body(body)
            .send()?;
        Self::finish(response)
    }
}
