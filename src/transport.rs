//! The HTTP seam between the protocol engine and the network.
//!
//! The engine only needs "send a request, get status + headers + body back",
//! so that is the whole interface. The default implementation is backed by
//! reqwest; tests drive the engine through scripted stand-ins instead.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::Error;

/// A request for an [`HttpTransport`] to perform.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// The complete URL to send the request to.
    pub url: String,

    /// The HTTP method to use.
    pub method: Method,

    /// The `Content-Type` header to pass along, when a body is sent.
    pub content_type: Option<&'static str>,

    /// The body to pass along with request, or an empty string.
    pub body: String,

    /// Timeout for this single network round trip.
    pub timeout: Duration,
}

impl HttpRequest {
    /// A bodyless GET request.
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            content_type: None,
            body: String::new(),
            timeout,
        }
    }

    /// A bodyless HEAD request.
    pub fn head(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            method: Method::HEAD,
            content_type: None,
            body: String::new(),
            timeout,
        }
    }

    /// A POST request carrying `body` with the given content type.
    pub fn post(
        url: impl Into<String>,
        body: String,
        content_type: &'static str,
        timeout: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            content_type: Some(content_type),
            body,
            timeout,
        }
    }
}

/// A raw response as seen by the protocol engine.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub status: StatusCode,

    /// All response headers.
    pub headers: HeaderMap,

    /// The response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Look up a header value, ignoring values which are not valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `Location` header, which carries the account URL after
    /// new-account and the order URL after new-order and finalize.
    pub fn location(&self) -> Option<&str> {
        self.header(crate::LOCATION)
    }

    /// Like [`location`](HttpResponse::location), but an API error when the
    /// header is missing.
    pub fn location_required(&self) -> Result<String, Error> {
        self.location()
            .map(str::to_owned)
            .ok_or_else(|| Error::InvalidApi("missing Location header".to_string()))
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Abstract async HTTP client.
///
/// Implementations map their transport failures to [`Error::Timeout`] (the
/// request exceeded [`HttpRequest::timeout`]) or [`Error::Connect`]
/// (everything else below HTTP). Status codes are *not* interpreted here;
/// the protocol engine classifies them.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform a single HTTP request.
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

/// The default [`HttpTransport`], backed by a reqwest client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport sending the given `User-Agent` header.
    pub fn new(user_agent: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|err| Error::Connect(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let mut builder = self
            .client
            .request(request.method, request.url.as_str())
            .timeout(request.timeout);
        if let Some(content_type) = request.content_type {
            builder = builder
                .header(http::header::CONTENT_TYPE, content_type)
                .body(request.body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::Connect(err.to_string())
    }
}
