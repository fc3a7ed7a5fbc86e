//! HTTP client seam for the transfer engine.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream of response body chunks.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// A streaming response: status first, body consumed chunk by chunk.
pub struct HttpResponse<E> {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, E>>,
}

/// Asynchronous HTTP client abstraction.
///
/// The minimal seam the engine needs. [`ReqwestClient`] is the production
/// implementation; tests script their own.
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a GET and return the streaming response.
    ///
    /// Transport failures (DNS, connect, TLS) surface as `Err`; HTTP error
    /// statuses come back in [`HttpResponse::status`] for the caller to
    /// classify.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<HttpResponse<Self::Error>, Self::Error>> + Send;
}

/// Production HTTP client, one long per-request timeout sized for large
/// downloads.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    type Error = reqwest::Error;

    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<HttpResponse<Self::Error>, Self::Error> {
        let mut request = self.client.get(url);
        for (key, value) in headers {
            request = request.header(key, value);
        }
        let response = request.send().await?;
        Ok(HttpResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            body: Box::pin(response.bytes_stream()),
        })
    }
}
