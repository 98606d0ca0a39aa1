use std::{error::Error as _, fmt::Debug, io, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use thiserror::Error;

/// Status line and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub const OK: u16 = 200;

    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: Self::OK, body: body.into() }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Self::OK
    }
}

/// An exchange that never produced a status line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection Refused")]
    ConnectionRefused,
    #[error("Send Header Failed")]
    SendHeaderFailed,
    #[error("Send Payload Failed")]
    SendPayloadFailed,
    #[error("Not Connected")]
    NotConnected,
    #[error("Connection Lost")]
    ConnectionLost,
    #[error("No Stream")]
    NoStream,
    #[error("No HTTP Server")]
    NoHttpServer,
    #[error("Out Of Memory")]
    OutOfMemory,
    #[error("Encoding")]
    Encoding,
    #[error("Stream Write")]
    StreamWrite,
    #[error("Read Timeout")]
    ReadTimeout,
    #[error("Unknown Error: {0}")]
    Other(String),
}

impl TransportError {
    /// Transient link failures; everything else points at configuration or protocol.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionRefused
                | TransportError::NotConnected
                | TransportError::ConnectionLost
                | TransportError::ReadTimeout
        )
    }
}

#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Issue a single GET. Each call owns its connection for its whole lifetime.
    async fn get(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, TransportError>;
}

/// HTTPS transport over reqwest with rustls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(0)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<HttpResponse, TransportError> {
        let res = self
            .http
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest(&e))?;

        let status = res.status().as_u16();
        if status != HttpResponse::OK {
            return Ok(HttpResponse { status, body: String::new() });
        }

        let body = res.text().await.map_err(|e| classify_reqwest(&e))?;
        Ok(HttpResponse { status, body })
    }
}

fn classify_reqwest(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::ReadTimeout;
    }

    if let Some(kind) = io_error_kind(err) {
        match kind {
            io::ErrorKind::ConnectionRefused => return TransportError::ConnectionRefused,
            io::ErrorKind::NotConnected => return TransportError::NotConnected,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => return TransportError::ConnectionLost,
            io::ErrorKind::TimedOut => return TransportError::ReadTimeout,
            io::ErrorKind::OutOfMemory => return TransportError::OutOfMemory,
            _ => {}
        }
    }

    if err.is_connect() {
        TransportError::NoHttpServer
    } else if err.is_decode() {
        TransportError::Encoding
    } else if err.is_body() {
        TransportError::NoStream
    } else if err.is_request() {
        TransportError::SendHeaderFailed
    } else {
        TransportError::Other(err.to_string())
    }
}

fn io_error_kind(err: &reqwest::Error) -> Option<io::ErrorKind> {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = cause.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_link_failures_are_retryable() {
        let retryable = [
            TransportError::ConnectionRefused,
            TransportError::NotConnected,
            TransportError::ConnectionLost,
            TransportError::ReadTimeout,
        ];
        for e in &retryable {
            assert!(e.is_retryable(), "{e}");
        }

        let permanent = [
            TransportError::SendHeaderFailed,
            TransportError::SendPayloadFailed,
            TransportError::NoStream,
            TransportError::NoHttpServer,
            TransportError::OutOfMemory,
            TransportError::Encoding,
            TransportError::StreamWrite,
            TransportError::Other("dns".into()),
        ];
        for e in &permanent {
            assert!(!e.is_retryable(), "{e}");
        }
    }

    #[test]
    fn error_text_is_display_ready() {
        assert_eq!(TransportError::ConnectionLost.to_string(), "Connection Lost");
        assert_eq!(TransportError::Other("boom".into()).to_string(), "Unknown Error: boom");
    }

    #[test]
    fn ok_means_exactly_200() {
        assert!(HttpResponse::ok("{}").is_ok());
        assert!(!HttpResponse { status: 204, body: String::new() }.is_ok());
    }

    #[tokio::test]
    async fn refused_connection_is_classified() {
        // Port 9 on loopback is not expected to be listening.
        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        let url = Url::parse("http://127.0.0.1:9/v1/forecast").unwrap();

        let err = transport.get(&url, Duration::from_secs(2)).await.unwrap_err();
        assert!(
            matches!(
                err,
                TransportError::ConnectionRefused
                    | TransportError::NoHttpServer
                    | TransportError::ReadTimeout
            ),
            "{err:?}"
        );
    }
}
