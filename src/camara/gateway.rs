//! HTTP gateway for the transparency API.
//!
//! Every network access in the application funnels through [`Gateway`].
//! It owns the base URL and the JSON headers; callers only supply an
//! endpoint path and query parameters. No retries happen here - retry
//! policy belongs to whoever holds the result.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Failure modes of a gateway call.
///
/// `Network` is a transport-level failure (DNS, refused connection,
/// timeout) where no HTTP response exists. `Http` carries the status
/// plus the server's `detail` message when the error body had one.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
  #[error("network error: {0}")]
  Network(String),
  #[error("{message} (HTTP {status})")]
  Http { status: u16, message: String },
  #[error("invalid response body: {0}")]
  Parse(String),
}

impl FetchError {
  /// Short message suitable for an error banner.
  pub fn user_message(&self) -> String {
    match self {
      FetchError::Http { message, .. } => message.clone(),
      other => other.to_string(),
    }
  }

  pub fn status(&self) -> Option<u16> {
    match self {
      FetchError::Http { status, .. } => Some(*status),
      _ => None,
    }
  }
}

/// Thin wrapper around a reqwest client pinned to one API base URL.
#[derive(Clone)]
pub struct Gateway {
  http: reqwest::Client,
  base: Url,
}

impl Gateway {
  pub fn new(base_url: &str) -> Result<Self, FetchError> {
    let base = Url::parse(base_url)
      .map_err(|e| FetchError::Network(format!("invalid base url {}: {}", base_url, e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .build()
      .map_err(|e| FetchError::Network(e.to_string()))?;

    Ok(Self { http, base })
  }

  /// GET an endpoint and parse the body as JSON.
  ///
  /// `path` is resolved against the base URL; `params` become the query
  /// string. Non-2xx responses are turned into [`FetchError::Http`] with
  /// the message extracted from the error body.
  pub async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value, FetchError> {
    let mut url = self
      .base
      .join(path)
      .map_err(|e| FetchError::Network(format!("invalid path {}: {}", path, e)))?;

    if !params.is_empty() {
      url
        .query_pairs_mut()
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    }

    tracing::debug!(%url, "GET");

    let response = self
      .http
      .get(url)
      .send()
      .await
      .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(FetchError::Http {
        status: status.as_u16(),
        message: error_detail(&body),
      });
    }

    let body = response
      .text()
      .await
      .map_err(|e| FetchError::Network(e.to_string()))?;

    serde_json::from_str(&body).map_err(|e| FetchError::Parse(e.to_string()))
  }
}

/// Extract a human-readable message from an error body.
///
/// The API reports errors as `{"detail": "..."}`; anything else yields
/// a generic message and the caller keeps the numeric status.
fn error_detail(body: &str) -> String {
  serde_json::from_str::<Value>(body)
    .ok()
    .and_then(|v| v.get("detail").and_then(Value::as_str).map(String::from))
    .unwrap_or_else(|| "Unknown error".to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};

  #[test]
  fn test_error_detail_from_body() {
    assert_eq!(error_detail(r#"{"detail":"not found"}"#), "not found");
  }

  #[test]
  fn test_error_detail_fallback() {
    assert_eq!(error_detail("<html>nope</html>"), "Unknown error");
    assert_eq!(error_detail(""), "Unknown error");
    assert_eq!(error_detail(r#"{"message":"other shape"}"#), "Unknown error");
  }

  #[test]
  fn test_user_message_prefers_server_detail() {
    let err = FetchError::Http {
      status: 404,
      message: "not found".to_string(),
    };
    assert_eq!(err.user_message(), "not found");
    assert_eq!(err.status(), Some(404));

    let err = FetchError::Network("connection refused".to_string());
    assert_eq!(err.user_message(), "network error: connection refused");
    assert_eq!(err.status(), None);
  }

  /// One-shot HTTP server returning a canned response.
  async fn serve_once(response: String) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = [0u8; 2048];
      let _ = socket.read(&mut buf).await;
      let _ = socket.write_all(response.as_bytes()).await;
    });
    format!("http://{}", addr)
  }

  fn http_response(status: &str, body: &str) -> String {
    format!(
      "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
      status,
      body.len(),
      body
    )
  }

  #[tokio::test]
  async fn test_get_json_success() {
    let base = serve_once(http_response("200 OK", r#"[{"id":1,"sigla":"PT"}]"#)).await;
    let gateway = Gateway::new(&base).unwrap();

    let value = gateway.get_json("/deputados/partidos/", &[]).await.unwrap();
    assert_eq!(value[0]["sigla"], "PT");
  }

  #[tokio::test]
  async fn test_get_json_http_error_with_detail() {
    let base = serve_once(http_response("404 Not Found", r#"{"detail":"not found"}"#)).await;
    let gateway = Gateway::new(&base).unwrap();

    let err = gateway.get_json("/deputados/9999", &[]).await.unwrap_err();
    match err {
      FetchError::Http { status, message } => {
        assert_eq!(status, 404);
        assert_eq!(message, "not found");
      }
      other => panic!("expected Http error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_get_json_invalid_body_is_parse_error() {
    let base = serve_once(http_response("200 OK", "not json at all")).await;
    let gateway = Gateway::new(&base).unwrap();

    let err = gateway.get_json("/deputados/", &[]).await.unwrap_err();
    assert!(matches!(err, FetchError::Parse(_)));
  }

  #[tokio::test]
  async fn test_get_json_network_error() {
    // Bind and immediately drop a listener so the port is closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = Gateway::new(&format!("http://{}", addr)).unwrap();
    let err = gateway.get_json("/deputados/", &[]).await.unwrap_err();
    assert!(matches!(err, FetchError::Network(_)));
  }
}
