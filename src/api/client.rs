//! `reqwest` implementation of [`LyricsApi`].

use super::{ApiError, LyricsApi, Lyrics, Page, Paginated, RichLyrics, SearchResult};
use crate::utils::truncate_str;
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the Mezmur lyrics API
#[derive(Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: Url,
}

impl ApiClient {
    /// Creates a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Ok(Self { http, base_url })
    }

    /// Appends percent-encoded path segments to the base URL.
    ///
    /// Title paths are passed split on `/` so the separators survive while
    /// spaces and non-ASCII characters get encoded.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(status, &body);
            if status == StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound(message));
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn search(
        &self,
        path: &[&str],
        query: &str,
        limit: u32,
    ) -> Result<Paginated<SearchResult>, ApiError> {
        let mut url = self.endpoint(path.iter().copied())?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("page", "1")
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }
}

/// Extracts a readable reason from an error body.
///
/// FastAPI puts it under `detail`; proxies tend to answer with HTML pages.
fn error_message(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        if let Some(Value::String(detail)) = map.get("detail") {
            return detail.clone();
        }
    }

    let lowered = trimmed.to_ascii_lowercase();
    if lowered.starts_with("<!doctype") || lowered.starts_with("<html") {
        return format!("{status} (server returned an HTML error page)");
    }
    if trimmed.is_empty() {
        return status.to_string();
    }
    if trimmed.chars().count() > 500 {
        return format!("{}... (truncated)", truncate_str(trimmed, 500));
    }
    trimmed.to_string()
}

#[async_trait]
impl LyricsApi for ApiClient {
    async fn search_prefix(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Paginated<SearchResult>, ApiError> {
        self.search(&["search", "prefix"], query, limit).await
    }

    async fn search_full(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Paginated<SearchResult>, ApiError> {
        self.search(&["search"], query, limit).await
    }

    async fn artists(&self, limit: u32) -> Result<Paginated<Page>, ApiError> {
        let mut url = self.endpoint(["artists"])?;
        url.query_pairs_mut()
            .append_pair("page", "1")
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }

    async fn artist_albums(&self, artist: &str, limit: u32) -> Result<Paginated<Page>, ApiError> {
        let mut url = self.endpoint(["artists", artist, "albums"])?;
        url.query_pairs_mut()
            .append_pair("page", "1")
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }

    async fn album_songs(
        &self,
        album_title: &str,
        limit: u32,
    ) -> Result<Paginated<Page>, ApiError> {
        let mut url = self.endpoint(["albums", "songs"])?;
        url.query_pairs_mut()
            .append_pair("album_title", album_title)
            .append_pair("page", "1")
            .append_pair("limit", &limit.to_string());
        self.get_json(url).await
    }

    async fn lyrics(&self, title: &str) -> Result<Lyrics, ApiError> {
        let url = self.endpoint(std::iter::once("lyrics").chain(title.split('/')))?;
        self.get_json(url).await
    }

    async fn rich_lyrics(&self, title: &str) -> Result<RichLyrics, ApiError> {
        let url = self.endpoint(["lyrics", "rich"].into_iter().chain(title.split('/')))?;
        self.get_json(url).await
    }

    async fn health(&self) -> Result<Value, ApiError> {
        let url = self.endpoint(["health"])?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves a single canned HTTP response and yields the request line.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept connection");
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.expect("read request");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            let request = String::from_utf8_lossy(&request).to_string();
            request.lines().next().unwrap_or_default().to_string()
        });

        (format!("http://{addr}"), handle)
    }

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).expect("valid base url")
    }

    #[test]
    fn test_endpoint_keeps_title_separators() -> Result<(), ApiError> {
        let api = client("http://localhost:8000");
        let url = api.endpoint(
            std::iter::once("lyrics").chain("Samuel Tesfamichael/Misale Yeleleh/Yekebere".split('/')),
        )?;
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/lyrics/Samuel%20Tesfamichael/Misale%20Yeleleh/Yekebere"
        );
        Ok(())
    }

    #[test]
    fn test_endpoint_respects_base_path() -> Result<(), ApiError> {
        let api = client("http://localhost:8000/v1/");
        let url = api.endpoint(["artists", "Tesfaye Chala", "albums"])?;
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/v1/artists/Tesfaye%20Chala/albums"
        );
        Ok(())
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_error_message_prefers_detail() {
        let msg = error_message(StatusCode::NOT_FOUND, r#"{"detail": "Song not found"}"#);
        assert_eq!(msg, "Song not found");

        let msg = error_message(StatusCode::BAD_GATEWAY, "<html><body>nginx</body></html>");
        assert!(msg.contains("HTML error page"));

        let msg = error_message(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(msg.contains("500"));
    }

    #[tokio::test]
    async fn test_search_prefix_decodes_response() -> Result<(), ApiError> {
        let (base, request) = serve_once(
            "200 OK",
            r#"{"data": [{"title": "Samuel Tesfamichael/Misale Yeleleh/Yekebere", "pageid": 1, "snippet": "Beautiful song"}], "total": 1, "page": 1, "limit": 10, "has_next": false, "has_prev": false}"#,
        )
        .await;

        let result = client(&base).search_prefix("samuel", 10).await?;
        assert_eq!(result.data.len(), 1);
        assert_eq!(
            result.data[0].title,
            "Samuel Tesfamichael/Misale Yeleleh/Yekebere"
        );

        let line = request.await.expect("server task");
        assert!(line.starts_with("GET /search/prefix?q=samuel&page=1&limit=10 "));
        Ok(())
    }

    #[tokio::test]
    async fn test_lyrics_not_found() {
        let (base, request) = serve_once("404 Not Found", r#"{"detail": "Song not found"}"#).await;

        let err = client(&base).lyrics("Unknown/Song/Title").await;
        assert_eq!(err, Err(ApiError::NotFound("Song not found".to_string())));

        let line = request.await.expect("server task");
        assert!(line.starts_with("GET /lyrics/Unknown/Song/Title "));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let (base, _request) = serve_once("500 Internal Server Error", r#"{"detail": "boom"}"#).await;

        let err = client(&base).health().await;
        assert_eq!(
            err,
            Err(ApiError::Status {
                status: 500,
                message: "boom".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        // Port 9 (discard) is closed on test hosts
        let err = client("http://127.0.0.1:9").health().await;
        assert!(matches!(err, Err(ApiError::Network(_))));
    }
}
