//! Effects layer: HTTP calls against the program page and the archive API.

use futures_util::StreamExt;
use reqwest::header;
use tracing::{debug, info};

use crate::core::{decode_archives, extract_archive_id};
use crate::data::{
    API_TIMEOUT, ArchiveEntry, ArchiveId, BROWSER_USER_AGENT, Endpoints, MAX_RESPONSE_SIZE,
    Playlist, ShowKey,
};
use crate::error::CatalogError;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Client for the show catalog upstream.
///
/// One instance holds a single connection pool with the API timeout; all
/// three upstream calls go through it.
pub struct CatalogClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl CatalogClient {
    pub fn new(endpoints: Endpoints) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(API_TIMEOUT)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { http, endpoints })
    }

    /// Resolve the opaque archive id from the show's program page.
    pub async fn resolve_archive_id(&self, key: &ShowKey) -> Result<ArchiveId, CatalogError> {
        let url = format!("{}/program/{}/", self.endpoints.doc_base, key);
        debug!(%url, "fetching program page");
        let response = self
            .http
            .get(&url)
            .header(header::ACCEPT, HTML_ACCEPT)
            .header(header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        let id = extract_archive_id(&body)
            .filter(|id| !id.is_empty())
            .ok_or(CatalogError::ArchiveIdNotFound)?;
        info!(archive_id = %id, show = %key, "resolved archive id");
        Ok(ArchiveId::new(id))
    }

    /// List every archive entry belonging to a resolved id, in service order.
    pub async fn list_archives(&self, id: &ArchiveId) -> Result<Vec<ArchiveEntry>, CatalogError> {
        let url = format!("{}/api/shows/{}", self.endpoints.api_base, id);
        debug!(%url, "fetching archive catalog");
        let response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = read_capped(response).await?;
        let entries = decode_archives(&body)?;
        info!(count = entries.len(), archive_id = %id, "fetched archive catalog");
        Ok(entries)
    }

    /// Fetch the track listing for a playlist id.
    pub async fn fetch_playlist(&self, playlist_id: &str) -> Result<Playlist, CatalogError> {
        let url = format!("{}/api/playlists/{}", self.endpoints.api_base, playlist_id);
        debug!(%url, "fetching playlist");
        let response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let body = read_capped(response).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Accumulate a response body while holding the hard size ceiling.
async fn read_capped(response: reqwest::Response) -> Result<Vec<u8>, CatalogError> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > MAX_RESPONSE_SIZE {
            return Err(CatalogError::ResponseTooLarge {
                limit: MAX_RESPONSE_SIZE,
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> CatalogClient {
        CatalogClient::new(Endpoints {
            doc_base: server.url(),
            api_base: server.url(),
        })
        .unwrap()
    }

    fn show_key(s: &str) -> ShowKey {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn resolves_archive_id_from_program_page() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/program/ded/")
            .with_status(200)
            .with_body(r#"<html><body><wmse-archive show-id="42"></wmse-archive></body></html>"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let id = client.resolve_archive_id(&show_key("ded")).await.unwrap();
        assert_eq!(id.as_str(), "42");
    }

    #[tokio::test]
    async fn resolve_surfaces_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/program/gone/")
            .with_status(404)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .resolve_archive_id(&show_key("gone"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn resolve_reports_missing_archive_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/program/ded/")
            .with_status(200)
            .with_body("<html><body><p>nothing to see</p></body></html>")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.resolve_archive_id(&show_key("ded")).await.unwrap_err();
        assert!(matches!(err, CatalogError::ArchiveIdNotFound));
    }

    #[tokio::test]
    async fn resolve_treats_empty_attribute_as_missing() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/program/ded/")
            .with_status(200)
            .with_body(r#"<wmse-archive show-id=""></wmse-archive>"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.resolve_archive_id(&show_key("ded")).await.unwrap_err();
        assert!(matches!(err, CatalogError::ArchiveIdNotFound));
    }

    #[tokio::test]
    async fn lists_archives_in_service_order() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/shows/42")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"show_id": "ded", "archive_url": "https://x/a.mp3", "playlist_id": "p1", "playlist_date": "2024-03-15"},
                    {"show_id": "ded", "archive_url": "https://x/b.mp3", "playlist_id": null, "playlist_date": "2024-03-22"}
                ]"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let entries = client.list_archives(&ArchiveId::new("42")).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].playlist_date, "2024-03-15");
        assert_eq!(entries[1].playlist_date, "2024-03-22");
    }

    #[tokio::test]
    async fn empty_catalog_is_ok_at_this_layer() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/shows/42")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server);
        let entries = client.list_archives(&ArchiveId::new("42")).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn oversized_catalog_body_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/shows/42")
            .with_status(200)
            .with_body(" ".repeat(MAX_RESPONSE_SIZE + 1))
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .list_archives(&ArchiveId::new("42"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ResponseTooLarge { .. }));
    }

    #[tokio::test]
    async fn malformed_catalog_body_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/shows/42")
            .with_status(200)
            .with_body(r#"{"not": "an array"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .list_archives(&ArchiveId::new("42"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn fetches_and_decodes_playlist() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/playlists/p1")
            .with_status(200)
            .with_body(r#"{"tracks": [{"artist": "Alice", "title": "First"}, {"artist": "Bob", "title": "Second"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let playlist = client.fetch_playlist("p1").await.unwrap();
        assert_eq!(playlist.render(), "Alice - First\nBob - Second\n");
    }

    #[tokio::test]
    async fn playlist_status_failure_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/playlists/p1")
            .with_status(500)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.fetch_playlist("p1").await.unwrap_err();
        assert!(matches!(err, CatalogError::Status { status: 500, .. }));
    }
}
