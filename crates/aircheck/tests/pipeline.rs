//! End-to-end pipeline tests against a single mock upstream.

use std::path::Path;

use aircheck::cli::App;
use aircheck::pipeline;
use aircheck_catalog::Endpoints;
use clap::Parser;
use tempfile::tempdir;

fn app_for(out: &Path) -> App {
    App::try_parse_from([
        "aircheck",
        "--show",
        "ded",
        "--out",
        out.to_str().unwrap(),
        "--delay",
        "1ms",
    ])
    .unwrap()
}

fn endpoints_for(server: &mockito::ServerGuard) -> Endpoints {
    Endpoints {
        doc_base: server.url(),
        api_base: server.url(),
    }
}

const PROGRAM_PAGE: &str =
    r#"<html><body><wmse-archive show-id="42"></wmse-archive></body></html>"#;

#[tokio::test]
async fn downloads_every_catalog_entry() {
    let mut server = mockito::Server::new_async().await;
    let _program = server
        .mock("GET", "/program/ded/")
        .with_status(200)
        .with_body(PROGRAM_PAGE)
        .create_async()
        .await;
    let catalog_body = format!(
        r#"[{{"show_id": "ded", "archive_url": "{url}/files/show.mp3", "playlist_id": null, "playlist_date": "2024-03-15"}}]"#,
        url = server.url()
    );
    let _catalog = server
        .mock("GET", "/api/shows/42")
        .with_status(200)
        .with_body(catalog_body)
        .create_async()
        .await;
    let _file = server
        .mock("GET", "/files/show.mp3")
        .with_status(200)
        .with_body("mp3 bytes")
        .create_async()
        .await;

    let out = tempdir().unwrap();
    let summary = pipeline::run(&app_for(out.path()), endpoints_for(&server))
        .await
        .unwrap();

    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.failed, 0);
    assert!(summary.is_success());

    let dest = out.path().join("2024-03-15_ded.mp3");
    assert_eq!(std::fs::read(&dest).unwrap(), b"mp3 bytes");
    assert!(!out.path().join("2024-03-15_ded.txt").exists());
}

#[tokio::test]
async fn saves_the_playlist_sidecar_when_an_id_is_present() {
    let mut server = mockito::Server::new_async().await;
    let _program = server
        .mock("GET", "/program/ded/")
        .with_status(200)
        .with_body(PROGRAM_PAGE)
        .create_async()
        .await;
    let catalog_body = format!(
        r#"[{{"show_id": "ded", "archive_url": "{url}/files/show.mp3", "playlist_id": "p1", "playlist_date": "2024-03-15"}}]"#,
        url = server.url()
    );
    let _catalog = server
        .mock("GET", "/api/shows/42")
        .with_status(200)
        .with_body(catalog_body)
        .create_async()
        .await;
    let _file = server
        .mock("GET", "/files/show.mp3")
        .with_status(200)
        .with_body("mp3 bytes")
        .create_async()
        .await;
    let _playlist = server
        .mock("GET", "/api/playlists/p1")
        .with_status(200)
        .with_body(r#"{"tracks": [{"artist": "Alice", "title": "First"}]}"#)
        .create_async()
        .await;

    let out = tempdir().unwrap();
    let summary = pipeline::run(&app_for(out.path()), endpoints_for(&server))
        .await
        .unwrap();

    assert_eq!(summary.downloaded, 1);
    assert_eq!(
        std::fs::read_to_string(out.path().join("2024-03-15_ded.txt")).unwrap(),
        "Alice - First\n"
    );
}

#[tokio::test]
async fn entry_without_a_url_is_counted_and_stepped_over() {
    let mut server = mockito::Server::new_async().await;
    let _program = server
        .mock("GET", "/program/ded/")
        .with_status(200)
        .with_body(PROGRAM_PAGE)
        .create_async()
        .await;
    let catalog_body = format!(
        r#"[
            {{"show_id": "ded", "archive_url": "", "playlist_id": null, "playlist_date": "2024-03-08"}},
            {{"show_id": "ded", "archive_url": "{url}/files/show.mp3", "playlist_id": null, "playlist_date": "2024-03-15"}}
        ]"#,
        url = server.url()
    );
    let _catalog = server
        .mock("GET", "/api/shows/42")
        .with_status(200)
        .with_body(catalog_body)
        .create_async()
        .await;
    let _file = server
        .mock("GET", "/files/show.mp3")
        .with_status(200)
        .with_body("mp3 bytes")
        .create_async()
        .await;

    let out = tempdir().unwrap();
    let summary = pipeline::run(&app_for(out.path()), endpoints_for(&server))
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.downloaded, 1);
    assert!(summary.is_success());
    assert!(out.path().join("2024-03-15_ded.mp3").exists());
}

#[tokio::test]
async fn empty_catalog_is_fatal() {
    let mut server = mockito::Server::new_async().await;
    let _program = server
        .mock("GET", "/program/ded/")
        .with_status(200)
        .with_body(PROGRAM_PAGE)
        .create_async()
        .await;
    let _catalog = server
        .mock("GET", "/api/shows/42")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let out = tempdir().unwrap();
    let err = pipeline::run(&app_for(out.path()), endpoints_for(&server))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("no archives found"));
}

#[tokio::test]
async fn resolution_failure_is_fatal() {
    let mut server = mockito::Server::new_async().await;
    let _program = server
        .mock("GET", "/program/ded/")
        .with_status(500)
        .create_async()
        .await;

    let out = tempdir().unwrap();
    let err = pipeline::run(&app_for(out.path()), endpoints_for(&server))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("could not enumerate archives"));
}

#[tokio::test]
async fn invalid_show_key_fails_before_any_request() {
    let mut server = mockito::Server::new_async().await;
    let program = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let out = tempdir().unwrap();
    let app = App::try_parse_from([
        "aircheck",
        "--show",
        "bad/key",
        "--out",
        out.path().to_str().unwrap(),
    ])
    .unwrap();

    let err = pipeline::run(&app, endpoints_for(&server)).await.unwrap_err();

    assert!(err.to_string().contains("invalid show key"));
    program.assert_async().await;
}
