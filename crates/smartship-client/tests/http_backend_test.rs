//! End-to-end tests of the HTTP backend against a mock server.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use mockito::{Matcher, Server};
use smartship_client::{
    progress, ApiClient, BackendError, NotificationLog, SessionManager, UploadBackend,
    UploadEvent, UploadOrchestrator, UploadReporter,
};
use smartship_core::constants::BYTES_PER_MB;
use smartship_core::{
    FileCandidate, FileIntakeValidator, Intake, ShipError, UploadPhase, UploadSession,
};

fn client_for(server: &Server) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(server.url(), Duration::from_secs(5)).unwrap())
}

fn session_body(server: &Server, id: &str) -> String {
    format!(r#"{{"url":"{}/session/{}"}}"#, server.url(), id)
}

fn text_file(name: &str, body: &'static str) -> FileCandidate {
    FileCandidate::from_bytes(name, "text/plain", Bytes::from_static(body.as_bytes()))
}

#[tokio::test]
async fn test_fetch_session() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/session-url")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(session_body(&server, "abc123"))
        .create_async()
        .await;

    let client = client_for(&server);
    let descriptor = client.fetch_session().await.unwrap();
    let session = UploadSession::try_from(descriptor).unwrap();

    assert_eq!(session.id(), "abc123");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_session_server_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/session-url")
        .with_status(500)
        .create_async()
        .await;

    let log = Arc::new(NotificationLog::new());
    let manager = SessionManager::new(client_for(&server), log.clone());

    let err = manager.acquire().await.unwrap_err();
    assert!(matches!(err, ShipError::SessionUnavailable(_)));
    assert!(manager.current().is_none());
    assert_eq!(log.drain()[0].message, "Failed to connect to the server");
}

#[tokio::test]
async fn test_upload_posts_eligible_files_as_multipart() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/upload/abc123")
        .match_header("content-type", Matcher::Regex("^multipart/form-data".to_string()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="files"; filename="a.txt""#.to_string()),
            Matcher::Regex("hello from a".to_string()),
        ]))
        .with_status(200)
        .create_async()
        .await;

    let client = client_for(&server);
    client
        .upload_files(
            "abc123",
            &[text_file("a.txt", "hello from a")],
            Arc::new(|_| {}),
        )
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_upload_error_body_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/upload/abc123")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"disk full"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .upload_files("abc123", &[text_file("a.txt", "a")], Arc::new(|_| {}))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BackendError::Status { status: 500, ref message } if message.as_deref() == Some("disk full")
    ));
}

#[tokio::test]
async fn test_full_pipeline_from_disk() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/session-url")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("set-cookie", "smartship_session=tok42; Path=/")
        .with_body(session_body(&server, "abc123"))
        .create_async()
        .await;
    let upload = server
        .mock("POST", "/upload/abc123")
        .match_header("cookie", Matcher::Regex("smartship_session=tok42".to_string()))
        .match_body(Matcher::Regex(r#"filename="notes.txt""#.to_string()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let mut on_disk = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    on_disk.write_all(b"some shipping notes").unwrap();
    let mut candidate = FileCandidate::from_path(on_disk.path()).await.unwrap();
    candidate.name = "notes.txt".to_string();
    assert_eq!(candidate.mime_type, "text/plain");

    let client = client_for(&server);
    let log = Arc::new(NotificationLog::new());
    let manager = SessionManager::new(client.clone(), log.clone());
    let orchestrator = UploadOrchestrator::new(client, log, Duration::from_secs(3));

    let mut intake = Intake::new(FileIntakeValidator::new(20 * BYTES_PER_MB));
    intake.add(vec![candidate]);

    let session = manager.acquire().await.unwrap();
    let (reporter, mut events) = progress::channel();
    let task = orchestrator
        .submit(Some(&session), &mut intake, reporter)
        .await
        .unwrap();

    assert_eq!(task.phase, UploadPhase::Succeeded);
    assert!(intake.files().is_empty());
    upload.assert_async().await;

    let events = events.drain();
    let percents: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            UploadEvent::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));
    assert_eq!(events.last(), Some(&UploadEvent::Succeeded));
}

#[tokio::test]
async fn test_nothing_sent_without_eligible_files() {
    let mut server = Server::new_async().await;
    let upload = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    let orchestrator =
        UploadOrchestrator::new(client, Arc::new(NotificationLog::new()), Duration::from_secs(3));
    let mut intake = Intake::new(FileIntakeValidator::new(4));
    intake.add(vec![text_file("big.txt", "more than four bytes")]);

    let session = UploadSession::from_url(format!("{}/session/abc123", server.url())).unwrap();
    let err = orchestrator
        .submit(Some(&session), &mut intake, UploadReporter::detached())
        .await
        .unwrap_err();

    assert!(matches!(err, ShipError::NoEligibleFiles));
    assert_eq!(intake.files().len(), 1);
    upload.assert_async().await;
}

#[tokio::test]
async fn test_escaped_session_id_is_not_escaped_again() {
    let mut server = Server::new_async().await;
    let upload = server
        .mock("POST", "/upload/a%20b")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let session = UploadSession::from_url(format!("{}/session/a%20b", server.url())).unwrap();
    let orchestrator = UploadOrchestrator::new(
        client_for(&server),
        Arc::new(NotificationLog::new()),
        Duration::from_secs(3),
    );
    let mut intake = Intake::new(FileIntakeValidator::new(20 * BYTES_PER_MB));
    intake.add(vec![text_file("a.txt", "a")]);

    orchestrator
        .submit(Some(&session), &mut intake, UploadReporter::detached())
        .await
        .unwrap();
    upload.assert_async().await;
}

/// Writes `body` only after `delay`, simulating a slow link.
fn delayed_body(
    delay: Duration,
    body: &'static str,
) -> impl Fn(&mut dyn Write) -> std::io::Result<()> + Send + Sync + 'static {
    move |w: &mut dyn Write| {
        std::thread::sleep(delay);
        w.write_all(body.as_bytes())
    }
}

#[tokio::test]
async fn test_slow_upload_is_not_cut_off_by_request_timeout() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/upload/abc123")
        .with_status(500)
        .with_chunked_body(delayed_body(
            Duration::from_millis(400),
            r#"{"error":"disk full"}"#,
        ))
        .create_async()
        .await;

    let client = ApiClient::new(server.url(), Duration::from_millis(150)).unwrap();
    let err = client
        .upload_files("abc123", &[text_file("a.txt", "a")], Arc::new(|_| {}))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BackendError::Status { status: 500, ref message } if message.as_deref() == Some("disk full")
    ));
}

#[tokio::test]
async fn test_slow_session_fetch_times_out() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/session-url")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(delayed_body(
            Duration::from_millis(400),
            r#"{"url":"https://s.example/session/late"}"#,
        ))
        .create_async()
        .await;

    let client = ApiClient::new(server.url(), Duration::from_millis(150)).unwrap();
    assert!(client.fetch_session().await.is_err());
}
