//! Negotiation over real HTTP against a local mock server.

use knot_git::{
    parse_pkt_lines, ClientConfig, GitError, Negotiation, PktLine, PktLineWriter, RemoteClient,
    Result, UploadRequest,
};
use knot_storage::{sha1_digest, ObjectId};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ADVERTISEMENT: &str = "application/x-git-upload-pack-advertisement";
const REQUEST: &str = "application/x-git-upload-pack-request";
const RESULT: &str = "application/x-git-upload-pack-result";

fn advertisement(head: &ObjectId) -> Vec<u8> {
    let mut writer = PktLineWriter::new(Vec::new());
    writer.write_line("# service=git-upload-pack").unwrap();
    writer.flush_pkt().unwrap();
    let head_line = format!("{head} HEAD\0side-band-64k symref=HEAD:refs/heads/main");
    writer.write_line(&head_line).unwrap();
    writer.write_line(&format!("{head} refs/heads/main")).unwrap();
    writer.flush_pkt().unwrap();
    writer.into_inner()
}

fn side_band_pack(count: u32) -> Vec<u8> {
    let mut pack = b"PACK".to_vec();
    pack.extend_from_slice(&2u32.to_be_bytes());
    pack.extend_from_slice(&count.to_be_bytes());

    let mut band = vec![1u8];
    band.extend_from_slice(&pack);
    let mut writer = PktLineWriter::new(Vec::new());
    writer.write_line("NAK").unwrap();
    writer.write_data(&band).unwrap();
    writer.flush_pkt().unwrap();
    writer.into_inner()
}

/// Runs the blocking client off the async runtime that drives the server.
async fn negotiate(url: String) -> Result<Negotiation> {
    tokio::task::spawn_blocking(move || {
        let mut client = RemoteClient::connect(&url, ClientConfig::default())?;
        client.negotiate()
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_negotiate_over_http() {
    let server = MockServer::start().await;
    let head = sha1_digest(b"main");

    let refs = ResponseTemplate::new(200).set_body_raw(advertisement(&head), ADVERTISEMENT);
    Mock::given(method("GET"))
        .and(path("/alice/repo/info/refs"))
        .and(query_param("service", "git-upload-pack"))
        .and(header("accept", ADVERTISEMENT))
        .respond_with(refs)
        .expect(1)
        .mount(&server)
        .await;

    let pack = ResponseTemplate::new(200).set_body_raw(side_band_pack(4), RESULT);
    Mock::given(method("POST"))
        .and(path("/alice/repo/git-upload-pack"))
        .and(header("content-type", REQUEST))
        .and(header("accept", RESULT))
        .respond_with(pack)
        .expect(1)
        .mount(&server)
        .await;

    let negotiation = negotiate(format!("{}/alice/repo/", server.uri()))
        .await
        .unwrap();
    assert_eq!(negotiation.advertisement.head, head);
    assert_eq!(negotiation.bundle.object_count(), 4);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    let agent = requests[0].headers.get("user-agent").unwrap();
    assert!(agent.to_str().unwrap().starts_with("knot/"));

    let body = &requests[1].body;
    assert_eq!(body, &UploadRequest::new(head).encode().unwrap());
    let sent = parse_pkt_lines(body).unwrap();
    assert_eq!(sent.len(), 3);
    let want = sent[0].as_str().unwrap();
    assert!(want.starts_with(&format!("want {head} ")));
    assert!(sent[1].is_flush());
    assert_eq!(sent[2], PktLine::from_string("done\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dumb_server_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repo/info/refs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ce01 HEAD\n"))
        .mount(&server)
        .await;

    let result = negotiate(format!("{}/repo", server.uri())).await;
    match result {
        Err(GitError::ProtocolMismatch { content_type }) => {
            assert!(content_type.starts_with("text/plain"));
        }
        other => panic!("expected protocol mismatch, got {other:?}"),
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_repository() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone/info/refs"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    let result = negotiate(format!("{}/gone", server.uri())).await;
    match result {
        Err(GitError::RemoteRejected { status, body }) => {
            assert_eq!(status, 404);
            assert_eq!(body, "not found");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}
