//! Smart HTTP negotiation client.
//!
//! A negotiation is two sequential requests: ref discovery against
//! `info/refs`, then a single want/done request against `git-upload-pack`.
//! The client always performs a full fetch and never sends `have` lines.

use crate::advertisement::RefAdvertisement;
use crate::bundle::Bundle;
use crate::request::{UploadRequest, DEFAULT_CAPABILITIES};
use crate::sideband;
use crate::transport::{HttpTransport, Transport};
use crate::{GitError, Result};
use knot_storage::ObjectId;
use std::fmt;

/// Upload service name.
pub const UPLOAD_SERVICE: &str = "git-upload-pack";

const ADVERTISEMENT_TYPE: &str = "application/x-git-upload-pack-advertisement";
const REQUEST_TYPE: &str = "application/x-git-upload-pack-request";
const RESULT_TYPE: &str = "application/x-git-upload-pack-result";

/// Negotiation client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// `User-Agent` header value.
    pub user_agent: String,
    /// Per-request timeout; none by default.
    pub timeout_secs: Option<u64>,
    /// Capabilities sent on the want line.
    pub capabilities: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("knot/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: None,
            capabilities: DEFAULT_CAPABILITIES.to_string(),
        }
    }
}

/// Where a negotiation currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationState {
    /// Fetching the ref advertisement.
    RefDiscovery,
    /// Interpreting the advertised refs.
    RefParsing,
    /// Refs are known; the bundle request is next.
    BundleRequest,
    /// Checking the returned bundle header.
    BundleValidation,
    /// A validated bundle was returned.
    Done,
    /// The negotiation stopped on an error.
    Failed(String),
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefDiscovery => write!(f, "ref-discovery"),
            Self::RefParsing => write!(f, "ref-parsing"),
            Self::BundleRequest => write!(f, "bundle-request"),
            Self::BundleValidation => write!(f, "bundle-validation"),
            Self::Done => write!(f, "done"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Result of a full negotiation.
#[derive(Debug, Clone)]
pub struct Negotiation {
    /// Refs the remote advertised.
    pub advertisement: RefAdvertisement,
    /// Bundle for the advertised head.
    pub bundle: Bundle,
}

/// Client for one remote repository.
pub struct RemoteClient<T = HttpTransport> {
    url: String,
    transport: T,
    config: ClientConfig,
    state: NegotiationState,
}

impl RemoteClient<HttpTransport> {
    /// Creates a client that talks HTTP to `url`.
    pub fn connect(url: &str, config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(url, transport, config))
    }
}

impl<T: Transport> RemoteClient<T> {
    /// Creates a client over an arbitrary transport.
    pub fn with_transport(url: &str, transport: T, config: ClientConfig) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            transport,
            config,
            state: NegotiationState::RefDiscovery,
        }
    }

    /// Returns the remote base URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the current negotiation state.
    pub fn state(&self) -> &NegotiationState {
        &self.state
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Discovers and parses the remote's refs.
    pub fn discover_refs(&mut self) -> Result<RefAdvertisement> {
        let result = self.try_discover_refs();
        self.settle(result)
    }

    /// Requests a bundle containing `want` and validates its header.
    pub fn fetch_bundle(&mut self, want: &ObjectId) -> Result<Bundle> {
        let result = self.try_fetch_bundle(want);
        self.settle(result)
    }

    /// Runs a full negotiation for the remote's default head.
    pub fn negotiate(&mut self) -> Result<Negotiation> {
        let advertisement = self.discover_refs()?;
        let bundle = self.fetch_bundle(&advertisement.head)?;
        Ok(Negotiation {
            advertisement,
            bundle,
        })
    }

    fn try_discover_refs(&mut self) -> Result<RefAdvertisement> {
        self.transition(NegotiationState::RefDiscovery);
        let url = format!("{}/info/refs?service={UPLOAD_SERVICE}", self.url);
        let response = self.transport.get(&url, ADVERTISEMENT_TYPE)?;

        if !response.is_ok() {
            return Err(GitError::RemoteRejected {
                status: response.status,
                body: response.body_text(),
            });
        }
        let content_type = response.content_type.clone().unwrap_or_default();
        if !content_type.contains("git-upload-pack-advertisement") {
            return Err(GitError::ProtocolMismatch { content_type });
        }

        self.transition(NegotiationState::RefParsing);
        let advertisement = RefAdvertisement::from_bytes(&response.body)?;
        tracing::info!(
            url = %self.url,
            head = %advertisement.head,
            branch = advertisement.default_branch.as_deref().unwrap_or("(detached)"),
            refs = advertisement.refs.len(),
            "discovered refs"
        );

        self.transition(NegotiationState::BundleRequest);
        Ok(advertisement)
    }

    fn try_fetch_bundle(&mut self, want: &ObjectId) -> Result<Bundle> {
        self.transition(NegotiationState::BundleRequest);
        let body = UploadRequest::new(*want)
            .with_capabilities(self.config.capabilities.clone())
            .encode()?;
        let url = format!("{}/{UPLOAD_SERVICE}", self.url);
        let response = self.transport.post(&url, REQUEST_TYPE, RESULT_TYPE, body)?;

        if !response.is_ok() {
            return Err(GitError::RemoteRejected {
                status: response.status,
                body: response.body_text(),
            });
        }

        self.transition(NegotiationState::BundleValidation);
        let bundle = match sideband::demultiplex(&response.body)? {
            Some(data) => Bundle::locate(&data)?,
            None => Bundle::locate(&response.body)?,
        };
        tracing::info!(
            want = %want,
            version = bundle.version(),
            objects = bundle.object_count(),
            bytes = bundle.len(),
            "received bundle"
        );

        self.transition(NegotiationState::Done);
        Ok(bundle)
    }

    fn transition(&mut self, next: NegotiationState) {
        tracing::debug!(from = %self.state, to = %next, "negotiation");
        self.state = next;
    }

    fn settle<V>(&mut self, result: Result<V>) -> Result<V> {
        if let Err(e) = &result {
            tracing::debug!(error = %e, "negotiation failed");
            self.transition(NegotiationState::Failed(e.to_string()));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpResponse;
    use bytes::Bytes;
    use std::cell::RefCell;

    /// Replays one GET and one POST response.
    struct Scripted {
        get: HttpResponse,
        post: HttpResponse,
        urls: RefCell<Vec<String>>,
    }

    impl Transport for Scripted {
        fn get(&self, url: &str, _accept: &str) -> Result<HttpResponse> {
            self.urls.borrow_mut().push(url.to_string());
            Ok(self.get.clone())
        }

        fn post(
            &self,
            url: &str,
            _content_type: &str,
            _accept: &str,
            _body: Vec<u8>,
        ) -> Result<HttpResponse> {
            self.urls.borrow_mut().push(url.to_string());
            Ok(self.post.clone())
        }
    }

    fn response(status: u16, content_type: &str, body: &[u8]) -> HttpResponse {
        HttpResponse {
            status,
            content_type: Some(content_type.to_string()),
            body: Bytes::copy_from_slice(body),
        }
    }

    fn advertisement() -> Vec<u8> {
        let hex = "ce013625030ba8dba906f756967f9e9ca394464a";
        let line = format!("{hex} HEAD\0symref=HEAD:refs/heads/main\n");
        let main = format!("{hex} refs/heads/main\n");
        format!(
            "001e# service=git-upload-pack\n0000{:04x}{line}{:04x}{main}0000",
            line.len() + 4,
            main.len() + 4
        )
        .into_bytes()
    }

    fn client(get: HttpResponse, post: HttpResponse) -> RemoteClient<Scripted> {
        let transport = Scripted {
            get,
            post,
            urls: RefCell::new(Vec::new()),
        };
        let url = "https://example.com/repo.git/";
        RemoteClient::with_transport(url, transport, ClientConfig::default())
    }

    #[test]
    fn test_negotiate_raw_bundle() {
        let mut client = client(
            response(200, ADVERTISEMENT_TYPE, &advertisement()),
            response(200, RESULT_TYPE, b"0008NAK\nPACK\0\0\0\x02\0\0\0\x00"),
        );
        let negotiation = client.negotiate().unwrap();

        assert_eq!(negotiation.bundle.object_count(), 0);
        assert_eq!(client.state(), &NegotiationState::Done);
        assert_eq!(
            *client.transport().urls.borrow(),
            vec![
                "https://example.com/repo.git/info/refs?service=git-upload-pack".to_string(),
                "https://example.com/repo.git/git-upload-pack".to_string(),
            ]
        );
    }

    #[test]
    fn test_dumb_server() {
        let mut client = client(
            response(200, "text/plain", b"ce01 refs/heads/main\n"),
            response(200, RESULT_TYPE, b""),
        );
        assert!(matches!(
            client.discover_refs(),
            Err(GitError::ProtocolMismatch { .. })
        ));
        assert!(matches!(client.state(), NegotiationState::Failed(_)));
    }

    #[test]
    fn test_missing_content_type() {
        let mut get = response(200, "", &advertisement());
        get.content_type = None;
        let mut client = client(get, response(200, RESULT_TYPE, b""));
        match client.discover_refs() {
            Err(GitError::ProtocolMismatch { content_type }) => assert!(content_type.is_empty()),
            other => panic!("expected protocol mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_upload_rejected() {
        let mut client = client(
            response(200, ADVERTISEMENT_TYPE, &advertisement()),
            response(403, "text/plain", b"forbidden"),
        );
        match client.negotiate() {
            Err(GitError::RemoteRejected { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(matches!(client.state(), NegotiationState::Failed(_)));
    }

    #[test]
    fn test_discovery_rejected() {
        let mut client = client(
            response(404, "text/plain", b"not found"),
            response(200, RESULT_TYPE, b""),
        );
        assert!(matches!(
            client.discover_refs(),
            Err(GitError::RemoteRejected { status: 404, .. })
        ));
    }

    #[test]
    fn test_short_bundle_fails() {
        let mut client = client(
            response(200, ADVERTISEMENT_TYPE, &advertisement()),
            response(200, RESULT_TYPE, b"0008NAK\nPACK\0\0"),
        );
        assert!(matches!(
            client.negotiate(),
            Err(GitError::BundleTooShort { len: 6 })
        ));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(
            NegotiationState::BundleValidation.to_string(),
            "bundle-validation"
        );
        assert_eq!(
            NegotiationState::Failed("boom".to_string()).to_string(),
            "failed: boom"
        );
    }
}
