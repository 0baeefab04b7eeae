//! Firebase Cloud Storage backend.
//!
//! Talks to the Firebase Storage REST API (`/v0/b/<bucket>/o`) with the
//! signed-in user's id-token as a bearer credential:
//!
//! - listing: `GET <endpoint>/b/<bucket>/o?prefix=<prefix>[&pageToken=<token>]`
//!   answers `{"items": [{"name": ..}, ..], "nextPageToken": ..}`;
//! - download: `GET <endpoint>/b/<bucket>/o/<percent-encoded key>?alt=media`
//!   answers the raw object bytes.
//!
//! Nothing is retried. A failed page aborts the listing, a failed download
//! is reported to the caller who decides whether to carry on.

use crate::backend::ObjectKeyStream;
use crate::error::{Error, ErrorKind, Result};
use crate::key::{ObjectKey, Prefix};
use crate::RemoteStore;
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    items: Vec<ListItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListItem {
    // Firebase never omits it in practice, but an item without a name is
    // skipped rather than failing the whole listing.
    name: Option<String>,
}

/// Firebase Cloud Storage backend, scoped to one user's bearer token.
///
/// # Examples
///
/// ```no_run
/// use archeon_storage::{FirebaseStore, Prefix, RemoteStore};
///
/// # async fn example(id_token: String) -> Result<(), Box<dyn std::error::Error>> {
/// let store = FirebaseStore::new(FirebaseStore::DEFAULT_ENDPOINT, "my-app.appspot.com", id_token)?;
/// let keys = store.list(&Prefix::for_user("u1")?).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FirebaseStore {
    name: String,
    client: Client,
    /// `<endpoint>/b/<bucket>/o`
    objects_url: Url,
    token: String,
}
impl FirebaseStore {
    pub const DEFAULT_ENDPOINT: &'static str = "https://firebasestorage.googleapis.com/v0";

    /// Create a store for `bucket` behind `endpoint`, authorised by `token`.
    ///
    /// # Errors
    /// Returns [`InvalidEndpoint`](ErrorKind::InvalidEndpoint) if the endpoint
    /// and bucket don't form a valid URL, or [`Network`](ErrorKind::Network)
    /// if the HTTP client cannot be initialised.
    pub fn new(endpoint: &str, bucket: &str, token: impl Into<String>) -> Result<Self> {
        let raw = format!("{}/b/{}/o", endpoint.trim_end_matches('/'), urlencoding::encode(bucket));
        let objects_url = Url::parse(&raw).or_raise(|| ErrorKind::InvalidEndpoint(raw.clone()))?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .build()
            .map_err(|e| ErrorKind::Network(e.to_string()))?;
        Ok(Self {
            name: format!("firebase:{bucket}"),
            client,
            objects_url,
            token: token.into(),
        })
    }

    /// URL of the listing request for one page.
    fn list_url(&self, prefix: &Prefix, page_token: Option<&str>) -> Url {
        let mut url = self.objects_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("prefix", prefix.as_str());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        url
    }

    /// URL of the media download for one object. The whole key is
    /// percent-encoded as a single path segment, slashes included.
    fn download_url(&self, key: &ObjectKey) -> Result<Url> {
        let raw = format!("{}/{}", self.objects_url.as_str(), urlencoding::encode(key.as_str()));
        let mut url = Url::parse(&raw).or_raise(|| ErrorKind::InvalidKey(key.to_string()))?;
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ErrorKind::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        Ok(response)
    }

    #[instrument(skip_all, fields(backend = %self.name, prefix = %prefix, page_token))]
    async fn list_page(&self, prefix: &Prefix, page_token: Option<&str>) -> Result<ListPage> {
        if let Some(token) = page_token {
            tracing::Span::current().record("page_token", token);
        }
        let inner = async {
            let response = self.get(self.list_url(prefix, page_token)).await?;
            let body = response.bytes().await.map_err(|e| ErrorKind::Network(e.to_string()))?;
            let page: ListPage =
                serde_json::from_slice(&body).map_err(|e| ErrorKind::MalformedResponse(e.to_string()))?;
            Ok::<_, Error>(page)
        };
        inner.await.or_raise(|| ErrorKind::Listing(prefix.to_string()))
    }
}

#[async_trait]
impl RemoteStore for FirebaseStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: &'a Prefix) -> ObjectKeyStream<'a> {
        Box::pin(stream! {
            let mut page_token: Option<String> = None;
            let mut pages: u32 = 0;
            loop {
                let page = match self.list_page(prefix, page_token.as_deref()).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        return;
                    },
                };
                pages += 1;
                tracing::debug!(prefix = %prefix, page = pages, items = page.items.len(), "Listed page of objects");
                for name in page.items.into_iter().filter_map(|item| item.name) {
                    yield Ok(ObjectKey::new(name));
                }
                match page.next_page_token {
                    Some(token) if !token.is_empty() => page_token = Some(token),
                    _ => break,
                }
            }
        })
    }

    #[instrument(skip_all, fields(backend = %self.name, key = %key))]
    async fn download(&self, key: &ObjectKey) -> Result<Vec<u8>> {
        let inner = async {
            let response = self.get(self.download_url(key)?).await?;
            let body = response.bytes().await.map_err(|e| ErrorKind::Network(e.to_string()))?;
            Ok::<_, Error>(body.to_vec())
        };
        let bytes: Vec<u8> = inner.await.or_raise(|| ErrorKind::Download(key.to_string()))?;
        tracing::debug!(bytes = bytes.len(), "Downloaded object");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store(server: &MockServer) -> FirebaseStore {
        FirebaseStore::new(&server.uri(), "bucket", "tok").unwrap()
    }

    fn prefix() -> Prefix {
        Prefix::for_user("u1").unwrap()
    }

    #[test]
    fn test_new_rejects_garbage_endpoint() {
        let err = FirebaseStore::new("not a url", "bucket", "tok").err().unwrap();
        assert!(matches!(&*err, ErrorKind::InvalidEndpoint(_)));
    }

    #[test]
    fn test_download_url_encodes_whole_key() {
        let store = FirebaseStore::new("https://example.test/v0", "bucket", "tok").unwrap();
        let url = store.download_url(&ObjectKey::new("models/u1/my scene.gs")).unwrap();
        assert_eq!(url.as_str(), "https://example.test/v0/b/bucket/o/models%2Fu1%2Fmy%20scene.gs?alt=media");
    }

    #[test]
    fn test_list_url() {
        let store = FirebaseStore::new("https://example.test/v0/", "bucket", "tok").unwrap();
        let url = store.list_url(&prefix(), Some("next"));
        assert_eq!(url.as_str(), "https://example.test/v0/b/bucket/o?prefix=models%2Fu1%2F&pageToken=next");
    }

    #[tokio::test]
    async fn test_list_single_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/bucket/o"))
            .and(query_param("prefix", "models/u1/"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"name": "models/u1/a.gs", "bucket": "bucket"},
                    {"bucket": "bucket"},
                    {"name": "models/u1/b.gs", "bucket": "bucket"},
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        let keys = store(&server).await.list(&prefix()).await.unwrap();
        assert_eq!(keys, vec![ObjectKey::new("models/u1/a.gs"), ObjectKey::new("models/u1/b.gs")]);
    }

    #[tokio::test]
    async fn test_list_without_items_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/bucket/o"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"prefixes": []})))
            .mount(&server)
            .await;
        let keys = store(&server).await.list(&prefix()).await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_list_follows_pagination_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/bucket/o"))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "models/u1/c.gs"}]
            })))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b/bucket/o"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"name": "models/u1/a.gs"}, {"name": "models/u1/b.gs"}],
                "nextPageToken": "p2"
            })))
            .expect(1)
            .mount(&server)
            .await;
        let keys = store(&server).await.list(&prefix()).await.unwrap();
        let keys: Vec<_> = keys.iter().map(ObjectKey::as_str).collect();
        assert_eq!(keys, ["models/u1/a.gs", "models/u1/b.gs", "models/u1/c.gs"]);
    }

    #[tokio::test]
    async fn test_list_error_status_is_listing_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/bucket/o"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;
        let err = store(&server).await.list(&prefix()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Listing(p) if p == "models/u1/"));
    }

    #[tokio::test]
    async fn test_list_malformed_body_is_listing_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/bucket/o"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        let err = store(&server).await.list(&prefix()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Listing(_)));
    }

    #[tokio::test]
    async fn test_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/bucket/o/models%2Fu1%2Fa.gs"))
            .and(query_param("alt", "media"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"splat".to_vec()))
            .expect(1)
            .mount(&server)
            .await;
        let bytes = store(&server).await.download(&ObjectKey::new("models/u1/a.gs")).await.unwrap();
        assert_eq!(bytes, b"splat");
    }

    #[tokio::test]
    async fn test_download_error_status_is_download_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let err = store(&server).await.download(&ObjectKey::new("models/u1/a.gs")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Download(k) if k == "models/u1/a.gs"));
        assert!(!err.is_retryable());
    }
}
