//! Resource fetching.
//!
//! In a browser, a library is loaded by injecting a `<link>` or `<script>`
//! element. Here the network side of that is a [`ResourceFetcher`]; the
//! document side is handled by the [`Injector`](crate::inject::Injector).
//!
//! Fetch futures are `'static` so a load can keep running in the background
//! after a race has already been decided.

use bytes::Bytes;
use futures::future::BoxFuture;

use assetboot_core::AssetKind;

use crate::error::FetchError;

/// Asynchronous access to local and CDN resources.
pub trait ResourceFetcher: Send + Sync + 'static {
    /// Lightweight existence check. Succeeds on any response, whatever its
    /// status; fails only when no response arrives.
    fn head(&self, url: &str) -> BoxFuture<'static, Result<(), FetchError>>;

    /// Fetch a resource body. Non-success statuses are errors.
    fn fetch(&self, url: &str, kind: AssetKind) -> BoxFuture<'static, Result<Bytes, FetchError>>;
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use super::*;
    use futures::FutureExt;
    use reqwest::header::{ACCEPT, CACHE_CONTROL};
    use url::Url;

    /// [`ResourceFetcher`] backed by `reqwest`.
    ///
    /// Relative paths are resolved against the page URL, so `/css/x.css`
    /// goes to the device and absolute CDN URLs are used as-is.
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        client: reqwest::Client,
        base: Url,
    }

    impl HttpFetcher {
        /// Create a fetcher with a default client.
        pub fn new(base: Url) -> Result<Self, FetchError> {
            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| FetchError::Network {
                    url: base.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(Self::with_client(client, base))
        }

        pub fn with_client(client: reqwest::Client, base: Url) -> Self {
            Self { client, base }
        }

        pub fn base(&self) -> &Url {
            &self.base
        }

        fn resolve(&self, url: &str) -> Result<Url, FetchError> {
            self.base.join(url).map_err(|e| FetchError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })
        }
    }

    fn accept_for(kind: AssetKind) -> &'static str {
        match kind {
            AssetKind::Stylesheet => "text/css,*/*;q=0.1",
            AssetKind::Script | AssetKind::Module => "application/javascript,*/*;q=0.1",
        }
    }

    impl ResourceFetcher for HttpFetcher {
        fn head(&self, url: &str) -> BoxFuture<'static, Result<(), FetchError>> {
            let client = self.client.clone();
            let resolved = self.resolve(url);
            async move {
                let url = resolved?;
                client
                    .head(url.clone())
                    .header(CACHE_CONTROL, "no-cache")
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|e| FetchError::Network {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })
            }
            .boxed()
        }

        fn fetch(&self, url: &str, kind: AssetKind) -> BoxFuture<'static, Result<Bytes, FetchError>> {
            let client = self.client.clone();
            let resolved = self.resolve(url);
            async move {
                let url = resolved?;
                let network = |e: reqwest::Error| FetchError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                };

                let response = client
                    .get(url.clone())
                    .header(ACCEPT, accept_for(kind))
                    .send()
                    .await
                    .map_err(network)?;

                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }

                response.bytes().await.map_err(network)
            }
            .boxed()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_resolves_against_page_url() {
            let fetcher = HttpFetcher::new(Url::parse("http://silvia.local/index.html").unwrap())
                .unwrap();
            assert_eq!(
                fetcher.resolve("/css/x.css").unwrap().as_str(),
                "http://silvia.local/css/x.css"
            );
            assert_eq!(
                fetcher.resolve("https://unpkg.com/a.js").unwrap().as_str(),
                "https://unpkg.com/a.js"
            );
        }

        #[tokio::test]
        async fn test_connection_refused_is_network_error() {
            let closed = {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                listener.local_addr().unwrap()
            };
            let base = Url::parse(&format!("http://{}/", closed)).unwrap();
            let fetcher = HttpFetcher::new(base).unwrap();
            let err = fetcher.head("/css/x.css").await.unwrap_err();
            assert!(matches!(err, FetchError::Network { .. }));
        }
    }
}
