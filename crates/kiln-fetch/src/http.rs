use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Response body of a successful GET.
pub struct RemoteBody<E> {
    /// `None` when the server did not advertise a length.
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, std::result::Result<Bytes, E>>,
}

impl<E> std::fmt::Debug for RemoteBody<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects themselves and must report any non-2xx
/// status as an error rather than returning its body.
///
/// - [`ReqwestClient`]: production implementation using `reqwest`
/// - scripted clients in tests
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(
        &self,
        url: &str,
    ) -> impl Future<Output = std::result::Result<RemoteBody<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use futures_util::StreamExt;

    use super::*;
    use crate::error::{Error, Result};

    const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Production HTTP client backed by `reqwest` with rustls.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// `read_timeout` bounds the gap between two body chunks, not the
        /// whole transfer.
        pub fn build(
            user_agent: Option<&str>,
            read_timeout: Option<Duration>,
        ) -> Result<Self> {
            let mut builder = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT);
            if let Some(agent) = user_agent {
                builder = builder.user_agent(agent.to_string());
            }
            if let Some(timeout) = read_timeout {
                builder = builder.read_timeout(timeout);
            }
            let client = builder
                .build()
                .map_err(|err| Error::Client(err.to_string()))?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(
            &self,
            url: &str,
        ) -> std::result::Result<RemoteBody<Self::Error>, Self::Error> {
            let response = self.client.get(url).send().await?.error_for_status()?;
            let content_length = response.content_length();
            let stream = response.bytes_stream().map(|chunk| chunk.map(Bytes::from));
            Ok(RemoteBody {
                content_length,
                stream: Box::pin(stream),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
