//! HTTP client the coordinator uses to move shards to and from storage nodes
//!
//! The per-attempt timeout bounds connecting to a node and waiting for its
//! response head. Shard bodies stream in both directions without a deadline,
//! so a large shard on a healthy node is never cut off. There is no retry.

use crate::common::{encode_key, Error, Result};
use bytes::Bytes;
use futures_util::stream;
use reqwest::header::CONTENT_LENGTH;
use reqwest::StatusCode;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::oneshot;

/// Upload chunk size when streaming a shard body
const UPLOAD_CHUNK: usize = 64 * 1024;

#[derive(Clone)]
pub struct NodeClient {
    client: reqwest::Client,
    header_timeout: Duration,
}

impl NodeClient {
    pub fn new(header_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(header_timeout)
            .pool_max_idle_per_host(5)
            .build()?;
        Ok(Self {
            client,
            header_timeout,
        })
    }

    fn shard_url(addr: SocketAddr, name: &str) -> String {
        format!("http://{}/?filename={}", addr, encode_key(name))
    }

    /// Wait at most `header_timeout` for `send` to yield the response head.
    async fn await_head<F>(&self, addr: SocketAddr, send: F) -> Result<reqwest::Response>
    where
        F: Future<Output = reqwest::Result<reqwest::Response>>,
    {
        match tokio::time::timeout(self.header_timeout, send).await {
            Ok(resp) => Ok(resp?),
            Err(_) => Err(Error::Timeout(format!(
                "response from {} after {:?}",
                addr, self.header_timeout
            ))),
        }
    }

    /// Store `data` under `name` on the node at `addr`. Expects `204`.
    pub async fn put_shard(&self, addr: SocketAddr, name: &str, data: Bytes) -> Result<()> {
        let len = data.len();
        let (sent_tx, sent_rx) = oneshot::channel();
        let send = self
            .client
            .put(Self::shard_url(addr, name))
            .header(CONTENT_LENGTH, len)
            .body(reqwest::Body::wrap_stream(upload_stream(data, sent_tx)))
            .send();
        tokio::pin!(send);

        // The clock starts once the whole body has been handed to the connection.
        let early = tokio::select! {
            resp = &mut send => Some(resp),
            _ = sent_rx => None,
        };
        let resp = match early {
            Some(resp) => resp?,
            None => self.await_head(addr, send).await?,
        };

        if resp.status() != StatusCode::NO_CONTENT {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UnexpectedStatus { status, body });
        }
        Ok(())
    }

    /// Fetch the bytes stored under `name` on the node at `addr`. Expects `200`.
    pub async fn get_shard(&self, addr: SocketAddr, name: &str) -> Result<Bytes> {
        let send = self.client.get(Self::shard_url(addr, name)).send();
        let resp = self.await_head(addr, send).await?;

        if resp.status() != StatusCode::OK {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::UnexpectedStatus { status, body });
        }
        Ok(resp.bytes().await?)
    }
}

/// Body stream over `data`. `sent` resolves once the connection is done with
/// the body: the stream either runs dry or is dropped after the last byte.
fn upload_stream(
    data: Bytes,
    sent: oneshot::Sender<()>,
) -> impl futures_util::Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(UPLOAD_CHUNK)
        .map(|start| data.slice(start..(start + UPLOAD_CHUNK).min(data.len())))
        .collect();

    stream::unfold(
        (chunks.into_iter(), Some(sent)),
        |(mut chunks, mut sent)| async move {
            match chunks.next() {
                Some(chunk) => Some((Ok(chunk), (chunks, sent))),
                None => {
                    if let Some(tx) = sent.take() {
                        let _ = tx.send(());
                    }
                    None
                }
            }
        },
    )
}
