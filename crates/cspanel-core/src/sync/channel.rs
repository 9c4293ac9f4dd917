//! Push channel transport
//!
//! [`ChannelConnector::open`] resolving is the channel's "open" signal;
//! [`PushChannel::next_frame`] then yields text frames, a transport error, or
//! `None` once the peer has closed the connection.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

/// An open push channel
#[async_trait]
pub trait PushChannel: Send {
    /// Wait for the next text frame
    ///
    /// `None` means the channel was closed by the peer.
    async fn next_frame(&mut self) -> Option<SyncResult<String>>;

    /// Close the channel. Closing twice is a no-op.
    async fn close(&mut self);
}

/// Opens push channels
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    async fn open(&self, url: &str) -> SyncResult<Box<dyn PushChannel>>;
}

/// WebSocket connector backed by tokio-tungstenite
#[derive(Debug, Default, Clone)]
pub struct WebSocketConnector;

#[async_trait]
impl ChannelConnector for WebSocketConnector {
    async fn open(&self, url: &str) -> SyncResult<Box<dyn PushChannel>> {
        debug!("Connecting to {}", url);
        let (stream, _response) = connect_async(url)
            .await
            .map_err(|e| SyncError::Channel {
                url: url.to_string(),
                details: e.to_string(),
            })?;

        Ok(Box::new(WebSocketChannel {
            url: url.to_string(),
            stream,
            closed: false,
        }))
    }
}

/// WebSocket push channel
pub struct WebSocketChannel {
    url: String,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

#[async_trait]
impl PushChannel for WebSocketChannel {
    async fn next_frame(&mut self) -> Option<SyncResult<String>> {
        if self.closed {
            return None;
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => warn!(url = %self.url, "ignoring non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(url = %self.url, ?frame, "peer closed push channel");
                    return None;
                }
                None => return None,
                // Ping/pong are answered by tungstenite itself
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Some(Err(SyncError::Channel {
                        url: self.url.clone(),
                        details: e.to_string(),
                    }));
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        // The peer may already be gone after an error or close frame
        if let Err(e) = self.stream.close(None).await {
            debug!(url = %self.url, error = %e, "push channel close");
        }
    }
}
