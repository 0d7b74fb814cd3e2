//! WebSocket transport over `tokio-tungstenite`.
//!
//! A single [`connect`] builds the request, negotiates TLS when the URL asks
//! for it, and returns split halves that implement the client's transport
//! traits.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::{self, Message};

use chatrelay_core::error::{RelayError, Result};

use super::{FrameSink, FrameSource, TransportEvent};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Write half of a WebSocket connection.
pub struct WsSink {
    sink: SplitSink<WsStream, Message>,
}

/// Read half of a WebSocket connection.
pub struct WsSource {
    stream: SplitStream<WsStream>,
}

/// Open a WebSocket connection to `url`.
pub async fn connect(url: &str) -> Result<(WsSink, WsSource)> {
    use tungstenite::client::IntoClientRequest;

    let request = url
        .into_client_request()
        .map_err(|e| RelayError::Transport(format!("invalid websocket url {url}: {e}")))?;

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| RelayError::Transport(format!("websocket connect failed: {e}")))?;

    let (sink, stream) = ws_stream.split();
    Ok((WsSink { sink }, WsSource { stream }))
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|e| RelayError::Transport(format!("websocket send failed: {e}")))
    }

    async fn close(&mut self) -> Result<()> {
        self.sink
            .close()
            .await
            .map_err(|e| RelayError::Transport(format!("websocket close failed: {e}")))
    }
}

#[async_trait]
impl FrameSource for WsSource {
    async fn recv(&mut self) -> Option<TransportEvent> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(TransportEvent::Text(text)),
                Ok(Message::Binary(data)) => return Some(TransportEvent::Binary(data)),
                Ok(Message::Close(frame)) => {
                    let (code, reason) = frame
                        .map(|cf| (Some(u16::from(cf.code)), cf.reason.to_string()))
                        .unwrap_or((None, String::new()));
                    return Some(TransportEvent::Closed { code, reason });
                }
                // tungstenite answers pings itself; raw frames never surface on read.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(e) => return Some(TransportEvent::Error(e.to_string())),
            }
        }
    }
}
