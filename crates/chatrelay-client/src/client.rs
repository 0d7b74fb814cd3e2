//! Protocol client: one connection, its lifecycle, and inbound dispatch.
//!
//! Lifecycle: `Idle -> Connecting -> Active -> Closed`.
//! - The `DECLARATION` frame is written before the client reports `Active`;
//!   the server cannot route to a client that has not declared.
//! - One reader task per connection handles inbound frames strictly in order.
//!   Pings are answered inline and never reach the consumer. Deliveries are
//!   surfaced first and acknowledged with `MESSAGE OK` right after.
//! - Outbound writes share one async lock. Teardown clears the sink under that
//!   lock, so pending senders fail with `NotConnected` instead of hanging.
//! - Every attach gets a fresh link id. A reader only writes through, and only
//!   tears down, the link it was started for, so a re-attach right after
//!   `disconnect` cannot be closed by the previous connection's reader.
//! - No reconnection here: that policy belongs to the caller.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::time::timeout;

use chatrelay_core::error::{RelayError, Result};
use chatrelay_core::media::{self, MediaTag};
use chatrelay_core::protocol::{codec, ContentKind, ControlWord, Envelope, MessageKind};

use crate::transport::{ws, FrameSink, FrameSource, TransportEvent};

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Idle,
    Connecting,
    Active,
    Closed,
}

/// Typed events delivered to the consumer, in connection order.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Declaration sent; the client is active.
    Opened,
    /// Any envelope other than a ping.
    Message(Envelope),
    /// Decoded media payload of a delivered image/audio/video message.
    /// Always follows the matching `Message`.
    Media {
        tag: MediaTag,
        emitter: String,
        data: Bytes,
        /// Advisory file extension (magic-byte sniffing).
        extension: &'static str,
    },
    /// Transport failure, reported before the `Closed` it causes.
    Error(String),
    /// Emitted exactly once per connection.
    Closed { code: Option<u16>, reason: String },
}

/// Tunables for a client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Upper bound on a single outbound write.
    pub send_timeout: Duration,
    /// Capacity of the event channel handed to the consumer.
    pub event_buffer: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_millis(5000),
            event_buffer: 1024,
        }
    }
}

/// Close code reported when the client hangs up itself.
const CLIENT_DISCONNECT_CODE: u16 = 1000;
const CLOSE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Handle to one relay connection. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct RelayClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    username: String,
    opts: ClientOptions,
    state: watch::Sender<ConnState>,
    writer: Mutex<Option<Link>>,
    /// Id of the most recently installed link.
    current: AtomicU64,
    next_link: AtomicU64,
}

/// Write half of one attached connection.
struct Link {
    id: u64,
    sink: Box<dyn FrameSink>,
    /// Dropped with the link; wakes that connection's reader.
    _cancel: oneshot::Sender<()>,
}

impl RelayClient {
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_options(username, ClientOptions::default())
    }

    pub fn with_options(username: impl Into<String>, opts: ClientOptions) -> Self {
        let (state, _) = watch::channel(ConnState::Idle);
        Self {
            inner: Arc::new(ClientInner {
                username: username.into(),
                opts,
                state,
                writer: Mutex::new(None),
                current: AtomicU64::new(0),
                next_link: AtomicU64::new(1),
            }),
        }
    }

    pub fn username(&self) -> &str {
        &self.inner.username
    }

    pub fn state(&self) -> ConnState {
        *self.inner.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnState::Active
    }

    /// Dial `url` over WebSocket and run the handshake.
    pub async fn connect(&self, url: &str) -> Result<mpsc::Receiver<ClientEvent>> {
        self.inner.begin_connecting()?;
        tracing::info!(user = %self.inner.username, %url, "connecting");

        match ws::connect(url).await {
            Ok((sink, source)) => self.attach(sink, source).await,
            Err(e) => {
                self.inner.state.send_replace(ConnState::Closed);
                Err(e)
            }
        }
    }

    /// Run the handshake over an already-open transport and start the reader.
    ///
    /// Returns the event channel; it yields `Opened` first and `Closed` last.
    pub async fn attach<S, R>(&self, sink: S, source: R) -> Result<mpsc::Receiver<ClientEvent>>
    where
        S: FrameSink + 'static,
        R: FrameSource + 'static,
    {
        if self.state() != ConnState::Connecting {
            self.inner.begin_connecting()?;
        }

        let mut sink: Box<dyn FrameSink> = Box::new(sink);
        let declaration = codec::encode(&Envelope::declaration(&self.inner.username))?;
        let declared = match timeout(self.inner.opts.send_timeout, sink.send_text(declaration)).await
        {
            Ok(r) => r,
            Err(_) => Err(RelayError::Transport("declaration timed out".into())),
        };
        if let Err(e) = declared {
            self.inner.state.send_replace(ConnState::Closed);
            let _ = timeout(CLOSE_TIMEOUT, sink.close()).await;
            return Err(e);
        }

        let id = self.inner.next_link.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        {
            let mut guard = self.inner.writer.lock().await;
            *guard = Some(Link { id, sink, _cancel: cancel_tx });
            // Published before `Active` so a stale reader never sees its own id as current.
            self.inner.current.store(id, Ordering::SeqCst);
        }
        self.inner.state.send_replace(ConnState::Active);
        tracing::info!(user = %self.inner.username, link = id, "declared, connection active");

        let (tx, rx) = mpsc::channel(self.inner.opts.event_buffer.max(1));
        let _ = tx.send(ClientEvent::Opened).await;

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run_reader(id, Box::new(source), cancel_rx, tx).await });

        Ok(rx)
    }

    /// Send a text message to `dest`.
    pub async fn send_text(&self, dest: &str, text: &str) -> Result<()> {
        self.send_envelope(Envelope::new(
            MessageKind::Send(ContentKind::Text),
            self.inner.username.as_str(),
            dest,
            text,
        ))
        .await
    }

    /// Send raw media bytes to `dest` under `tag`.
    pub async fn send_media(&self, tag: MediaTag, dest: &str, raw: &[u8]) -> Result<()> {
        self.send_envelope(Envelope::new(
            MessageKind::Send(ContentKind::from(tag)),
            self.inner.username.as_str(),
            dest,
            media::encode(tag, raw),
        ))
        .await
    }

    pub async fn send_image(&self, dest: &str, raw: &[u8]) -> Result<()> {
        self.send_media(MediaTag::Image, dest, raw).await
    }

    pub async fn send_audio(&self, dest: &str, raw: &[u8]) -> Result<()> {
        self.send_media(MediaTag::Audio, dest, raw).await
    }

    pub async fn send_video(&self, dest: &str, raw: &[u8]) -> Result<()> {
        self.send_media(MediaTag::Video, dest, raw).await
    }

    /// Read a file and send it as media, picking the tag from its extension.
    pub async fn send_file(&self, dest: &str, path: &Path) -> Result<MediaTag> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let tag = MediaTag::from_extension(ext)
            .ok_or_else(|| RelayError::Decode(format!("unsupported media file type: {ext:?}")))?;
        self.send_file_as(tag, dest, path).await?;
        Ok(tag)
    }

    /// Read a file and send it as media under an explicit tag.
    pub async fn send_file_as(&self, tag: MediaTag, dest: &str, path: &Path) -> Result<()> {
        self.inner.ensure_active()?;
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| RelayError::Internal(format!("read {} failed: {e}", path.display())))?;
        self.send_media(tag, dest, &raw).await
    }

    /// Ask the server for the current roster (answered with `RECEPTION_CLIENT_LIST`).
    pub async fn request_client_list(&self) -> Result<()> {
        self.send_envelope(Envelope::new(
            MessageKind::Send(ContentKind::ClientList),
            self.inner.username.as_str(),
            "",
            "",
        ))
        .await
    }

    /// Send `Disconnect` and close the transport.
    pub async fn disconnect(&self) -> Result<()> {
        self.inner.ensure_active()?;
        let id = self.inner.current.load(Ordering::SeqCst);
        let sent = self
            .inner
            .write_on(Some(id), &Envelope::control(&self.inner.username, ControlWord::Disconnect))
            .await;
        self.inner.state.send_replace(ConnState::Closed);
        self.inner.close_sink(id).await;
        tracing::info!(user = %self.inner.username, "disconnected");
        sent
    }

    async fn send_envelope(&self, env: Envelope) -> Result<()> {
        self.inner.ensure_active()?;
        self.inner.write(&env).await
    }
}

impl ClientInner {
    fn begin_connecting(&self) -> Result<()> {
        let mut rejected = None;
        self.state.send_if_modified(|s| match *s {
            ConnState::Idle | ConnState::Closed => {
                *s = ConnState::Connecting;
                true
            }
            other => {
                rejected = Some(other);
                false
            }
        });
        match rejected {
            None => Ok(()),
            Some(state) => Err(RelayError::Internal(format!(
                "cannot connect while {state:?}"
            ))),
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if *self.state.borrow() == ConnState::Active {
            Ok(())
        } else {
            Err(RelayError::NotConnected)
        }
    }

    /// Serialized, bounded write. Fails fast once the connection is torn down.
    async fn write(&self, env: &Envelope) -> Result<()> {
        self.write_on(None, env).await
    }

    /// Write through the current link, or only through link `id` when given.
    async fn write_on(&self, id: Option<u64>, env: &Envelope) -> Result<()> {
        let frame = codec::encode(env)?;
        let mut closed = self.state.subscribe();

        let mut guard = self.writer.lock().await;
        let link = match guard.as_mut() {
            Some(link) if id.map_or(true, |id| link.id == id) => link,
            _ => return Err(RelayError::NotConnected),
        };

        tokio::select! {
            res = timeout(self.opts.send_timeout, link.sink.send_text(frame)) => match res {
                Ok(r) => r,
                Err(_) => Err(RelayError::Transport("send timed out".into())),
            },
            _ = wait_closed(&mut closed) => Err(RelayError::NotConnected),
        }
    }

    /// Take and close link `id` if it is still installed.
    async fn close_sink(&self, id: u64) {
        let link = {
            let mut guard = self.writer.lock().await;
            match guard.as_ref() {
                Some(link) if link.id == id => guard.take(),
                _ => None,
            }
        };
        if let Some(mut link) = link {
            match timeout(CLOSE_TIMEOUT, link.sink.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::debug!(error = %e, "transport close failed"),
                Err(_) => tracing::debug!("transport close timed out"),
            }
        }
    }

    async fn run_reader(
        self: Arc<Self>,
        id: u64,
        mut source: Box<dyn FrameSource>,
        mut cancel: oneshot::Receiver<()>,
        events: mpsc::Sender<ClientEvent>,
    ) {
        let (code, reason) = loop {
            tokio::select! {
                biased;
                // Link taken by `disconnect` (or replaced): stop before reading more.
                _ = &mut cancel => {
                    break (Some(CLIENT_DISCONNECT_CODE), "client disconnect".to_string());
                }
                ev = source.recv() => match ev {
                    Some(TransportEvent::Text(text)) => {
                        self.handle_frame(id, codec::decode(&text), &events).await;
                    }
                    Some(TransportEvent::Binary(data)) => {
                        self.handle_frame(id, codec::decode_bytes(&data), &events).await;
                    }
                    Some(TransportEvent::Closed { code, reason }) => break (code, reason),
                    Some(TransportEvent::Error(err)) => {
                        tracing::warn!(user = %self.username, error = %err, "transport error");
                        notify(&events, ClientEvent::Error(err.clone())).await;
                        break (None, err);
                    }
                    None => break (None, "transport closed".to_string()),
                },
            }
        };

        // Only the reader of the live link may mark the client closed.
        self.state.send_if_modified(|s| {
            let live = *s == ConnState::Active && self.current.load(Ordering::SeqCst) == id;
            if live {
                *s = ConnState::Closed;
            }
            live
        });
        self.close_sink(id).await;
        tracing::info!(user = %self.username, link = id, ?code, %reason, "connection closed");
        notify(&events, ClientEvent::Closed { code, reason }).await;
    }

    async fn handle_frame(
        &self,
        id: u64,
        decoded: Result<Envelope>,
        events: &mpsc::Sender<ClientEvent>,
    ) {
        let env = match decoded {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(user = %self.username, error = %e, "dropping undecodable frame");
                return;
            }
        };

        if env.control_word() == Some(ControlWord::Ping) {
            let pong = Envelope::control(&self.username, ControlWord::Pong);
            if let Err(e) = self.write_on(Some(id), &pong).await {
                tracing::warn!(user = %self.username, error = %e, "pong failed");
            }
            return;
        }

        let needs_ack = env.kind.requires_ack();
        let media_event = if needs_ack { decode_media(&env) } else { None };

        notify(events, ClientEvent::Message(env)).await;
        if let Some(ev) = media_event {
            notify(events, ev).await;
        }

        if needs_ack {
            if let Err(e) = self
                .write_on(Some(id), &Envelope::control(&self.username, ControlWord::MessageOk))
                .await
            {
                tracing::warn!(user = %self.username, error = %e, "ack failed");
            }
        }
    }
}

fn decode_media(env: &Envelope) -> Option<ClientEvent> {
    let tag = env.kind.media_tag()?;
    let value = env.value.as_text()?;
    match media::decode(value, tag) {
        Ok(data) => Some(ClientEvent::Media {
            tag,
            emitter: env.emitter.clone(),
            extension: media::suggested_extension(tag, &data),
            data,
        }),
        Err(e) => {
            tracing::warn!(emitter = %env.emitter, error = %e, "dropping undecodable media payload");
            None
        }
    }
}

async fn notify(events: &mpsc::Sender<ClientEvent>, ev: ClientEvent) {
    if events.send(ev).await.is_err() {
        tracing::debug!("event receiver dropped");
    }
}

async fn wait_closed(rx: &mut watch::Receiver<ConnState>) {
    let _closed = rx.wait_for(|s| *s == ConnState::Closed).await.is_ok();
}
