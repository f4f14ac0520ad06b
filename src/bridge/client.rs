//! TCP client toward the render collaborator.
//!
//! Sends are fire-and-forget: [`BridgeRenderer`] only enqueues onto an
//! unbounded channel, so the tick never waits on the socket. A writer
//! task drains the channel and a reader task logs acknowledgements.
//! Failures are logged and counted, never retried.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::effects::SceneRenderer;
use crate::error::BridgeError;
use crate::observability::events::{Event, EventEmitter};
use crate::observability::metrics;

use super::codec::JsonStreamCodec;
use super::messages::{InboundMessage, OutboundMessage};

/// Connected bridge with its two background tasks.
#[derive(Debug)]
pub struct BridgeClient {
    address: String,
    tx: mpsc::UnboundedSender<OutboundMessage>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

impl BridgeClient {
    /// Connects to `address` within `timeout` and spawns the I/O tasks.
    ///
    /// The tasks stop when `cancel` fires or the peer goes away.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Timeout`] or [`BridgeError::ConnectionFailed`]
    /// when the connection cannot be established.
    pub async fn connect(
        address: &str,
        timeout: Duration,
        cancel: CancellationToken,
        events: Arc<EventEmitter>,
    ) -> Result<Self, BridgeError> {
        let stream = match tokio::time::timeout(timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                metrics::record_bridge_error("connect");
                return Err(BridgeError::ConnectionFailed(format!("{address}: {e}")));
            }
            Err(_) => {
                metrics::record_bridge_error("connect");
                return Err(BridgeError::Timeout(format!(
                    "connecting to {address} took longer than {}",
                    humantime::format_duration(timeout)
                )));
            }
        };
        // best effort: small messages should not wait for Nagle
        let _ = stream.set_nodelay(true);

        info!(address, "render bridge connected");
        events.emit(Event::BridgeConnected {
            timestamp: Utc::now(),
            address: address.to_owned(),
        });

        let (read_half, write_half) = stream.into_split();
        let (tx, rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));
        let cancel = cancel.child_token();

        let writer = tokio::spawn(write_loop(
            write_half,
            rx,
            Arc::clone(&connected),
            cancel.clone(),
        ));
        let reader = tokio::spawn(read_loop(
            read_half,
            address.to_owned(),
            Arc::clone(&connected),
            cancel.clone(),
            events,
        ));

        Ok(Self {
            address: address.to_owned(),
            tx,
            connected,
            cancel,
            writer,
            reader,
        })
    }

    /// Remote address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether both directions are still up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Queues `message`; returns `false` once the writer is gone.
    pub fn send(&self, message: OutboundMessage) -> bool {
        enqueue(&self.tx, &self.connected, message)
    }

    /// A [`SceneRenderer`] that forwards to this bridge.
    #[must_use]
    pub fn renderer(&self) -> BridgeRenderer {
        BridgeRenderer {
            tx: self.tx.clone(),
            connected: Arc::clone(&self.connected),
        }
    }

    /// Flushes queued messages, then stops both tasks.
    pub async fn shutdown(self) {
        let Self {
            tx,
            cancel,
            writer,
            reader,
            ..
        } = self;
        // closing the channel lets the writer drain and exit on its own
        drop(tx);
        let _ = tokio::time::timeout(Duration::from_secs(1), writer).await;
        cancel.cancel();
        let _ = reader.await;
    }
}

fn enqueue(
    tx: &mpsc::UnboundedSender<OutboundMessage>,
    connected: &AtomicBool,
    message: OutboundMessage,
) -> bool {
    if !connected.load(Ordering::SeqCst) {
        return false;
    }
    let kind = message.kind();
    if tx.send(message).is_err() {
        debug!(kind, "bridge writer gone, dropping message");
        return false;
    }
    metrics::record_bridge_message(kind);
    true
}

async fn write_loop(
    write_half: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<OutboundMessage>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    let mut sink = FramedWrite::new(write_half, JsonStreamCodec::new());
    loop {
        let message = tokio::select! {
            () = cancel.cancelled() => break,
            message = rx.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };
        if let Err(e) = sink.send(message).await {
            warn!(error = %e, "render bridge send failed");
            metrics::record_bridge_error("send");
            connected.store(false, Ordering::SeqCst);
            break;
        }
    }
}

async fn read_loop(
    read_half: OwnedReadHalf,
    address: String,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
    events: Arc<EventEmitter>,
) {
    let mut stream = FramedRead::new(read_half, JsonStreamCodec::new());
    let reason = loop {
        let next = tokio::select! {
            () = cancel.cancelled() => break "shutdown".to_owned(),
            next = stream.next() => next,
        };
        match next {
            Some(Ok(InboundMessage::SceneReady { state })) => {
                info!(state = state.as_deref().unwrap_or(""), "render scene ready");
            }
            Some(Ok(InboundMessage::TransitionComplete { state })) => {
                debug!(state = state.as_deref().unwrap_or(""), "render transition complete");
            }
            Some(Ok(InboundMessage::Error { message })) => {
                warn!(message = message.as_deref().unwrap_or(""), "render collaborator error");
            }
            Some(Err(e)) => {
                warn!(error = %e, "render bridge receive failed");
                metrics::record_bridge_error("receive");
                break e.to_string();
            }
            None => break "closed by peer".to_owned(),
        }
    };

    connected.store(false, Ordering::SeqCst);
    info!(address = %address, reason = %reason, "render bridge disconnected");
    events.emit(Event::BridgeDisconnected {
        timestamp: Utc::now(),
        address,
        reason,
    });
}

/// Scene capability backed by the bridge.
#[derive(Debug, Clone)]
pub struct BridgeRenderer {
    tx: mpsc::UnboundedSender<OutboundMessage>,
    connected: Arc<AtomicBool>,
}

impl SceneRenderer for BridgeRenderer {
    fn transition(&self, state: &str, duration: f64) {
        enqueue(
            &self.tx,
            &self.connected,
            OutboundMessage::Transition {
                state: state.to_owned(),
                duration,
            },
        );
    }

    fn progress(&self, phase: usize, progress: f64) {
        enqueue(
            &self.tx,
            &self.connected,
            OutboundMessage::Progress { phase, progress },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connect_refused_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = BridgeClient::connect(
            &addr,
            Duration::from_secs(1),
            CancellationToken::new(),
            Arc::new(EventEmitter::noop()),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::ConnectionFailed(_) | BridgeError::Timeout(_)
        ));
    }

    #[tokio::test]
    async fn renderer_messages_reach_the_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(br#"{"type":"scene_ready","state":"waiting"}"#)
                .await
                .unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let client = BridgeClient::connect(
            &addr,
            Duration::from_secs(2),
            CancellationToken::new(),
            Arc::new(EventEmitter::noop()),
        )
        .await
        .unwrap();
        assert!(client.is_connected());

        let renderer = client.renderer();
        renderer.transition("building_tension", 1.0);
        renderer.progress(2, 0.5);
        client.shutdown().await;

        let received = server.await.unwrap();
        assert_eq!(
            String::from_utf8(received).unwrap(),
            r#"{"type":"transition","state":"building_tension","duration":1.0}{"type":"progress","phase":2,"progress":0.5}"#
        );
    }

    #[tokio::test]
    async fn peer_close_marks_disconnected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let client = BridgeClient::connect(
            &addr,
            Duration::from_secs(2),
            CancellationToken::new(),
            Arc::new(EventEmitter::noop()),
        )
        .await
        .unwrap();
        server.await.unwrap();

        for _ in 0..100 {
            if !client.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!client.is_connected());
        assert!(!client.send(OutboundMessage::Progress {
            phase: 0,
            progress: 0.0
        }));
        client.shutdown().await;
    }
}
