use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::{SinkExt, StreamExt};
use logmate_core::{decode_event, EventDecodeError, StreamEvent};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::reconciler::ReconcilerHandle;
use crate::StreamError;

/// The single long-lived connection the service pushes status events on.
///
/// Opened once; [`StatusStream::close`] consumes the value so the connection
/// is closed exactly once.
pub struct StatusStream {
    url: Url,
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// Set once the server sent its close frame or the connection dropped.
    peer_closed: bool,
}

impl StatusStream {
    pub async fn open(url: &Url) -> Result<Self, StreamError> {
        let (ws, _response) = connect_async(url.as_str())
            .await
            .map_err(StreamError::Connect)?;
        engine_info!("Status stream connected to {}", url);
        Ok(Self {
            url: url.clone(),
            ws,
            peer_closed: false,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Next well-formed event. Malformed messages are logged and skipped;
    /// `None` once the peer closes or the connection fails.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.peer_closed {
            return None;
        }
        loop {
            let frame = match self.ws.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(err)) => {
                    engine_warn!("Status stream read failed: {}", err);
                    self.peer_closed = true;
                    return None;
                }
                None => {
                    self.peer_closed = true;
                    return None;
                }
            };
            match frame {
                Message::Text(text) => match decode_event(&text) {
                    Ok(event) => return Some(event),
                    Err(EventDecodeError::MissingTaskId) => {
                        engine_warn!("Dropping status message without task_id: {}", text);
                    }
                    Err(err) => {
                        engine_warn!("Dropping status message: {}", err);
                    }
                },
                Message::Close(frame) => {
                    engine_info!("Status stream closed by server: {:?}", frame);
                    self.peer_closed = true;
                    return None;
                }
                other => {
                    engine_debug!("Ignoring non-text frame ({} bytes)", other.len());
                }
            }
        }
    }

    /// Ends the connection. After a server-initiated close only the queued
    /// close reply is flushed.
    pub async fn close(mut self) -> Result<(), StreamError> {
        if self.peer_closed {
            if let Err(err) = self.ws.flush().await {
                engine_debug!("Close reply to {} not delivered: {}", self.url, err);
            }
            engine_info!("Status stream to {} closed", self.url);
            return Ok(());
        }
        match self.ws.close(None).await {
            Ok(()) => {
                engine_info!("Status stream to {} closed", self.url);
                Ok(())
            }
            Err(err) if is_already_closed(&err) => {
                engine_info!("Status stream to {} was already closed", self.url);
                Ok(())
            }
            Err(err) => Err(StreamError::Closed(err)),
        }
    }
}

fn is_already_closed(err: &WsError) -> bool {
    matches!(
        err,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Protocol(ProtocolError::SendAfterClosing)
    )
}

/// Background task forwarding stream events into the reconciler.
pub struct StreamPump {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<Result<usize, StreamError>>,
}

impl StreamPump {
    pub fn spawn(stream: StatusStream, handle: ReconcilerHandle) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(pump(stream, handle, stop_rx));
        Self { stop_tx, task }
    }

    /// True once the connection has ended on its own or the pump was stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops forwarding, closes the connection and returns how many events
    /// were applied.
    pub async fn stop(self) -> Result<usize, StreamError> {
        let _ = self.stop_tx.send(());
        match self.task.await {
            Ok(result) => result,
            Err(join_err) => {
                engine_warn!("Status stream task ended abnormally: {}", join_err);
                Ok(0)
            }
        }
    }
}

async fn pump(
    mut stream: StatusStream,
    handle: ReconcilerHandle,
    mut stop_rx: oneshot::Receiver<()>,
) -> Result<usize, StreamError> {
    let mut applied = 0;
    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            next = stream.next_event() => match next {
                Some(event) => {
                    if handle.apply(event).is_err() {
                        break;
                    }
                    applied += 1;
                }
                None => {
                    // TODO: reconnect with backoff and a "since" cursor once the service can replay events.
                    engine_warn!("Status stream ended; no reconnect is attempted");
                    break;
                }
            },
        }
    }
    stream.close().await?;
    Ok(applied)
}
