use crate::engine::{EngineConfig, ParticipantEngine};
use crate::error::ClientError;
use crate::media::MediaCapability;
use crate::negotiation::PeerEventSender;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientEvent, ServerEvent, SignalPayload};
use std::future::Future;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Typed ends of a signaling WebSocket.
pub struct SignalingChannel {
    pub outbound: mpsc::UnboundedSender<ClientEvent<SignalPayload>>,
    pub inbound: mpsc::UnboundedReceiver<ServerEvent>,
}

/// Открывает WebSocket к серверу сигнализации и запускает задачи чтения и записи.
pub async fn connect(url: &str) -> Result<SignalingChannel, ClientError> {
    let (ws_stream, _) = connect_async(url).await?;
    info!("WS Open: {}", url);

    let (mut sink, mut stream) = ws_stream.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ClientEvent<SignalPayload>>();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize client event: {}", e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(json.into())).await {
                warn!("WS send failed: {}", e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    warn!("WS receive failed: {}", e);
                    break;
                }
            };
            debug!("WS IN: {}", text.as_str());
            match serde_json::from_str::<ServerEvent>(text.as_str()) {
                Ok(event) => {
                    if inbound_tx.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("JSON Error: {}. Text: {}", e, text.as_str()),
            }
        }
        info!("WS Closed");
    });

    Ok(SignalingChannel {
        outbound: outbound_tx,
        inbound: inbound_rx,
    })
}

impl<C: MediaCapability> ParticipantEngine<C> {
    /// Connects to `config.url` and joins `config.room`.
    pub async fn connect(
        capability: C,
        config: EngineConfig,
        events: PeerEventSender<C::Track>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ServerEvent>), ClientError> {
        let channel = connect(&config.url).await?;
        let engine = Self::join(capability, config, channel.outbound, events).await?;
        Ok((engine, channel.inbound))
    }

    /// Drives the engine until `shutdown` resolves or the relay goes away.
    pub async fn run(
        &mut self,
        inbound: &mut mpsc::UnboundedReceiver<ServerEvent>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), ClientError> {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    self.leave().await;
                    return Ok(());
                }
                event = inbound.recv() => match event {
                    Some(event) => self.handle_server_event(event),
                    None => {
                        warn!("Signaling channel closed");
                        self.close_sessions().await;
                        return Err(ClientError::Disconnected);
                    }
                },
            }
        }
    }
}
