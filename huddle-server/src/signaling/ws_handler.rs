use crate::signaling::SignalRelay;
use crate::transport::Transport;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientEvent, ServerEvent};
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(relay): State<SignalRelay>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: SignalRelay) {
    let (mut sender, mut receiver) = socket.split();
    let (mut transport, mut rx) = relay.connect();

    info!("New WebSocket connection: {}", transport.id());

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to serialize server event: {}", e),
            }
        }
    });

    tokio::select! {
        _ = read_loop(&mut receiver, &relay, &mut transport) => {},
        _ = (&mut send_task) => {},
    };

    relay.on_disconnect(&mut transport);
    send_task.abort();

    info!("WebSocket disconnected: {}", transport.id());
}

/// Все события одного соединения обрабатываются строго по очереди.
async fn read_loop(
    receiver: &mut SplitStream<WebSocket>,
    relay: &SignalRelay,
    transport: &mut Transport,
) {
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => relay.handle_event(transport, event),
                Err(e) => {
                    warn!("Invalid ClientEvent from {}: {:?}", transport.id(), e);
                    transport.send(ServerEvent::Error {
                        message: format!("invalid event: {}", e),
                    });
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }
}
