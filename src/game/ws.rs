use super::messages::{ClientMessage, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

/// Per-connection context: which player this socket authenticated as.
pub struct ConnectionContext {
    pub player_id: Option<String>,
}

impl ConnectionContext {
    pub fn new() -> Self {
        Self { player_id: None }
    }
}

impl Default for ConnectionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Message dispatch and disconnect handling, decoupled from the socket
/// plumbing so the lobby logic stays testable without a live connection.
/// The sender handed to `handle_disconnect` identifies which socket went
/// away; a drop from a superseded socket must not touch the player.
pub trait ConnectionHandler: Send + Sync + 'static {
    fn handle_message(
        self: Arc<Self>,
        msg: ClientMessage,
        tx: broadcast::Sender<ServerMessage>,
        ctx: &mut ConnectionContext,
    ) -> impl Future<Output = ()> + Send;

    fn handle_disconnect(&self, player_id: &str, tx: &broadcast::Sender<ServerMessage>);
}

/// Run one WebSocket connection: split the socket, pump the broadcast
/// channel into the sink, feed incoming frames to the handler, and notify
/// the handler once either side goes away.
pub async fn run_connection<H: ConnectionHandler>(socket: WebSocket, handler: Arc<H>) {
    info!("New WebSocket connection");
    let (mut sender, receiver) = socket.split();
    let (tx, mut rx) = broadcast::channel::<ServerMessage>(32);

    let mut send_task = tokio::spawn(async move {
        while let Ok(msg) = rx.recv().await {
            debug!(?msg, "Sending message to client");
            let Ok(json) = serde_json::to_string(&msg) else {
                continue;
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let ctx = Arc::new(Mutex::new(ConnectionContext::new()));
    let mut recv_task = tokio::spawn(receive_loop(
        receiver,
        tx.clone(),
        handler.clone(),
        ctx.clone(),
    ));

    // Whichever side finishes first takes the whole connection down
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    let player_id = ctx.lock().await.player_id.take();
    if let Some(player_id) = player_id {
        handler.handle_disconnect(&player_id, &tx);
    }

    info!("WebSocket connection closed");
}

async fn receive_loop<H: ConnectionHandler>(
    mut receiver: futures_util::stream::SplitStream<WebSocket>,
    tx: broadcast::Sender<ServerMessage>,
    handler: Arc<H>,
    ctx: Arc<Mutex<ConnectionContext>>,
) {
    while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else {
            debug!("Received non-text message, ignoring");
            continue;
        };

        debug!(raw = %text, "Received message");

        let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(msg) => msg,
            Err(err) => {
                warn!(raw = %text, %err, "Failed to parse client message");
                let _ = tx.send(ServerMessage::Error {
                    message: "malformed message".to_string(),
                });
                continue;
            }
        };

        let mut ctx = ctx.lock().await;
        handler
            .clone()
            .handle_message(client_msg, tx.clone(), &mut ctx)
            .await;
    }
}
