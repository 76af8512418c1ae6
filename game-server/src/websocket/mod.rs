use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::game_manager::GameSessionManager;
use game_types::{GameError, PlayerId};

pub mod connection;
pub mod rate_limiter;

#[cfg(test)]
pub mod integration_tests;

pub use connection::{ConnectionId, ConnectionRegistry, Outgoing, UserConnection};
pub use rate_limiter::{RateLimiter, RateLimits};

pub async fn handle_connection(
    websocket: WebSocket,
    player_id: PlayerId,
    manager: Arc<GameSessionManager>,
    limits: RateLimits,
) {
    let (connection, mut outgoing) = UserConnection::new(player_id);
    let connection_id = connection.connection_id;
    info!(connection_id = %connection_id, player_id = %player_id, "websocket connected");

    let (mut ws_sender, mut ws_receiver) = websocket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(outgoing) = outgoing.recv().await {
            let message = match outgoing {
                Outgoing::Message(message) => message,
                Outgoing::Close => {
                    let _ = ws_sender.send(Message::close()).await;
                    break;
                }
            };

            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "failed to serialize message");
                    continue;
                }
            };
            if let Err(e) = ws_sender.send(Message::text(json)).await {
                warn!(connection_id = %connection_id, error = %e, "failed to send message");
                break;
            }
        }
    });

    // The writer finishing only interrupts the wait for the next frame, never
    // an action already being handled.
    let mut rate_limiter = RateLimiter::new(limits);
    let mut writer_done = false;
    loop {
        let next = tokio::select! {
            next = ws_receiver.next() => next,
            _ = &mut writer => {
                writer_done = true;
                break;
            }
        };
        let msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                warn!(connection_id = %connection_id, error = %e, "websocket error");
                break;
            }
            None => break,
        };
        if msg.is_close() {
            break;
        }
        // pings, pongs and binary frames carry no actions
        let Ok(text) = msg.to_str() else {
            continue;
        };

        if !rate_limiter.check_rate_limit() {
            warn!(connection_id = %connection_id, "rate limit exceeded");
            manager.reply_error(&connection, &GameError::RateLimited);
            continue;
        }
        manager.handle_message(&connection, text).await;
    }

    info!(connection_id = %connection_id, player_id = %player_id, "websocket disconnected");
    manager.handle_disconnect(&connection).await;

    connection.close();
    drop(connection);
    if !writer_done {
        if let Err(e) = writer.await {
            error!(connection_id = %connection_id, error = %e, "websocket writer failed");
        }
    }
}
