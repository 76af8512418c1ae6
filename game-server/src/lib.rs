use std::collections::HashMap;
use std::sync::Arc;
use warp::Filter;
use warp::Reply;
use warp::http::StatusCode;

use crate::auth::{AuthError, AuthService};
use crate::game_manager::GameSessionManager;
use crate::websocket::RateLimits;

pub mod auth;
pub mod config;
pub mod game_manager;
pub mod websocket;

pub fn create_routes(
    manager: Arc<GameSessionManager>,
    auth_service: Arc<AuthService>,
    limits: RateLimits,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let manager_filter = warp::any().map(move || manager.clone());
    let auth_filter = warp::any().map(move || auth_service.clone());

    // The token comes from `?token=` or an `Authorization: Bearer` header.
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::header::optional::<String>("authorization"))
        .and(manager_filter)
        .and(auth_filter)
        .map(
            move |ws: warp::ws::Ws,
                  query: HashMap<String, String>,
                  header: Option<String>,
                  manager: Arc<GameSessionManager>,
                  auth: Arc<AuthService>| {
                let token = query.get("token").cloned().or_else(|| {
                    header.map(|value| {
                        value
                            .strip_prefix("Bearer ")
                            .unwrap_or(&value)
                            .to_string()
                    })
                });

                let player_id = token
                    .ok_or(AuthError::MissingToken)
                    .and_then(|token| auth.validate_token(&token));
                match player_id {
                    Ok(player_id) => ws
                        .on_upgrade(move |socket| {
                            websocket::handle_connection(socket, player_id, manager, limits)
                        })
                        .into_response(),
                    Err(err) => {
                        tracing::warn!(error = %err, "websocket upgrade refused");
                        warp::reply::with_status(err.to_string(), StatusCode::UNAUTHORIZED)
                            .into_response()
                    }
                }
            },
        );

    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    websocket.or(health).with(warp::log("word_rooms"))
}
