use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use warp::test::{WsClient, ws};

use super::RateLimits;
use crate::auth::AuthService;
use crate::create_routes;
use crate::game_manager::GameSessionManager;
use game_core::{GameRules, WordValidator};
use game_persistence::{RoomRepository, UserRepository, connect_to_memory_database};
use game_types::{InboundMessage, OutboundMessage, PlayerAction, RoomEvent, RoomId, User};
use migration::{Migrator, MigratorTrait};

struct AcceptAll;

impl WordValidator for AcceptAll {
    fn is_valid(&self, _word: &str) -> bool {
        true
    }
}

struct TestServer {
    manager: Arc<GameSessionManager>,
    rooms: Arc<RoomRepository>,
    users: Arc<UserRepository>,
}

impl TestServer {
    async fn new() -> Self {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let rooms = Arc::new(RoomRepository::new(db.clone()));
        let users = Arc::new(UserRepository::new(db));
        let manager = Arc::new(GameSessionManager::new(
            rooms.clone(),
            users.clone(),
            Arc::new(AcceptAll),
            Arc::new(GameRules::default()),
            Duration::from_secs(5),
        ));
        Self {
            manager,
            rooms,
            users,
        }
    }

    fn routes(
        &self,
        limits: RateLimits,
    ) -> impl warp::Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone + 'static
    {
        create_routes(
            self.manager.clone(),
            Arc::new(AuthService::new_dev_mode()),
            limits,
        )
    }

    async fn user(&self, name: &str) -> User {
        self.users
            .create_user(User {
                id: uuid::Uuid::new_v4(),
                email: format!("{}@test.com", name.to_lowercase()),
                display_name: name.to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
            })
            .await
            .unwrap()
    }
}

async fn send(client: &mut WsClient, message: &InboundMessage) {
    client
        .send(warp::ws::Message::text(serde_json::to_string(message).unwrap()))
        .await;
}

async fn receive(client: &mut WsClient) -> OutboundMessage {
    let frame = timeout(Duration::from_secs(1), client.recv())
        .await
        .expect("Timeout waiting for message")
        .expect("WebSocket closed");
    serde_json::from_str(frame.to_str().unwrap()).unwrap()
}

fn join(room_id: RoomId) -> InboundMessage {
    InboundMessage::new(PlayerAction::JoinRoom, room_id)
}

#[tokio::test]
async fn test_two_players_join_over_websocket() {
    let server = TestServer::new().await;
    let alice = server.user("Alice").await;
    let bob = server.user("Bob").await;
    let room = server.rooms.create_room(alice.id, 2, 60, false).await.unwrap();
    server.rooms.add_player(room.id, bob.id).await.unwrap();
    let routes = server.routes(RateLimits::default());

    let mut ws1 = ws()
        .path(&format!("/ws?token={}", alice.id))
        .handshake(routes.clone())
        .await
        .expect("WebSocket handshake failed");
    let mut ws2 = ws()
        .path("/ws")
        .header("authorization", format!("Bearer {}", bob.id))
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    send(&mut ws1, &join(room.id)).await;
    let joined = receive(&mut ws1).await;
    assert_eq!(joined.event, RoomEvent::JoinedRoom);

    send(&mut ws2, &join(room.id)).await;
    assert_eq!(receive(&mut ws2).await.event, RoomEvent::JoinedRoom);

    // both seats taken: alice hears the full room
    let player_joined = receive(&mut ws1).await;
    assert_eq!(player_joined.event, RoomEvent::PlayerJoined);
    assert_eq!(player_joined.new_player_info.unwrap().name, "Bob");

    let ready = receive(&mut ws1).await;
    assert_eq!(ready.event, RoomEvent::RoomReady);

    let mut reaction = InboundMessage::new(PlayerAction::SendReaction, room.id);
    reaction.reaction = Some("hi".to_string());
    send(&mut ws1, &reaction).await;
    let first = receive(&mut ws1).await;
    let second = receive(&mut ws2).await;
    assert_eq!(first.event, RoomEvent::ReactionSent);
    assert_eq!(second.sender_id, Some(alice.id));
}

#[tokio::test]
async fn test_missing_token_is_refused() {
    let server = TestServer::new().await;
    let routes = server.routes(RateLimits::default());

    let result = ws().path("/ws").handshake(routes).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_invalid_json_gets_error_notice() {
    let server = TestServer::new().await;
    let alice = server.user("Alice").await;
    let routes = server.routes(RateLimits::default());

    let mut client = ws()
        .path(&format!("/ws?token={}", alice.id))
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    client.send_text("hello").await;
    let reply = receive(&mut client).await;
    assert_eq!(reply.event, RoomEvent::Error);
    assert!(reply.message.unwrap().starts_with("malformed message"));
}

#[tokio::test]
async fn test_rate_limited_messages_are_refused() {
    let server = TestServer::new().await;
    let alice = server.user("Alice").await;
    let routes = server.routes(RateLimits {
        burst: 1,
        per_second: 0,
    });

    let mut client = ws()
        .path(&format!("/ws?token={}", alice.id))
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    client.send_text("first").await;
    client.send_text("second").await;

    let first = receive(&mut client).await;
    assert!(first.message.unwrap().starts_with("malformed message"));
    let second = receive(&mut client).await;
    assert_eq!(second.message.as_deref(), Some("too many messages, slow down"));
}

#[tokio::test]
async fn test_dropped_socket_is_announced() {
    let server = TestServer::new().await;
    let alice = server.user("Alice").await;
    let bob = server.user("Bob").await;
    let room = server.rooms.create_room(alice.id, 3, 60, false).await.unwrap();
    server.rooms.add_player(room.id, bob.id).await.unwrap();
    let routes = server.routes(RateLimits::default());

    let mut ws1 = ws()
        .path(&format!("/ws?token={}", alice.id))
        .handshake(routes.clone())
        .await
        .expect("WebSocket handshake failed");
    let mut ws2 = ws()
        .path(&format!("/ws?token={}", bob.id))
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    send(&mut ws1, &join(room.id)).await;
    receive(&mut ws1).await;
    send(&mut ws2, &join(room.id)).await;
    receive(&mut ws2).await;
    assert_eq!(receive(&mut ws1).await.event, RoomEvent::PlayerJoined);

    drop(ws2);

    let notice = receive(&mut ws1).await;
    assert_eq!(notice.event, RoomEvent::PlayerDisconnected);
    assert_eq!(notice.left_player_id, Some(bob.id));
    assert_eq!(
        server.manager.registry().connected_players(room.id).await,
        vec![alice.id]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_leaver_socket_closes_after_room_is_told() {
    let server = TestServer::new().await;
    let alice = server.user("Alice").await;
    let bob = server.user("Bob").await;
    let room = server.rooms.create_room(alice.id, 2, 60, false).await.unwrap();
    server.rooms.add_player(room.id, bob.id).await.unwrap();
    let routes = server.routes(RateLimits::default());

    let mut ws1 = ws()
        .path(&format!("/ws?token={}", alice.id))
        .handshake(routes.clone())
        .await
        .expect("WebSocket handshake failed");
    let mut ws2 = ws()
        .path(&format!("/ws?token={}", bob.id))
        .handshake(routes)
        .await
        .expect("WebSocket handshake failed");

    send(&mut ws1, &join(room.id)).await;
    receive(&mut ws1).await;
    send(&mut ws2, &join(room.id)).await;
    receive(&mut ws2).await;
    assert_eq!(receive(&mut ws1).await.event, RoomEvent::PlayerJoined);
    assert_eq!(receive(&mut ws1).await.event, RoomEvent::RoomReady);

    // keep the registry busy from another room while bob leaves
    let registry_traffic = {
        let manager = server.manager.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                manager.registry().connections(uuid::Uuid::new_v4()).await;
            }
        })
    };

    send(&mut ws2, &InboundMessage::new(PlayerAction::LeaveRoom, room.id)).await;
    assert_eq!(receive(&mut ws2).await.event, RoomEvent::LeftRoom);
    let closing = timeout(Duration::from_secs(1), ws2.recv())
        .await
        .expect("Timeout waiting for close");
    assert!(closing.map(|frame| frame.is_close()).unwrap_or(true));

    let left = receive(&mut ws1).await;
    assert_eq!(left.event, RoomEvent::PlayerLeftRoom);
    assert_eq!(left.left_player_id, Some(bob.id));
    assert_eq!(receive(&mut ws1).await.event, RoomEvent::RoomWaiting);

    registry_traffic.await.unwrap();
    assert_eq!(
        server.manager.registry().connected_players(room.id).await,
        vec![alice.id]
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::new().await;
    let routes = server.routes(RateLimits::default());

    let response = warp::test::request().path("/health").reply(&routes).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.body(), "OK");
}
