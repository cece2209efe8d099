// End-to-end game flows driven through the router with channel-backed
// connections, no network involved.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use warp::ws::Message;

use game_relay::core::{Connection, MessageHandler, ServerManager};
use game_relay::error::{RelayError, Result};
use game_relay::storage::{Deck, DeckStorage, MemoryStorage, Profile, ProfileStorage};

const ROOM: &str = "alice‗bob";

// Counts every collaborator call so replays can be checked
struct CountingStorage {
    inner: MemoryStorage,
    calls: AtomicUsize,
}

impl CountingStorage {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStorage for CountingStorage {
    async fn active_deck(&self, username: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.active_deck(username).await
    }

    async fn avatar(&self, username: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.avatar(username).await
    }

    async fn sleeve(&self, username: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.sleeve(username).await
    }
}

#[async_trait]
impl DeckStorage for CountingStorage {
    async fn get_deck(&self, deck_id: &str) -> Result<Deck> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_deck(deck_id).await
    }
}

struct Client {
    conn: Arc<Connection>,
    rx: UnboundedReceiver<Message>,
}

impl Client {
    fn frames(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            frames.push(msg.to_str().unwrap_or_default().to_string());
        }
        frames
    }
}

struct Harness {
    server: Arc<ServerManager>,
    handler: MessageHandler,
    storage: Arc<CountingStorage>,
}

impl Harness {
    async fn new() -> Self {
        let inner = MemoryStorage::new();
        for (name, deck, avatar, sleeve) in [
            ("alice", "12345", "takato", "sleeve1"),
            ("bob", "67890", "tai", "sleeve2"),
            ("carol", "missing-deck", "rika", "sleeve3"),
        ] {
            inner
                .insert_profile(
                    name,
                    Profile {
                        active_deck: deck.to_string(),
                        avatar: avatar.to_string(),
                        sleeve: sleeve.to_string(),
                    },
                )
                .await;
        }
        for id in ["12345", "67890"] {
            inner
                .insert_deck(Deck {
                    id: id.to_string(),
                    name: "New Deck".to_string(),
                    color: "Red".to_string(),
                    decklist: vec!["BT1-010".to_string(), "BT1-010".to_string()],
                    author_id: "authorId".to_string(),
                })
                .await;
        }

        let storage = Arc::new(CountingStorage {
            inner,
            calls: AtomicUsize::new(0),
        });
        let server = Arc::new(ServerManager::new(storage.clone(), storage.clone()));
        let handler = MessageHandler::new(server.clone());
        Self {
            server,
            handler,
            storage,
        }
    }

    async fn connect(&self, name: &str) -> Client {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = self.server.open_connection(name.to_string(), tx).await;
        Client { conn, rx }
    }

    async fn send(&self, client: &Client, frame: &str) -> Result<()> {
        self.handler.handle_client_message(&client.conn.id, frame).await
    }

    // Both players seated, inboxes emptied
    async fn seated_pair(&self) -> (Client, Client) {
        let mut alice = self.connect("alice").await;
        let mut bob = self.connect("bob").await;
        self.send(&alice, &format!("/startGame:{}", ROOM)).await.unwrap();
        self.send(&bob, &format!("/startGame:{}", ROOM)).await.unwrap();
        alice.frames();
        bob.frames();
        (alice, bob)
    }
}

fn expected_start_frame() -> String {
    concat!(
        "[START_GAME]:",
        r#"[{"name":"alice","avatar":"takato","sleeve":"sleeve1"},"#,
        r#"{"name":"bob","avatar":"tai","sleeve":"sleeve2"}]"#
    )
    .to_string()
}

#[tokio::test]
async fn test_start_game_is_sent_to_everyone_seated() {
    let h = Harness::new().await;
    let mut alice = h.connect("alice").await;
    let mut bob = h.connect("bob").await;

    h.send(&alice, "/startGame:alice‗bob").await.unwrap();
    assert_eq!(alice.frames(), vec![expected_start_frame()]);
    assert!(bob.frames().is_empty());

    h.send(&bob, "/startGame:alice‗bob").await.unwrap();
    assert_eq!(alice.frames(), vec![expected_start_frame()]);
    assert_eq!(bob.frames(), vec![expected_start_frame()]);

    assert!(h.server.room_exists(ROOM).await);
    assert_eq!(h.server.room_count().await, 1);
}

#[tokio::test]
async fn test_restart_replays_payload_without_lookups() {
    let h = Harness::new().await;
    let (mut alice, mut bob) = h.seated_pair().await;
    let calls_before = h.storage.calls();

    h.send(&alice, "/restartGame:alice‗bob").await.unwrap();
    assert_eq!(alice.frames(), vec![expected_start_frame()]);
    assert_eq!(bob.frames(), vec![expected_start_frame()]);

    h.send(&bob, "alice‗bob:/restartGame").await.unwrap();
    assert_eq!(alice.frames(), vec![expected_start_frame()]);
    assert_eq!(bob.frames(), vec![expected_start_frame()]);

    assert_eq!(h.storage.calls(), calls_before);
}

#[tokio::test]
async fn test_close_notifies_opponent_once_and_removes_room() {
    let h = Harness::new().await;
    let (mut alice, mut bob) = h.seated_pair().await;

    h.server.close_connection(&alice.conn.id).await;
    assert_eq!(bob.frames(), vec!["[PLAYER_LEFT]"]);
    assert!(!h.server.room_exists(ROOM).await);

    h.server.close_connection(&bob.conn.id).await;
    assert!(bob.frames().is_empty());
    assert!(alice.frames().is_empty());
    assert_eq!(h.server.connection_count().await, 0);
}

#[tokio::test]
async fn test_remaining_player_can_start_again() {
    let h = Harness::new().await;
    let (alice, mut bob) = h.seated_pair().await;

    h.server.close_connection(&alice.conn.id).await;
    bob.frames();

    let mut alice = h.connect("alice").await;
    h.send(&bob, "/startGame:alice‗bob").await.unwrap();
    h.send(&alice, "/startGame:alice‗bob").await.unwrap();
    assert_eq!(bob.frames().len(), 2);
    assert_eq!(alice.frames(), vec![expected_start_frame()]);
}

#[tokio::test]
async fn test_commands_for_missing_room_are_dropped() {
    let h = Harness::new().await;
    let (mut alice, mut bob) = h.seated_pair().await;

    h.send(&alice, "wrong‗room:/surrender:alice").await.unwrap();
    h.send(&alice, "wrong‗room:/updateMemory:bob:3").await.unwrap();
    h.send(&alice, "wrong‗room:/restartGame").await.unwrap();

    assert!(alice.frames().is_empty());
    assert!(bob.frames().is_empty());
}

#[tokio::test]
async fn test_simple_verbs_reach_only_the_opponent() {
    let h = Harness::new().await;
    let (mut alice, mut bob) = h.seated_pair().await;

    let cases = [
        ("surrender", "[SURRENDER]"),
        ("restartRequest", "[RESTART]"),
        ("acceptRestart", "[ACCEPT_RESTART]"),
        ("openedSecurity", "[SECURITY_VIEWED]"),
        ("playRevealSfx", "[REVEAL_SFX]"),
        ("playSecurityRevealSfx", "[SECURITY_REVEAL_SFX]"),
        ("playPlaceCardSfx", "[PLACE_CARD_SFX]"),
        ("playDrawCardSfx", "[DRAW_CARD_SFX]"),
        ("playSuspendCardSfx", "[SUSPEND_CARD_SFX]"),
        ("playUnsuspendCardSfx", "[UNSUSPEND_CARD_SFX]"),
        ("playButtonClickSfx", "[BUTTON_CLICK_SFX]"),
        ("playTrashCardSfx", "[TRASH_CARD_SFX]"),
        ("playShuffleDeckSfx", "[SHUFFLE_DECK_SFX]"),
    ];

    for (verb, expected) in cases {
        h.send(&alice, &format!("{}:/{}:bob", ROOM, verb)).await.unwrap();
        assert_eq!(bob.frames(), vec![expected], "verb {}", verb);
    }
    assert!(alice.frames().is_empty());
}

#[tokio::test]
async fn test_memory_is_negated_for_the_opponent() {
    let h = Harness::new().await;
    let (alice, mut bob) = h.seated_pair().await;

    h.send(&alice, "alice‗bob:/updateMemory:bob:5").await.unwrap();
    h.send(&alice, "alice‗bob:/updateMemory:bob:-5").await.unwrap();
    assert_eq!(bob.frames(), vec!["[UPDATE_MEMORY]:-5", "[UPDATE_MEMORY]:5"]);
}

#[tokio::test]
async fn test_attack_on_security_flips_perspective() {
    let h = Harness::new().await;
    let (alice, mut bob) = h.seated_pair().await;

    h.send(&alice, "alice‗bob:/attack:bob:myDigi1:opponentSecurity")
        .await
        .unwrap();
    h.send(&alice, "alice‗bob:/attack:bob:myDigi1:opponentDigi3")
        .await
        .unwrap();
    assert_eq!(
        bob.frames(),
        vec![
            "[ATTACK]:opponentDigi1:mySecurity",
            "[ATTACK]:opponentDigi1:opponentDigi3"
        ]
    );
}

#[tokio::test]
async fn test_board_updates_pass_through() {
    let h = Harness::new().await;
    let (mut alice, mut bob) = h.seated_pair().await;

    h.send(&alice, r#"alice‗bob:/updateGame:{"hand":["BT1-010"],"phase":"main:2"}"#)
        .await
        .unwrap();
    h.send(&bob, "alice‗bob:/moveCard:alice:123abc:myDigi1:myDigi2")
        .await
        .unwrap();

    assert_eq!(
        bob.frames(),
        vec![r#"[UPDATE_OPPONENT]:{"hand":["BT1-010"],"phase":"main:2"}"#]
    );
    assert_eq!(alice.frames(), vec!["[MOVE_CARD]:123abc:myDigi1:myDigi2"]);
}

#[tokio::test]
async fn test_heartbeat_answers_only_the_sender() {
    let h = Harness::new().await;
    let (mut alice, mut bob) = h.seated_pair().await;
    let mut loner = h.connect("dave").await;

    h.send(&alice, "/heartbeat/").await.unwrap();
    h.send(&loner, "/heartbeat").await.unwrap();

    assert_eq!(alice.frames(), vec!["[HEARTBEAT]"]);
    assert_eq!(loner.frames(), vec!["[HEARTBEAT]"]);
    assert!(bob.frames().is_empty());
}

#[tokio::test]
async fn test_chat_uses_sender_identity() {
    let h = Harness::new().await;
    let (mut alice, mut bob) = h.seated_pair().await;

    h.send(&alice, "alice‗bob:/chatMessage:bob:hello there").await.unwrap();

    assert_eq!(bob.frames(), vec!["[CHAT_MESSAGE]:alice﹕hello there"]);
    assert!(alice.frames().is_empty());
}

#[tokio::test]
async fn test_liveness_broadcast_reaches_every_connection() {
    let h = Harness::new().await;
    let (mut alice, mut bob) = h.seated_pair().await;
    let mut loner = h.connect("dave").await;

    assert_eq!(h.server.send_heartbeats().await, 3);
    for client in [&mut alice, &mut bob, &mut loner] {
        assert_eq!(client.frames(), vec!["[HEARTBEAT]"]);
    }
}

#[tokio::test]
async fn test_collaborator_failure_only_affects_requester() {
    let h = Harness::new().await;
    let mut alice = h.connect("alice").await;
    let mut carol = h.connect("carol").await;

    // carol's active deck does not exist
    let result = h.send(&carol, "/startGame:alice‗carol").await;
    assert!(matches!(result, Err(RelayError::DeckNotFound(_))));
    assert!(carol.frames().is_empty());
    assert!(!h.server.room_exists("alice‗carol").await);

    // alice's other game is unaffected
    let mut bob = h.connect("bob").await;
    h.send(&alice, "/startGame:alice‗bob").await.unwrap();
    h.send(&bob, "/startGame:alice‗bob").await.unwrap();
    assert_eq!(alice.frames().len(), 2);
    assert_eq!(bob.frames().len(), 1);
}

#[tokio::test]
async fn test_third_connection_cannot_join() {
    let h = Harness::new().await;
    let (mut alice, mut bob) = h.seated_pair().await;
    let mut bob_again = h.connect("bob").await;

    let result = h.send(&bob_again, "/startGame:alice‗bob").await;
    assert!(matches!(result, Err(RelayError::RoomFull(_))));
    assert!(bob_again.frames().is_empty());
    assert!(alice.frames().is_empty());
    assert!(bob.frames().is_empty());
}

#[tokio::test]
async fn test_malformed_frames_are_reported_not_sent() {
    let h = Harness::new().await;
    let (mut alice, mut bob) = h.seated_pair().await;

    let unknown = h.send(&alice, "alice‗bob:/dance:bob").await;
    assert!(matches!(unknown, Err(RelayError::UnknownCommand(_))));

    let garbage = h.send(&alice, "hello").await;
    assert!(matches!(garbage, Err(RelayError::MessageParseError(_))));

    let huge = "x".repeat(game_relay::DEFAULT_MAX_FRAME_BYTES + 1);
    let too_large = h.send(&alice, &huge).await;
    assert!(matches!(too_large, Err(RelayError::MessageTooLarge(_))));

    assert!(alice.frames().is_empty());
    assert!(bob.frames().is_empty());
}
