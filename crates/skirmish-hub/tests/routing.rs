//! Integration tests for event routing through the hub.

use std::sync::Arc;

use serde_json::{Value, json};
use skirmish_game::{GameError, STATUS_AWAITING_ACTION, STATUS_AWAITING_ARRIVAL};
use skirmish_hub::{Hub, HubError, Session, STATUS_OPPONENT_LEFT};
use skirmish_protocol::{Envelope, ProtocolError};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

struct Client {
    session: Arc<Session>,
    rx: mpsc::Receiver<Envelope>,
}

impl Client {
    async fn connect(hub: &Hub, player_id: &str) -> Self {
        let (session, rx) = hub.connect().await;
        let mut client = Self { session, rx };
        client
            .send(hub, json!({"type": "init_client", "payload": {"playerId": player_id}}))
            .await
            .unwrap();
        client.drain();
        client
    }

    async fn send(&mut self, hub: &Hub, frame: Value) -> Result<(), HubError> {
        let envelope: Envelope = serde_json::from_value(frame).unwrap();
        hub.dispatch_envelope(&self.session, envelope).await
    }

    async fn join(&mut self, hub: &Hub, room: &str) {
        self.send(hub, json!({"type": "join_room", "payload": {"room": room}}))
            .await
            .unwrap();
    }

    async fn act(&mut self, hub: &Hub, action: &str) -> Result<(), HubError> {
        self.send(
            hub,
            json!({"type": "game_action", "payload": {"action": action}}),
        )
        .await
    }

    /// Everything queued for this client so far.
    fn drain(&mut self) -> Vec<Envelope> {
        let mut out = Vec::new();
        while let Ok(envelope) = self.rx.try_recv() {
            out.push(envelope);
        }
        out
    }

    fn kinds(&mut self) -> Vec<String> {
        self.drain().into_iter().map(|e| e.kind).collect()
    }
}

fn last_of<'a>(events: &'a [Envelope], kind: &str) -> &'a Envelope {
    events
        .iter()
        .rev()
        .find(|e| e.kind == kind)
        .unwrap_or_else(|| panic!("no {kind} event in {events:?}"))
}

fn statuses(events: &[Envelope]) -> Vec<String> {
    events
        .iter()
        .filter(|e| e.kind == "UPDATE_STATUS")
        .map(|e| e.payload["status"].as_str().unwrap_or_default().to_string())
        .collect()
}

async fn two_players(hub: &Hub) -> (Client, Client) {
    let mut alice = Client::connect(hub, "alice").await;
    let mut bob = Client::connect(hub, "bob").await;
    alice.join(hub, "arena").await;
    bob.join(hub, "arena").await;
    alice.drain();
    bob.drain();
    (alice, bob)
}

// =========================================================================
// init_client / list_rooms
// =========================================================================

#[tokio::test]
async fn test_init_client_binds_identity_and_acks() {
    let hub = Hub::default();
    let (session, mut rx) = hub.connect().await;
    let envelope: Envelope =
        serde_json::from_value(json!({"type": "init_client", "payload": {"playerId": "p1"}}))
            .unwrap();

    hub.dispatch_envelope(&session, envelope).await.unwrap();

    assert_eq!(session.player_id().await, "p1");
    let ack = rx.try_recv().unwrap();
    assert_eq!(ack.kind, "init_client");
    assert_eq!(ack.payload, json!({"playerId": "p1"}));
}

#[tokio::test]
async fn test_init_client_rejected_inside_room() {
    let hub = Hub::default();
    let mut alice = Client::connect(&hub, "alice").await;
    alice.join(&hub, "arena").await;
    alice.drain();

    let err = alice
        .send(&hub, json!({"type": "init_client", "payload": {"playerId": "eve"}}))
        .await
        .unwrap_err();

    assert!(matches!(err, HubError::IdentityLocked { .. }));
    assert_eq!(alice.session.player_id().await, "alice");
    assert!(alice.drain().is_empty());
}

#[tokio::test]
async fn test_init_client_rejects_id_held_by_another_session() {
    let hub = Hub::default();
    let (mut alice, mut bob) = two_players(&hub).await;
    let (session, rx) = hub.connect().await;
    let mut other = Client { session, rx };

    let err = other
        .send(&hub, json!({"type": "init_client", "payload": {"playerId": "alice"}}))
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::IdentityTaken { ref player_id } if player_id == "alice"));
    assert_ne!(other.session.player_id().await, "alice");
    assert!(other.drain().is_empty());

    // Still only a spectator: it cannot act for alice or end her game.
    other.join(&hub, "arena").await;
    let err = other.act(&hub, "WAIT").await.unwrap_err();
    assert!(matches!(err, HubError::Game(GameError::NotAPlayer { .. })));
    other.send(&hub, json!({"type": "leave_room"})).await.unwrap();

    assert!(hub.games().has_game("arena").await);
    alice.drain();
    bob.drain();
    bob.act(&hub, "WAIT").await.unwrap();
    assert!(alice.drain().is_empty());
    assert_eq!(statuses(&bob.drain()), vec![STATUS_AWAITING_ACTION]);
}

#[tokio::test]
async fn test_list_rooms_without_payload_replies_to_requester_only() {
    let hub = Hub::default();
    let mut alice = Client::connect(&hub, "alice").await;
    let mut bob = Client::connect(&hub, "bob").await;
    alice.join(&hub, "north").await;
    alice.drain();

    bob.send(&hub, json!({"type": "list_rooms"})).await.unwrap();

    let events = bob.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].payload, json!({"rooms": ["north"]}));
    assert!(alice.drain().is_empty());
}

#[tokio::test]
async fn test_unknown_event_type_is_routing_error() {
    let hub = Hub::default();
    let mut alice = Client::connect(&hub, "alice").await;

    let err = alice
        .send(&hub, json!({"type": "create_room", "payload": {}}))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HubError::Protocol(ProtocolError::UnknownEventType(kind)) if kind == "create_room"
    ));
    assert!(alice.drain().is_empty());
}

// =========================================================================
// join_room / leave_room
// =========================================================================

#[tokio::test]
async fn test_join_room_acks_lists_and_broadcasts_status() {
    let hub = Hub::default();
    let mut alice = Client::connect(&hub, "alice").await;

    alice.join(&hub, "arena").await;

    let events = alice.drain();
    let kinds: Vec<_> = events.iter().map(|e| e.kind.as_str()).collect();
    assert_eq!(kinds, vec!["join_room", "list_rooms", "UPDATE_STATUS"]);
    assert_eq!(events[0].payload, json!({"room": "arena"}));
    assert_eq!(events[1].payload, json!({"rooms": ["arena"]}));
    assert_eq!(
        events[2].payload,
        json!({"status": "Waiting for opponent to arrive"})
    );
}

#[tokio::test]
async fn test_second_join_starts_turn_for_whole_room() {
    let hub = Hub::default();
    let mut alice = Client::connect(&hub, "alice").await;
    let mut bob = Client::connect(&hub, "bob").await;
    alice.join(&hub, "arena").await;
    alice.drain();

    bob.join(&hub, "arena").await;

    let expected = json!({"status": "Turn 1: choose your action"});
    assert_eq!(last_of(&alice.drain(), "UPDATE_STATUS").payload, expected);
    assert_eq!(last_of(&bob.drain(), "UPDATE_STATUS").payload, expected);
}

#[tokio::test]
async fn test_spectator_join_receives_current_view() {
    let hub = Hub::default();
    let (_alice, _bob) = two_players(&hub).await;
    let mut carol = Client::connect(&hub, "carol").await;

    carol.join(&hub, "arena").await;

    let events = carol.drain();
    let view = last_of(&events, "GAME_ACTION_RESULT");
    assert_eq!(view.payload["playerStates"]["you"]["player"], 1);
    assert_eq!(view.payload["turn"], 1);
}

#[tokio::test]
async fn test_leave_room_by_player_notifies_room() {
    let hub = Hub::default();
    let (mut alice, mut bob) = two_players(&hub).await;

    bob.send(&hub, json!({"type": "leave_room", "payload": {"room": "ignored"}}))
        .await
        .unwrap();

    let events = bob.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "leave_room");
    assert_eq!(events[0].payload, json!({"room": "arena"}));
    assert_eq!(bob.session.room().await, "");

    let events = alice.drain();
    assert_eq!(
        statuses(&events),
        vec![STATUS_OPPONENT_LEFT, STATUS_AWAITING_ARRIVAL]
    );
    // Alice holds slot 1 of a fresh game.
    let snapshot = hub.games().snapshot("arena").await.unwrap();
    assert_eq!(snapshot.player_ids().collect::<Vec<_>>(), vec!["alice"]);
    assert_eq!(snapshot.turn(), 1);
}

#[tokio::test]
async fn test_switching_rooms_leaves_previous_room() {
    let hub = Hub::default();
    let (mut alice, mut bob) = two_players(&hub).await;

    bob.join(&hub, "elsewhere").await;

    assert_eq!(bob.session.room().await, "elsewhere");
    assert_eq!(hub.list_rooms().await, vec!["arena", "elsewhere"]);
    let events = alice.drain();
    assert_eq!(
        statuses(&events),
        vec![STATUS_OPPONENT_LEFT, STATUS_AWAITING_ARRIVAL]
    );
}

#[tokio::test]
async fn test_unregister_player_notifies_room() {
    let hub = Hub::default();
    let (mut alice, bob) = two_players(&hub).await;

    hub.unregister(bob.session.id()).await;

    assert_eq!(hub.sessions_in_room("arena").await.len(), 1);
    let events = alice.drain();
    assert_eq!(
        statuses(&events),
        vec![STATUS_OPPONENT_LEFT, STATUS_AWAITING_ARRIVAL]
    );
}

#[tokio::test]
async fn test_remaining_player_plays_next_arrival() {
    let hub = Hub::default();
    let (mut alice, mut bob) = two_players(&hub).await;
    bob.send(&hub, json!({"type": "leave_room"})).await.unwrap();

    let mut carol = Client::connect(&hub, "carol").await;
    carol.join(&hub, "arena").await;
    let events = carol.drain();
    assert_eq!(statuses(&events), vec!["Turn 1: choose your action"]);
    assert!(events.iter().all(|e| e.kind != "GAME_ACTION_RESULT"));

    alice.act(&hub, "WAIT").await.unwrap();
    carol.act(&hub, "WAIT").await.unwrap();

    let view = last_of(&alice.drain(), "GAME_ACTION_RESULT").payload.clone();
    assert_eq!(view["playerStates"]["you"]["player"], 1);
    assert_eq!(view["playerStates"]["you"]["energy"], 11);
    let view = last_of(&carol.drain(), "GAME_ACTION_RESULT").payload.clone();
    assert_eq!(view["playerStates"]["you"]["player"], 2);
}

#[tokio::test]
async fn test_lone_player_leaving_leaves_no_game() {
    let hub = Hub::default();
    let mut alice = Client::connect(&hub, "alice").await;
    alice.join(&hub, "arena").await;

    alice.send(&hub, json!({"type": "leave_room"})).await.unwrap();

    assert!(!hub.games().has_game("arena").await);
}

// =========================================================================
// send_message
// =========================================================================

#[tokio::test]
async fn test_send_message_broadcasts_to_room_with_timestamp() {
    let hub = Hub::default();
    let (mut alice, mut bob) = two_players(&hub).await;
    let mut lobby = Client::connect(&hub, "lurker").await;

    alice
        .send(
            &hub,
            json!({"type": "send_message", "payload": {"message": "hi", "from": "Alice"}}),
        )
        .await
        .unwrap();

    for events in [alice.drain(), bob.drain()] {
        let chat = last_of(&events, "new_message");
        assert_eq!(chat.payload["message"], "hi");
        assert_eq!(chat.payload["from"], "Alice");
        assert!(chat.payload["sent"].as_u64().unwrap() > 0);
    }
    assert!(lobby.drain().is_empty());
}

#[tokio::test]
async fn test_send_message_defaults_sender_to_player_id() {
    let hub = Hub::default();
    let (mut alice, _bob) = two_players(&hub).await;

    alice
        .send(&hub, json!({"type": "send_message", "payload": {"message": "gg"}}))
        .await
        .unwrap();

    assert_eq!(last_of(&alice.drain(), "new_message").payload["from"], "alice");
}

// =========================================================================
// game_action
// =========================================================================

#[tokio::test]
async fn test_game_action_in_lobby_is_not_in_room() {
    let hub = Hub::default();
    let mut alice = Client::connect(&hub, "alice").await;
    let err = alice.act(&hub, "WAIT").await.unwrap_err();
    assert!(matches!(err, HubError::NotInRoom(_)));
}

#[tokio::test]
async fn test_game_action_alone_waits_for_arrival() {
    let hub = Hub::default();
    let mut alice = Client::connect(&hub, "alice").await;
    alice.join(&hub, "arena").await;
    alice.drain();

    alice.act(&hub, "ATTACK").await.unwrap();

    let events = alice.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].payload,
        json!({"status": "Waiting for opponent to arrive"})
    );
}

#[tokio::test]
async fn test_game_action_first_submission_waits_for_opponent() {
    let hub = Hub::default();
    let (mut alice, mut bob) = two_players(&hub).await;

    alice.act(&hub, "ADVANCE").await.unwrap();

    let events = alice.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "UPDATE_STATUS");
    assert_eq!(
        events[0].payload,
        json!({"status": "Waiting for opponent to act"})
    );
    assert!(bob.drain().is_empty());
}

#[tokio::test]
async fn test_game_action_round_sends_personalized_views() {
    let hub = Hub::default();
    let (mut alice, mut bob) = two_players(&hub).await;

    alice.act(&hub, "ADVANCE").await.unwrap();
    bob.act(&hub, "WAIT").await.unwrap();

    let alice_events = alice.drain();
    let alice_view = &last_of(&alice_events, "GAME_ACTION_RESULT").payload;
    assert_eq!(alice_view["turn"], 2);
    assert_eq!(alice_view["playerStates"]["you"]["pos"], 3);
    assert_eq!(alice_view["playerStates"]["you"]["energy"], 9);
    assert_eq!(alice_view["playerStates"]["you"]["advanced"], true);
    assert_eq!(alice_view["playerStates"]["opponent"]["energy"], 11);

    let bob_events = bob.drain();
    let bob_view = &last_of(&bob_events, "GAME_ACTION_RESULT").payload;
    assert_eq!(bob_view["playerStates"]["you"]["player"], 2);
    assert_eq!(bob_view["playerStates"]["you"]["action"], "WAIT");
    assert_eq!(bob_view["playerStates"]["opponent"]["pos"], 3);

    for view in [alice_view, bob_view] {
        let keys: Vec<_> = view["playerStates"].as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(!view.to_string().contains("\"alice\""));
        assert!(!view.to_string().contains("\"bob\""));
    }
}

#[tokio::test]
async fn test_game_action_ignores_payload_room_and_player() {
    let hub = Hub::default();
    let (mut alice, mut bob) = two_players(&hub).await;

    alice
        .send(
            &hub,
            json!({"type": "game_action",
                   "payload": {"room": "elsewhere", "playerId": "bob", "action": "WAIT"}}),
        )
        .await
        .unwrap();
    bob.act(&hub, "WAIT").await.unwrap();

    let events = alice.drain();
    let view = &last_of(&events, "GAME_ACTION_RESULT").payload;
    assert_eq!(view["playerStates"]["you"]["energy"], 11);
    assert_eq!(view["playerStates"]["opponent"]["energy"], 11);
}

#[tokio::test]
async fn test_game_action_from_spectator_is_domain_error() {
    let hub = Hub::default();
    let (_alice, _bob) = two_players(&hub).await;
    let mut carol = Client::connect(&hub, "carol").await;
    carol.join(&hub, "arena").await;
    carol.drain();

    let err = carol.act(&hub, "ATTACK").await.unwrap_err();

    assert!(matches!(err, HubError::Game(GameError::NotAPlayer { .. })));
    assert!(carol.drain().is_empty());
}

#[tokio::test]
async fn test_game_action_invalid_action_is_decode_error() {
    let hub = Hub::default();
    let (mut alice, _bob) = two_players(&hub).await;
    let err = alice.act(&hub, "DANCE").await.unwrap_err();
    assert!(matches!(err, HubError::Protocol(ProtocolError::InvalidPayload { .. })));
}

#[tokio::test]
async fn test_game_over_tears_down_and_rejoin_starts_fresh() {
    let hub = Hub::new(skirmish_hub::HubConfig {
        game: skirmish_game::GameConfig {
            max_turns: 1,
            ..Default::default()
        },
        ..Default::default()
    });
    let (mut alice, mut bob) = two_players(&hub).await;

    alice.act(&hub, "WAIT").await.unwrap();
    bob.act(&hub, "COUNTER").await.unwrap();

    let events = alice.drain();
    let view = &last_of(&events, "GAME_ACTION_RESULT").payload;
    assert_eq!(view["gameOver"], true);
    assert_eq!(view["winner"], "You win by energy!");
    assert_eq!(view["status"], "Game over: You win by energy!");
    let bob_events = bob.drain();
    assert_eq!(
        last_of(&bob_events, "GAME_ACTION_RESULT").payload["winner"],
        "Opponent wins by energy!"
    );
    assert!(!hub.games().has_game("arena").await);

    let err = alice.act(&hub, "WAIT").await.unwrap_err();
    assert!(matches!(err, HubError::Game(GameError::NoGame(_))));

    alice.join(&hub, "arena").await;
    assert_eq!(
        alice.kinds(),
        vec!["join_room", "list_rooms", "UPDATE_STATUS"]
    );
    assert!(hub.games().has_game("arena").await);
}
