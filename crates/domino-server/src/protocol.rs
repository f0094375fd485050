//! WebSocket protocol messages for domino rooms.

use domino_core::{GameAction, GameEvent, GameSnapshot, GameStatus, Move};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a new game room, optionally against the computer
    CreateRoom {
        player_name: String,
        #[serde(default)]
        vs_bot: bool,
    },

    /// Join an existing room
    JoinRoom { room_id: Uuid, player_name: String },

    /// Leave current room
    LeaveRoom,

    /// Deal the first game (host only)
    StartGame,

    /// Submit a play, draw or pass
    GameAction { action: GameAction },

    /// Reshuffle and deal a new game (host only)
    ResetGame,

    /// Ask for the current state from this player's seat
    GetState,

    /// Request room list
    ListRooms,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned connection ID
    Welcome { player_id: Uuid },

    /// Room created successfully
    RoomCreated { room_id: Uuid },

    /// Joined room successfully
    JoinedRoom { room: RoomInfo },

    /// Left room successfully
    LeftRoom,

    /// Room state updated (player joined/left)
    RoomUpdated { room: RoomInfo },

    /// A new game was dealt
    GameStarted { view: StateView },

    /// Game state updated
    GameState { view: StateView },

    /// Outcome of this client's action
    ActionResult {
        success: bool,
        events: Vec<GameEvent>,
        error: Option<String>,
    },

    /// Current player changed
    TurnChanged { player: String },

    /// List of available rooms
    RoomList { rooms: Vec<RoomInfo> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,

    /// Game finished, by a win or a block
    GameOver {
        status: GameStatus,
        winner: Option<String>,
        scores: Option<BTreeMap<String, u32>>,
    },
}

/// A game snapshot plus the moves open to the players it is shown to.
///
/// A seat view carries only that seat's moves; a full view carries everyone's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateView {
    #[serde(flatten)]
    pub state: GameSnapshot,
    pub legal_moves: BTreeMap<String, Vec<Move>>,
}

/// Room information for clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: Uuid,
    pub name: String,
    pub players: Vec<PlayerInfo>,
    pub vs_bot: bool,
    pub host_id: Uuid,
    pub status: RoomStatus,
}

/// Player information in a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
}

/// Room status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Waiting,
    InGame,
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;
    use domino_core::End;

    #[test]
    fn test_parse_game_action_message() {
        let text = r#"{"type":"GameAction","payload":{"action":{"Play":{"tile_index":3,"end":"R"}}}}"#;
        let msg: ClientMessage = serde_json::from_str(text).unwrap();
        match msg {
            ClientMessage::GameAction { action } => assert_eq!(
                action,
                GameAction::Play {
                    tile_index: 3,
                    end: End::Right
                }
            ),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_create_room_defaults_to_human_opponent() {
        let text = r#"{"type":"CreateRoom","payload":{"player_name":"ana"}}"#;
        let msg: ClientMessage = serde_json::from_str(text).unwrap();
        assert!(matches!(msg, ClientMessage::CreateRoom { vs_bot: false, .. }));
    }

    #[test]
    fn test_unit_messages() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"Ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
        assert_eq!(
            serde_json::to_string(&ServerMessage::Pong).unwrap(),
            r#"{"type":"Pong"}"#
        );
    }
}
