//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, RoomStatus, ServerMessage};
use crate::room::{GameRoom, RoomError};
use dashmap::DashMap;
use domino_core::GameEvent;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// All active rooms
    pub rooms: DashMap<Uuid, GameRoom>,
    /// Mapping from player ID to their room ID
    pub player_rooms: DashMap<Uuid, Uuid>,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// Hand size for newly created rooms
    pub hand_size: usize,
}

impl ServerState {
    pub fn new(hand_size: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            player_rooms: DashMap::new(),
            player_senders: DashMap::new(),
            hand_size,
        }
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    /// Broadcast a message to all players in a room.
    pub fn broadcast_to_room(&self, room_id: Uuid, msg: ServerMessage) {
        let members: Vec<Uuid> = match self.rooms.get(&room_id) {
            Some(room) => room.players.keys().copied().collect(),
            None => return,
        };
        for player_id in members {
            self.send_to_player(player_id, msg.clone());
        }
    }

    /// Broadcast a message to all players in a room except one.
    pub fn broadcast_to_room_except(&self, room_id: Uuid, except: Uuid, msg: ServerMessage) {
        let members: Vec<Uuid> = match self.rooms.get(&room_id) {
            Some(room) => room.players.keys().copied().collect(),
            None => return,
        };
        for player_id in members.into_iter().filter(|id| *id != except) {
            self.send_to_player(player_id, msg.clone());
        }
    }

    /// Send every player in a room the game as seen from their own seat,
    /// followed by whose turn it is and, once decided, the outcome.
    pub fn broadcast_game_state(&self, room_id: Uuid, started: bool) {
        let (views, current, outcome) = match self.rooms.get(&room_id) {
            Some(room) => (room.seat_views(), room.get_current_player(), room.outcome()),
            None => return,
        };

        for (player_id, view) in views {
            let msg = if started {
                ServerMessage::GameStarted { view }
            } else {
                ServerMessage::GameState { view }
            };
            self.send_to_player(player_id, msg);
        }

        match outcome {
            Some((status, winner, scores)) => {
                info!(%room_id, ?status, ?winner, "Game over");
                self.broadcast_to_room(
                    room_id,
                    ServerMessage::GameOver {
                        status,
                        winner,
                        scores,
                    },
                );
            }
            None => {
                if let Some(player) = current {
                    self.broadcast_to_room(room_id, ServerMessage::TurnChanged { player });
                }
            }
        }
    }

    /// Get list of waiting rooms.
    pub fn get_waiting_rooms(&self) -> Vec<crate::protocol::RoomInfo> {
        self.rooms
            .iter()
            .filter(|r| r.status == RoomStatus::Waiting)
            .map(|r| r.to_info())
            .collect()
    }

    fn room_of(&self, player_id: Uuid) -> Option<Uuid> {
        self.player_rooms.get(&player_id).map(|entry| *entry)
    }

    fn send_error(&self, player_id: Uuid, message: impl Into<String>) {
        self.send_to_player(
            player_id,
            ServerMessage::Error {
                message: message.into(),
            },
        );
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Domino server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a player ID
    let player_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(player_id, tx);

    // Send welcome message
    let welcome = ServerMessage::Welcome { player_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(player_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {} ({})", player_id, text, e);
                    state.send_error(player_id, format!("Invalid message: {}", e));
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_player(player_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    handle_disconnect(player_id, &state);
    state.player_senders.remove(&player_id);
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(player_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::CreateRoom {
            player_name,
            vs_bot,
        } => {
            if state.player_rooms.contains_key(&player_id) {
                state.send_error(player_id, "Leave your current room first");
                return;
            }

            let room_id = Uuid::new_v4();
            let room = GameRoom::new(room_id, player_id, player_name, vs_bot, state.hand_size);
            let room_info = room.to_info();

            state.rooms.insert(room_id, room);
            state.player_rooms.insert(player_id, room_id);
            info!(%room_id, vs_bot, "Room created");

            state.send_to_player(player_id, ServerMessage::RoomCreated { room_id });
            state.send_to_player(player_id, ServerMessage::JoinedRoom { room: room_info });
        }

        ClientMessage::JoinRoom {
            room_id,
            player_name,
        } => {
            if state.player_rooms.contains_key(&player_id) {
                state.send_error(player_id, "Leave your current room first");
                return;
            }

            let Some(mut room) = state.rooms.get_mut(&room_id) else {
                state.send_error(player_id, "Room not found");
                return;
            };

            match room.add_player(player_id, player_name) {
                Ok(()) => {
                    let room_info = room.to_info();
                    drop(room); // Release lock before broadcasting
                    state.player_rooms.insert(player_id, room_id);

                    state.send_to_player(
                        player_id,
                        ServerMessage::JoinedRoom {
                            room: room_info.clone(),
                        },
                    );
                    state.broadcast_to_room_except(
                        room_id,
                        player_id,
                        ServerMessage::RoomUpdated { room: room_info },
                    );
                }
                Err(e) => {
                    drop(room);
                    state.send_error(player_id, e.to_string());
                }
            }
        }

        ClientMessage::LeaveRoom => {
            if let Some((_, room_id)) = state.player_rooms.remove(&player_id) {
                leave_room(player_id, room_id, state);
                state.send_to_player(player_id, ServerMessage::LeftRoom);
            }
        }

        ClientMessage::StartGame => {
            with_room_action(player_id, state, true, |room| room.start_game(player_id));
        }

        ClientMessage::GameAction { action } => {
            with_room_action(player_id, state, false, |room| {
                room.apply_action(player_id, action)
            });
        }

        ClientMessage::ResetGame => {
            with_room_action(player_id, state, true, |room| room.reset_game(player_id));
        }

        ClientMessage::GetState => {
            let Some(room_id) = state.room_of(player_id) else {
                state.send_error(player_id, "Not in a room");
                return;
            };
            let view = state.rooms.get(&room_id).and_then(|room| {
                let name = room.seat_name(player_id)?.to_string();
                room.state_view(Some(&name))
            });
            match view {
                Some(view) => state.send_to_player(player_id, ServerMessage::GameState { view }),
                None => state.send_error(player_id, RoomError::GameNotStarted.to_string()),
            }
        }

        ClientMessage::ListRooms => {
            let rooms = state.get_waiting_rooms();
            state.send_to_player(player_id, ServerMessage::RoomList { rooms });
        }

        ClientMessage::Ping => {
            state.send_to_player(player_id, ServerMessage::Pong);
        }
    }
}

/// Run a game-changing operation on the sender's room and report the result.
///
/// The room entry is held for the whole operation, so actions on one game
/// are applied one at a time.
fn with_room_action<F>(player_id: Uuid, state: &Arc<ServerState>, deal: bool, op: F)
where
    F: FnOnce(&mut GameRoom) -> Result<Vec<GameEvent>, RoomError>,
{
    let Some(room_id) = state.room_of(player_id) else {
        state.send_error(player_id, "Not in a room");
        return;
    };

    let result = match state.rooms.get_mut(&room_id) {
        Some(mut room) => op(&mut *room),
        None => {
            state.send_error(player_id, "Room not found");
            return;
        }
    };

    match result {
        Ok(events) => {
            if deal {
                info!(%room_id, "Game dealt");
            }
            state.send_to_player(
                player_id,
                ServerMessage::ActionResult {
                    success: true,
                    events,
                    error: None,
                },
            );
            state.broadcast_game_state(room_id, deal);
        }
        Err(e) => {
            warn!(%room_id, %player_id, "Rejected action: {}", e);
            state.send_to_player(
                player_id,
                ServerMessage::ActionResult {
                    success: false,
                    events: vec![],
                    error: Some(e.to_string()),
                },
            );
        }
    }
}

/// Take a player out of a room, dropping the room once nobody connected
/// is left in it.
fn leave_room(player_id: Uuid, room_id: Uuid, state: &Arc<ServerState>) {
    let update = match state.rooms.get_mut(&room_id) {
        Some(mut room) => {
            let abandoned = room.leave(player_id).unwrap_or(false);
            (!abandoned).then(|| room.to_info())
        }
        None => return,
    };

    match update {
        Some(room_info) => {
            state.broadcast_to_room(room_id, ServerMessage::RoomUpdated { room: room_info });
        }
        None => {
            state.rooms.remove(&room_id);
            info!(%room_id, "Room closed");
        }
    }
}

/// Handle player disconnect.
fn handle_disconnect(player_id: Uuid, state: &Arc<ServerState>) {
    if let Some((_, room_id)) = state.player_rooms.remove(&player_id) {
        leave_room(player_id, room_id, state);
    }
}
