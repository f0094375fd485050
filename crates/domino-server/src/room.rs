//! Game room management.
//!
//! A room owns one `Game` and the rng it is dealt from. The server keeps
//! rooms in a concurrent map, so each game is only ever touched by the one
//! caller holding its entry.

use domino_core::{Bot, Game, GameAction, GameConfig, GameError, GameEvent, GameStatus};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{PlayerInfo, RoomInfo, RoomStatus, StateView};

/// Seats at a domino table
const SEATS: usize = 2;

/// Name given to the computer seat
const BOT_NAME: &str = "Computer";

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,

    #[error("Name '{0}' is already taken in this room")]
    NameTaken(String),

    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error("Not the host")]
    NotHost,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Not enough players")]
    NotEnoughPlayers,

    #[error("Game not started")]
    GameNotStarted,

    #[error("A player has left the game")]
    PlayerLeft,

    #[error(transparent)]
    Game(#[from] GameError),
}

/// A player in a game room.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    pub connected: bool,
}

impl RoomPlayer {
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            connected: true,
        }
    }

    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id,
            name: self.name.clone(),
            connected: self.connected,
        }
    }
}

/// A game room with two seats.
pub struct GameRoom {
    pub id: Uuid,
    pub name: String,
    pub host_id: Uuid,
    pub status: RoomStatus,
    pub players: HashMap<Uuid, RoomPlayer>,
    /// Order of players for turn taking
    pub player_order: Vec<Uuid>,
    /// Computer opponent filling the second seat, if any
    pub bot: Option<Bot>,
    pub hand_size: usize,
    /// The game state (once started)
    pub game: Option<Game>,
    rng: StdRng,
}

impl GameRoom {
    pub fn new(id: Uuid, host_id: Uuid, host_name: String, vs_bot: bool, hand_size: usize) -> Self {
        Self::with_rng(
            id,
            host_id,
            host_name,
            vs_bot,
            hand_size,
            StdRng::from_entropy(),
        )
    }

    /// Create a room that deals from the given rng
    pub fn with_rng(
        id: Uuid,
        host_id: Uuid,
        host_name: String,
        vs_bot: bool,
        hand_size: usize,
        rng: StdRng,
    ) -> Self {
        let bot = vs_bot.then(|| {
            let name = if host_name == BOT_NAME {
                format!("{} 2", BOT_NAME)
            } else {
                BOT_NAME.to_string()
            };
            Bot::new(name)
        });

        let mut players = HashMap::new();
        players.insert(host_id, RoomPlayer::new(host_id, host_name.clone()));

        Self {
            id,
            name: format!("{}'s Game", host_name),
            host_id,
            status: RoomStatus::Waiting,
            players,
            player_order: vec![host_id],
            bot,
            hand_size,
            game: None,
            rng,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Seats taken, counting the bot
    pub fn seats_taken(&self) -> usize {
        self.players.len() + usize::from(self.bot.is_some())
    }

    pub fn is_full(&self) -> bool {
        self.seats_taken() >= SEATS
    }

    pub fn add_player(&mut self, player_id: Uuid, name: String) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }
        if self.players.values().any(|p| p.name == name) {
            return Err(RoomError::NameTaken(name));
        }

        self.players.insert(player_id, RoomPlayer::new(player_id, name));
        self.player_order.push(player_id);
        Ok(())
    }

    pub fn remove_player(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if !self.players.contains_key(&player_id) {
            return Err(RoomError::PlayerNotInRoom);
        }

        self.players.remove(&player_id);
        self.player_order.retain(|&id| id != player_id);

        // If host left, assign new host
        if player_id == self.host_id && !self.player_order.is_empty() {
            self.host_id = self.player_order[0];
        }

        // Return true if room is now empty
        Ok(self.players.is_empty())
    }

    /// Take a connection out of the room.
    ///
    /// Before the deal the seat is freed. Once dealt, the game still seats
    /// that name, so the seat is kept but marked disconnected and the game
    /// ends. Returns true when no connected player is left.
    pub fn leave(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if self.status == RoomStatus::Waiting {
            return self.remove_player(player_id);
        }
        if !self.players.contains_key(&player_id) {
            return Err(RoomError::PlayerNotInRoom);
        }

        self.set_player_connected(player_id, false);
        self.status = RoomStatus::Finished;

        if player_id == self.host_id {
            if let Some(id) = self
                .player_order
                .iter()
                .copied()
                .find(|id| self.players.get(id).is_some_and(|p| p.connected))
            {
                self.host_id = id;
            }
        }

        Ok(!self.has_connected_players())
    }

    /// Whether any human is still connected
    pub fn has_connected_players(&self) -> bool {
        self.players.values().any(|p| p.connected)
    }

    fn ensure_seats_filled(&self) -> Result<(), RoomError> {
        if self.players.values().all(|p| p.connected) {
            Ok(())
        } else {
            Err(RoomError::PlayerLeft)
        }
    }

    pub fn set_player_connected(&mut self, player_id: Uuid, connected: bool) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.connected = connected;
        }
    }

    /// Name a connection plays under
    pub fn seat_name(&self, player_id: Uuid) -> Option<&str> {
        self.players.get(&player_id).map(|p| p.name.as_str())
    }

    /// Deal the first game. Returns any moves the bot made on its first turn.
    pub fn start_game(&mut self, requester_id: Uuid) -> Result<Vec<GameEvent>, RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost);
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.seats_taken() < SEATS {
            return Err(RoomError::NotEnoughPlayers);
        }

        let mut names: Vec<String> = self
            .player_order
            .iter()
            .filter_map(|id| self.players.get(id).map(|p| p.name.clone()))
            .collect();
        if let Some(bot) = &self.bot {
            names.push(bot.player.clone());
        }

        let config = GameConfig {
            players: names,
            hand_size: self.hand_size,
        };
        self.game = Some(Game::new(config, &mut self.rng)?);
        self.status = RoomStatus::InGame;

        self.run_bot()
    }

    /// Apply a connection's action, then let the bot answer.
    pub fn apply_action(
        &mut self,
        player_id: Uuid,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, RoomError> {
        let name = self
            .players
            .get(&player_id)
            .map(|p| p.name.clone())
            .ok_or(RoomError::PlayerNotInRoom)?;
        self.ensure_seats_filled()?;
        let game = self.game.as_mut().ok_or(RoomError::GameNotStarted)?;

        let mut events = game.apply_action(&name, action)?;
        events.extend(self.run_bot()?);
        Ok(events)
    }

    /// Reshuffle and deal again for the same seats (host only)
    pub fn reset_game(&mut self, requester_id: Uuid) -> Result<Vec<GameEvent>, RoomError> {
        if requester_id != self.host_id {
            return Err(RoomError::NotHost);
        }
        self.ensure_seats_filled()?;
        let game = self.game.as_mut().ok_or(RoomError::GameNotStarted)?;
        game.reset(&mut self.rng);
        self.status = RoomStatus::InGame;

        self.run_bot()
    }

    /// Let the bot act while it holds the turn, and track the room status
    fn run_bot(&mut self) -> Result<Vec<GameEvent>, RoomError> {
        let Some(game) = self.game.as_mut() else {
            return Ok(Vec::new());
        };

        let events = match &self.bot {
            Some(bot) => bot.take_turn(game)?,
            None => Vec::new(),
        };

        if game.is_finished() {
            self.status = RoomStatus::Finished;
        }
        Ok(events)
    }

    /// State as seen from one seat, or the full state for `None`
    pub fn state_view(&self, perspective: Option<&str>) -> Option<StateView> {
        let game = self.game.as_ref()?;

        let viewers: Vec<&str> = match perspective {
            Some(name) => vec![name],
            None => game.turn_order(),
        };
        let legal_moves = viewers
            .into_iter()
            .filter_map(|name| {
                game.legal_moves(name)
                    .ok()
                    .map(|moves| (name.to_string(), moves))
            })
            .collect();

        Some(StateView {
            state: game.snapshot(perspective),
            legal_moves,
        })
    }

    /// Per-connection state views for everyone in the room
    pub fn seat_views(&self) -> Vec<(Uuid, StateView)> {
        self.player_order
            .iter()
            .filter_map(|id| {
                let name = self.seat_name(*id)?;
                Some((*id, self.state_view(Some(name))?))
            })
            .collect()
    }

    pub fn get_current_player(&self) -> Option<String> {
        self.game.as_ref().map(|g| g.current_player().to_string())
    }

    /// Final status, winner and block scores once the game is over
    pub fn outcome(&self) -> Option<(GameStatus, Option<String>, Option<BTreeMap<String, u32>>)> {
        let game = self.game.as_ref()?;
        if !game.is_finished() {
            return None;
        }
        Some((
            game.status(),
            game.winner().map(str::to_string),
            game.block_scores().cloned(),
        ))
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            name: self.name.clone(),
            players: self
                .player_order
                .iter()
                .filter_map(|id| self.players.get(id).map(|p| p.to_info()))
                .collect(),
            vs_bot: self.bot.is_some(),
            host_id: self.host_id,
            status: self.status,
        }
    }
}
