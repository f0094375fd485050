//! Core game state machine.
//!
//! This module contains the `Game` struct with all rule enforcement, its
//! configuration, the error types and the read-model snapshot handed to
//! presentation layers.

use crate::actions::{GameAction, GameEvent, Move};
use crate::board::{Board, End};
use crate::player::PlayerState;
use crate::tile::{self, Tile, SET_SIZE};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Tiles dealt to each player at the start of a game
pub const DEFAULT_HAND_SIZE: usize = 7;

/// Number of seats at the table
pub const PLAYER_COUNT: usize = 2;

/// Game status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Players are still taking turns
    Ongoing,
    /// A player emptied their hand
    Won,
    /// Every player passed in a row; hands were scored
    Blocked,
}

/// Why an action was refused on turn grounds
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TurnViolation {
    #[error("Game has already finished")]
    GameFinished,

    #[error("It is not {player}'s turn (current player is {current})")]
    OutOfTurn { player: String, current: String },
}

/// Why a play was refused
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum IllegalMove {
    #[error("Tile {index} is not a legal move")]
    NotPlayable { index: usize },

    #[error("Tile {index} cannot be played on the {end} end")]
    WrongEnd { index: usize, end: End },

    #[error("Tile {tile} does not fit on the {end} end")]
    DoesNotFit { tile: Tile, end: End },
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Unknown player '{0}'")]
    UnknownPlayer(String),

    #[error(transparent)]
    TurnViolation(#[from] TurnViolation),

    #[error(transparent)]
    IllegalMove(#[from] IllegalMove),

    #[error("Cannot draw: the stock is empty")]
    EmptyStock,

    #[error("Cannot pass: legal moves are available")]
    MovesAvailable,

    #[error("Cannot pass: the stock still has tiles")]
    StockNotEmpty,

    #[error("Invalid game configuration: {0}")]
    InvalidConfig(String),
}

/// Table setup used by `Game::new` and `Game::reset`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Player names in turn order
    pub players: Vec<String>,
    /// Tiles dealt to each player
    pub hand_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            players: vec!["player".to_string(), "opponent".to_string()],
            hand_size: DEFAULT_HAND_SIZE,
        }
    }
}

impl GameConfig {
    /// Two named players with the default hand size
    pub fn with_players(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            players: vec![first.into(), second.into()],
            ..Self::default()
        }
    }

    /// Check the table can actually be dealt
    pub fn validate(&self) -> Result<(), GameError> {
        if self.players.len() != PLAYER_COUNT {
            return Err(GameError::InvalidConfig(format!(
                "exactly {} players are required, got {}",
                PLAYER_COUNT,
                self.players.len()
            )));
        }
        if self.players.iter().any(|name| name.trim().is_empty()) {
            return Err(GameError::InvalidConfig(
                "player names must not be empty".to_string(),
            ));
        }
        let unique: HashSet<_> = self.players.iter().collect();
        if unique.len() != self.players.len() {
            return Err(GameError::InvalidConfig(
                "player names must be unique".to_string(),
            ));
        }
        if self.hand_size * self.players.len() > SET_SIZE {
            return Err(GameError::InvalidConfig(format!(
                "cannot deal {} tiles to {} players from a set of {}",
                self.hand_size,
                self.players.len(),
                SET_SIZE
            )));
        }
        Ok(())
    }
}

/// Tiles shown in full or reduced to a count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TileView {
    Tiles(Vec<Tile>),
    Count(usize),
}

impl TileView {
    fn reveal(tiles: &[Tile], visible: bool) -> Self {
        if visible {
            TileView::Tiles(tiles.to_vec())
        } else {
            TileView::Count(tiles.len())
        }
    }

    /// Number of tiles, whether shown or hidden
    pub fn len(&self) -> usize {
        match self {
            TileView::Tiles(tiles) => tiles.len(),
            TileView::Count(count) => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One player's entry in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub hand: TileView,
}

/// Read model of a game for presentation layers.
///
/// Built for an optional perspective: with one, the stock and every other
/// player's hand are reduced to counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub board: Vec<Tile>,
    pub stock: TileView,
    pub current_player: String,
    pub status: GameStatus,
    pub winner: Option<String>,
    pub passes_in_row: u32,
    /// Players in turn order
    pub players: Vec<PlayerView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_scores: Option<BTreeMap<String, u32>>,
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    config: GameConfig,
    /// Players in turn order
    players: Vec<PlayerState>,
    /// Undealt tiles; the top of the stock is the end of the vector
    stock: Vec<Tile>,
    board: Board,
    /// Seat index of the player to act
    current_player: usize,
    status: GameStatus,
    winner: Option<usize>,
    block_scores: Option<BTreeMap<String, u32>>,
    passes_in_row: u32,
}

impl Game {
    /// Create and deal a new game
    pub fn new<R: Rng + ?Sized>(config: GameConfig, rng: &mut R) -> Result<Self, GameError> {
        config.validate()?;
        let mut game = Self::seated(config);
        game.reset(rng);
        Ok(game)
    }

    /// Create a game for "player" and "opponent" with 7-tile hands
    pub fn two_player<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut game = Self::seated(GameConfig::default());
        game.reset(rng);
        game
    }

    /// An undealt table for an already validated config
    fn seated(config: GameConfig) -> Self {
        let players = config.players.iter().map(PlayerState::new).collect();
        Self {
            config,
            players,
            stock: Vec::new(),
            board: Board::new(),
            current_player: 0,
            status: GameStatus::Ongoing,
            winner: None,
            block_scores: None,
            passes_in_row: 0,
        }
    }

    /// Start over with a freshly shuffled stock, keeping the same table
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.stock = tile::shuffled_stock(rng);

        let hand_size = self.config.hand_size;
        for player in &mut self.players {
            let split = self.stock.len() - hand_size;
            player.hand = self.stock.split_off(split);
            player.hand.reverse();
        }

        self.board = Board::new();
        self.status = GameStatus::Ongoing;
        self.winner = None;
        self.block_scores = None;
        self.passes_in_row = 0;
        self.current_player = self.choose_starting_player(rng);
    }

    /// Start over with a different table
    pub fn reset_with<R: Rng + ?Sized>(
        &mut self,
        config: GameConfig,
        rng: &mut R,
    ) -> Result<(), GameError> {
        config.validate()?;
        self.players = config.players.iter().map(PlayerState::new).collect();
        self.config = config;
        self.reset(rng);
        Ok(())
    }

    /// The holder of the highest double starts. Ties between equal doubles,
    /// or no doubles at all, are settled at random.
    fn choose_starting_player<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let mut best: Option<u8> = None;
        let mut tied: Vec<usize> = Vec::new();

        for (seat, player) in self.players.iter().enumerate() {
            let Some(double) = player.highest_double() else {
                continue;
            };
            match best {
                Some(value) if double.left() < value => {}
                Some(value) if double.left() == value => tied.push(seat),
                _ => {
                    best = Some(double.left());
                    tied = vec![seat];
                }
            }
        }

        match tied.as_slice() {
            [only] => *only,
            [] => rng.gen_range(0..self.players.len()),
            many => many[rng.gen_range(0..many.len())],
        }
    }

    // ==================== Queries ====================

    /// The configuration this game was dealt with
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Player names in turn order
    pub fn turn_order(&self) -> Vec<&str> {
        self.players.iter().map(|p| p.name.as_str()).collect()
    }

    /// All players in turn order
    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    /// Look up a player by name
    pub fn player(&self, name: &str) -> Result<&PlayerState, GameError> {
        let seat = self.seat(name)?;
        Ok(&self.players[seat])
    }

    /// A copy of a player's hand
    pub fn player_hand(&self, name: &str) -> Result<Vec<Tile>, GameError> {
        Ok(self.player(name)?.hand.clone())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn stock(&self) -> &[Tile] {
        &self.stock
    }

    /// Name of the player to act
    pub fn current_player(&self) -> &str {
        &self.players[self.current_player].name
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        self.status != GameStatus::Ongoing
    }

    /// Winner's name, if there is a single winner
    pub fn winner(&self) -> Option<&str> {
        self.winner.map(|seat| self.players[seat].name.as_str())
    }

    /// Pip totals per player, set once the game is blocked
    pub fn block_scores(&self) -> Option<&BTreeMap<String, u32>> {
        self.block_scores.as_ref()
    }

    pub fn passes_in_row(&self) -> u32 {
        self.passes_in_row
    }

    /// Open values at the left and right ends, or `None` on an empty board
    pub fn board_ends(&self) -> Option<(u8, u8)> {
        self.board.ends()
    }

    /// Moves available to a player, in hand order.
    ///
    /// Empty once the game is over. Does not consider whose turn it is.
    pub fn legal_moves(&self, player: &str) -> Result<Vec<Move>, GameError> {
        let seat = self.seat(player)?;
        if self.status != GameStatus::Ongoing {
            return Ok(Vec::new());
        }
        Ok(self.players[seat].moves_against(&self.board))
    }

    /// Every action the player may take right now
    pub fn valid_actions(&self, player: &str) -> Vec<GameAction> {
        let Ok(seat) = self.ensure_can_act(player) else {
            return Vec::new();
        };

        let moves = self.players[seat].moves_against(&self.board);
        if moves.is_empty() {
            return if self.stock.is_empty() {
                vec![GameAction::Pass]
            } else {
                vec![GameAction::Draw]
            };
        }

        moves
            .iter()
            .flat_map(|mv| {
                mv.ends.iter().map(|&end| GameAction::Play {
                    tile_index: mv.index,
                    end,
                })
            })
            .collect()
    }

    // ==================== Actions ====================

    /// Play a tile from hand, returning it as placed on the board
    pub fn play_tile(
        &mut self,
        player: &str,
        tile_index: usize,
        end: End,
    ) -> Result<Tile, GameError> {
        let seat = self.ensure_can_act(player)?;

        let moves = self.players[seat].moves_against(&self.board);
        let mv = moves
            .iter()
            .find(|m| m.index == tile_index)
            .ok_or(IllegalMove::NotPlayable { index: tile_index })?;
        if !mv.allows(end) {
            return Err(IllegalMove::WrongEnd {
                index: tile_index,
                end,
            }
            .into());
        }

        let tile = self.players[seat].hand[tile_index];
        let placed = self
            .board
            .place(tile, end)
            .ok_or(IllegalMove::DoesNotFit { tile, end })?;
        let removed = self.players[seat].take(tile_index);
        debug_assert_eq!(removed, Some(tile));

        if self.players[seat].has_emptied_hand() {
            self.status = GameStatus::Won;
            self.winner = Some(seat);
            return Ok(placed);
        }

        self.passes_in_row = 0;
        self.advance_turn();
        Ok(placed)
    }

    /// Draw the top tile of the stock into the player's hand.
    ///
    /// The turn does not pass; the player may play the new tile or draw again.
    pub fn draw_tile(&mut self, player: &str) -> Result<Tile, GameError> {
        let seat = self.ensure_can_act(player)?;
        let tile = self.stock.pop().ok_or(GameError::EmptyStock)?;
        self.players[seat].receive(tile);
        Ok(tile)
    }

    /// Pass when there is nothing to play and nothing to draw
    pub fn pass_turn(&mut self, player: &str) -> Result<(), GameError> {
        let seat = self.ensure_can_act(player)?;
        if !self.players[seat].moves_against(&self.board).is_empty() {
            return Err(GameError::MovesAvailable);
        }
        if !self.stock.is_empty() {
            return Err(GameError::StockNotEmpty);
        }

        self.passes_in_row += 1;
        if self.passes_in_row as usize >= self.players.len() {
            self.finish_blocked();
            return Ok(());
        }
        self.advance_turn();
        Ok(())
    }

    /// Apply an action to the game state
    pub fn apply_action(
        &mut self,
        player: &str,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        let mut events = Vec::new();

        match action {
            GameAction::Play { tile_index, end } => {
                let tile = self.play_tile(player, tile_index, end)?;
                events.push(GameEvent::TilePlayed {
                    player: player.to_string(),
                    tile,
                    end,
                });
            }

            GameAction::Draw => {
                self.draw_tile(player)?;
                events.push(GameEvent::TileDrawn {
                    player: player.to_string(),
                    stock_remaining: self.stock.len(),
                });
                return Ok(events);
            }

            GameAction::Pass => {
                self.pass_turn(player)?;
                events.push(GameEvent::TurnPassed {
                    player: player.to_string(),
                    passes_in_row: self.passes_in_row,
                });
            }
        }

        match self.status {
            GameStatus::Ongoing => events.push(GameEvent::TurnEnded {
                player: player.to_string(),
                next_player: self.current_player().to_string(),
            }),
            GameStatus::Won => events.push(GameEvent::GameWon {
                player: player.to_string(),
            }),
            GameStatus::Blocked => events.push(GameEvent::GameBlocked {
                scores: self.block_scores.clone().unwrap_or_default(),
                winner: self.winner().map(str::to_string),
            }),
        }

        Ok(events)
    }

    // ==================== Serialization ====================

    /// Snapshot of the game, optionally from one player's point of view
    pub fn snapshot(&self, perspective: Option<&str>) -> GameSnapshot {
        GameSnapshot {
            board: self.board.tiles(),
            stock: TileView::reveal(&self.stock, perspective.is_none()),
            current_player: self.current_player().to_string(),
            status: self.status,
            winner: self.winner().map(str::to_string),
            passes_in_row: self.passes_in_row,
            players: self
                .players
                .iter()
                .map(|p| PlayerView {
                    name: p.name.clone(),
                    hand: TileView::reveal(
                        &p.hand,
                        perspective.map_or(true, |viewer| viewer == p.name),
                    ),
                })
                .collect(),
            block_scores: self.block_scores.clone(),
        }
    }

    // ==================== Test and tooling helpers ====================

    /// Replace the board with tiles already in chain order
    pub fn set_board(&mut self, tiles: impl IntoIterator<Item = Tile>) {
        self.board = Board::from_tiles(tiles);
    }

    /// Replace a player's hand
    pub fn set_hand(
        &mut self,
        player: &str,
        tiles: impl IntoIterator<Item = Tile>,
    ) -> Result<(), GameError> {
        let seat = self.seat(player)?;
        self.players[seat].hand = tiles.into_iter().collect();
        Ok(())
    }

    /// Replace the stock; the last tile is drawn first
    pub fn set_stock(&mut self, tiles: impl IntoIterator<Item = Tile>) {
        self.stock = tiles.into_iter().collect();
    }

    /// Hand the turn to a player
    pub fn set_current_player(&mut self, player: &str) -> Result<(), GameError> {
        self.current_player = self.seat(player)?;
        Ok(())
    }

    // ==================== Helper Methods ====================

    fn seat(&self, name: &str) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| GameError::UnknownPlayer(name.to_string()))
    }

    fn ensure_can_act(&self, player: &str) -> Result<usize, GameError> {
        let seat = self.seat(player)?;
        if self.status != GameStatus::Ongoing {
            return Err(TurnViolation::GameFinished.into());
        }
        if seat != self.current_player {
            return Err(TurnViolation::OutOfTurn {
                player: player.to_string(),
                current: self.current_player().to_string(),
            }
            .into());
        }
        Ok(seat)
    }

    fn advance_turn(&mut self) {
        self.current_player = (self.current_player + 1) % self.players.len();
    }

    fn finish_blocked(&mut self) {
        let scores: BTreeMap<String, u32> = self
            .players
            .iter()
            .map(|p| (p.name.clone(), p.pip_count()))
            .collect();

        let min_score = self.players.iter().map(PlayerState::pip_count).min();
        let lowest: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| Some(p.pip_count()) == min_score)
            .map(|(seat, _)| seat)
            .collect();

        self.status = GameStatus::Blocked;
        self.block_scores = Some(scores);
        self.winner = match lowest.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
    }
}
