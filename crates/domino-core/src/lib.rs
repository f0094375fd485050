//! Domino - a two-player double-six domino rules engine
//!
//! This crate provides the core game logic, including:
//! - Tiles and the 28-tile double-six set
//! - The board chain and the placement rule that orients tiles
//! - Player hands
//! - Game state machine with full rule enforcement and blocked-game scoring
//!
//! # Architecture
//!
//! The game engine is designed to be platform-agnostic. It can be compiled to:
//! - Native Rust for server-side game hosting
//! - WebAssembly for client-side single-player or local multiplayer
//!
//! The engine performs no I/O and no locking. Randomness is always passed in
//! by the caller, so a seeded rng reproduces a game exactly.
//!
//! # Modules
//!
//! - [`tile`]: Tiles and the double-six set
//! - [`board`]: The chain of played tiles
//! - [`player`]: Player hands
//! - [`actions`]: Moves, actions and events
//! - [`game`]: Game state machine
//! - [`bot`]: First-legal-move computer opponent

pub mod actions;
pub mod board;
pub mod bot;
pub mod game;
pub mod player;
pub mod tile;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent, Move};
pub use board::{Board, End, ParseEndError};
pub use bot::Bot;
pub use game::{
    Game, GameConfig, GameError, GameSnapshot, GameStatus, IllegalMove, PlayerView, TileView,
    TurnViolation, DEFAULT_HAND_SIZE, PLAYER_COUNT,
};
pub use player::PlayerState;
pub use tile::{double_six_set, Tile, TileError, MAX_PIP, SET_SIZE};
