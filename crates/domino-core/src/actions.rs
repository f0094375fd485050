//! Game actions that players can take.
//!
//! This module defines the candidate moves reported to players, every action
//! a player can submit, and the events that result from those actions.

use crate::board::End;
use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A playable tile in hand and the board ends it can attach to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// Index of the tile in the player's hand
    pub index: usize,
    /// Ends the tile fits, left before right
    pub ends: Vec<End>,
}

impl Move {
    pub fn new(index: usize, ends: Vec<End>) -> Self {
        Self { index, ends }
    }

    /// Whether the tile may go on `end`
    pub fn allows(&self, end: End) -> bool {
        self.ends.contains(&end)
    }
}

/// All possible actions a player can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Play the tile at `tile_index` on the given end
    Play { tile_index: usize, end: End },
    /// Draw the top tile of the stock
    Draw,
    /// Pass the turn (only with no legal move and an empty stock)
    Pass,
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A tile was placed on the board
    TilePlayed {
        player: String,
        /// The tile as it sits on the board (possibly flipped)
        tile: Tile,
        end: End,
    },

    /// A tile was drawn from the stock
    TileDrawn {
        player: String,
        stock_remaining: usize,
    },

    /// A player passed
    TurnPassed {
        player: String,
        passes_in_row: u32,
    },

    /// Turn ended
    TurnEnded {
        player: String,
        next_player: String,
    },

    /// A player emptied their hand
    GameWon { player: String },

    /// Nobody can move; hands were scored by pip count
    GameBlocked {
        scores: BTreeMap<String, u32>,
        /// Lowest score, or `None` on a tie
        winner: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_allows() {
        let mv = Move::new(0, vec![End::Right]);
        assert!(mv.allows(End::Right));
        assert!(!mv.allows(End::Left));
    }

    #[test]
    fn test_action_json_shape() {
        let play = GameAction::Play {
            tile_index: 2,
            end: End::Left,
        };
        let json = serde_json::to_string(&play).unwrap();
        assert_eq!(json, r#"{"Play":{"tile_index":2,"end":"L"}}"#);

        let parsed: GameAction = serde_json::from_str("\"Draw\"").unwrap();
        assert_eq!(parsed, GameAction::Draw);
    }

    #[test]
    fn test_move_json_shape() {
        let mv = Move::new(1, vec![End::Left, End::Right]);
        assert_eq!(
            serde_json::to_string(&mv).unwrap(),
            r#"{"index":1,"ends":["L","R"]}"#
        );
    }
}
