//! Player state and hand management.

use crate::actions::Move;
use crate::board::Board;
use crate::tile::{self, Tile};
use serde::{Deserialize, Serialize};

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Display name, unique within a game
    pub name: String,
    /// Tiles in hand, in the order they were received
    pub hand: Vec<Tile>,
}

impl PlayerState {
    /// Create a player with an empty hand
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hand: Vec::new(),
        }
    }

    /// Number of tiles held
    pub fn hand_size(&self) -> usize {
        self.hand.len()
    }

    /// Whether the hand is empty (the player has dominoed)
    pub fn has_emptied_hand(&self) -> bool {
        self.hand.is_empty()
    }

    /// Pip total of the hand, used as the blocked-game score
    pub fn pip_count(&self) -> u32 {
        tile::pip_total(&self.hand)
    }

    /// Highest double held, if any
    pub fn highest_double(&self) -> Option<Tile> {
        tile::highest_double(&self.hand)
    }

    /// Add a tile to the end of the hand
    pub fn receive(&mut self, tile: Tile) {
        self.hand.push(tile);
    }

    /// Remove and return the tile at `index`
    pub fn take(&mut self, index: usize) -> Option<Tile> {
        if index < self.hand.len() {
            Some(self.hand.remove(index))
        } else {
            None
        }
    }

    /// Moves this hand could make against the board, in hand order
    pub fn moves_against(&self, board: &Board) -> Vec<Move> {
        self.hand
            .iter()
            .enumerate()
            .filter_map(|(index, tile)| {
                let ends = board.fitting_ends(tile);
                (!ends.is_empty()).then(|| Move::new(index, ends))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::End;

    #[test]
    fn test_pip_count() {
        let mut player = PlayerState::new("player");
        assert_eq!(player.pip_count(), 0);

        player.receive(Tile::new(1, 3));
        player.receive(Tile::new(5, 6));
        assert_eq!(player.pip_count(), 15);
        assert_eq!(player.hand_size(), 2);
    }

    #[test]
    fn test_take_keeps_order() {
        let mut player = PlayerState::new("player");
        player.hand = vec![Tile::new(0, 1), Tile::new(2, 3), Tile::new(4, 5)];

        assert_eq!(player.take(1), Some(Tile::new(2, 3)));
        assert_eq!(player.hand, vec![Tile::new(0, 1), Tile::new(4, 5)]);
        assert_eq!(player.take(5), None);
        assert_eq!(player.hand_size(), 2);
    }

    #[test]
    fn test_moves_against_empty_board() {
        let mut player = PlayerState::new("player");
        player.hand = vec![Tile::new(6, 6), Tile::new(1, 2)];

        let moves = player.moves_against(&Board::new());
        assert_eq!(moves.len(), 2);
        assert!(moves.iter().all(|m| m.ends == vec![End::Left, End::Right]));
    }

    #[test]
    fn test_moves_against_skips_dead_tiles() {
        let mut player = PlayerState::new("player");
        player.hand = vec![Tile::new(2, 3), Tile::new(6, 1), Tile::new(4, 4)];

        let moves = player.moves_against(&Board::from_tiles([Tile::new(1, 4)]));
        assert_eq!(
            moves,
            vec![Move::new(1, vec![End::Left]), Move::new(2, vec![End::Right])]
        );
    }

    #[test]
    fn test_highest_double() {
        let mut player = PlayerState::new("player");
        player.hand = vec![Tile::new(3, 3), Tile::new(5, 5), Tile::new(2, 6)];
        assert_eq!(player.highest_double(), Some(Tile::new(5, 5)));
        assert!(!player.has_emptied_hand());
    }
}
