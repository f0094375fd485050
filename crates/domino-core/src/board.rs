//! The chain of played tiles.
//!
//! This module contains:
//! - `End`, naming the two open ends of the chain
//! - `Board`, the ordered chain itself
//! - The placement rule that orients a tile to fit an end

use crate::tile::Tile;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One of the two open ends of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum End {
    #[serde(rename = "L", alias = "l")]
    Left,
    #[serde(rename = "R", alias = "r")]
    Right,
}

impl End {
    /// Both ends, left first
    pub const BOTH: [End; 2] = [End::Left, End::Right];

    /// Short label used on the wire and in prompts
    pub fn label(&self) -> &'static str {
        match self {
            End::Left => "L",
            End::Right => "R",
        }
    }
}

impl fmt::Display for End {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when an end label can't be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("End must be 'L' or 'R', got '{0}'")]
pub struct ParseEndError(pub String);

impl FromStr for End {
    type Err = ParseEndError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" | "LEFT" => Ok(End::Left),
            "R" | "RIGHT" => Ok(End::Right),
            _ => Err(ParseEndError(s.to_string())),
        }
    }
}

/// The played tiles, in chain order.
///
/// Every tile is stored in the orientation it was placed in, so the right
/// half of each tile equals the left half of the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    tiles: VecDeque<Tile>,
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from tiles already in chain order
    pub fn from_tiles(tiles: impl IntoIterator<Item = Tile>) -> Self {
        Self {
            tiles: tiles.into_iter().collect(),
        }
    }

    /// Number of tiles on the board
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether nothing has been played yet
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Iterate over the tiles from left to right
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Tiles from left to right
    pub fn tiles(&self) -> Vec<Tile> {
        self.tiles.iter().copied().collect()
    }

    /// Open pip values at the left and right ends, or `None` if empty
    pub fn ends(&self) -> Option<(u8, u8)> {
        let first = self.tiles.front()?;
        let last = self.tiles.back()?;
        Some((first.left(), last.right()))
    }

    /// Open pip value at one end
    pub fn end_value(&self, end: End) -> Option<u8> {
        let (left, right) = self.ends()?;
        Some(match end {
            End::Left => left,
            End::Right => right,
        })
    }

    /// Ends a tile could attach to, in left-then-right order
    pub fn fitting_ends(&self, tile: &Tile) -> Vec<End> {
        match self.ends() {
            None => End::BOTH.to_vec(),
            Some((left, right)) => {
                let mut ends = Vec::with_capacity(2);
                if tile.contains(left) {
                    ends.push(End::Left);
                }
                if tile.contains(right) {
                    ends.push(End::Right);
                }
                ends
            }
        }
    }

    /// The tile as it would be placed at `end`, or `None` if it doesn't fit.
    ///
    /// On the left the tile's right half must touch the open value; on the
    /// right its left half must. A tile is flipped when only its other half
    /// matches. Does not modify the board.
    pub fn orient(&self, tile: Tile, end: End) -> Option<Tile> {
        let Some(open) = self.end_value(end) else {
            return Some(tile);
        };

        match end {
            End::Left if tile.right() == open => Some(tile),
            End::Left if tile.left() == open => Some(tile.flipped()),
            End::Right if tile.left() == open => Some(tile),
            End::Right if tile.right() == open => Some(tile.flipped()),
            _ => None,
        }
    }

    /// Orient and place a tile, returning it as placed.
    ///
    /// Leaves the board untouched and returns `None` if it doesn't fit.
    pub fn place(&mut self, tile: Tile, end: End) -> Option<Tile> {
        let placed = self.orient(tile, end)?;
        match end {
            End::Left => self.tiles.push_front(placed),
            End::Right => self.tiles.push_back(placed),
        }
        Some(placed)
    }

    /// Whether every adjacent pair of tiles touches on equal pips
    pub fn is_continuous(&self) -> bool {
        self.tiles
            .iter()
            .zip(self.tiles.iter().skip(1))
            .all(|(a, b)| a.right() == b.left())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for tile in &self.tiles {
            write!(f, "{}", tile)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board() {
        let board = Board::new();
        assert!(board.is_empty());
        assert_eq!(board.ends(), None);
        assert_eq!(board.fitting_ends(&Tile::new(3, 5)), vec![End::Left, End::Right]);
    }

    #[test]
    fn test_first_tile_is_placed_as_is() {
        let mut board = Board::new();
        let placed = board.place(Tile::new(5, 2), End::Right);
        assert_eq!(placed, Some(Tile::new(5, 2)));
        assert_eq!(board.ends(), Some((5, 2)));
    }

    #[test]
    fn test_right_end_reorients() {
        let mut board = Board::from_tiles([Tile::new(1, 4)]);
        assert_eq!(board.place(Tile::new(2, 4), End::Right), Some(Tile::new(4, 2)));
        assert_eq!(board.ends(), Some((1, 2)));
        assert!(board.is_continuous());
    }

    #[test]
    fn test_left_end_placement() {
        let mut board = Board::from_tiles([Tile::new(3, 5)]);

        // Matching right half goes on unchanged
        assert_eq!(board.place(Tile::new(0, 3), End::Left), Some(Tile::new(0, 3)));
        // Matching left half is flipped
        assert_eq!(board.place(Tile::new(0, 6), End::Left), Some(Tile::new(6, 0)));

        assert_eq!(board.tiles(), vec![Tile::new(6, 0), Tile::new(0, 3), Tile::new(3, 5)]);
        assert_eq!(board.ends(), Some((6, 5)));
        assert!(board.is_continuous());
    }

    #[test]
    fn test_tile_that_does_not_fit() {
        let mut board = Board::from_tiles([Tile::new(1, 4)]);
        assert_eq!(board.place(Tile::new(2, 3), End::Left), None);
        assert_eq!(board.place(Tile::new(1, 1), End::Right), None);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_fitting_ends() {
        let board = Board::from_tiles([Tile::new(1, 4)]);
        assert_eq!(board.fitting_ends(&Tile::new(4, 1)), vec![End::Left, End::Right]);
        assert_eq!(board.fitting_ends(&Tile::new(6, 1)), vec![End::Left]);
        assert_eq!(board.fitting_ends(&Tile::new(2, 4)), vec![End::Right]);
        assert!(board.fitting_ends(&Tile::new(2, 3)).is_empty());
    }

    #[test]
    fn test_end_parsing() {
        assert_eq!("L".parse::<End>(), Ok(End::Left));
        assert_eq!("r".parse::<End>(), Ok(End::Right));
        assert_eq!(" right ".parse::<End>(), Ok(End::Right));
        assert!("x".parse::<End>().is_err());

        assert_eq!(serde_json::to_string(&End::Left).unwrap(), "\"L\"");
        assert_eq!(serde_json::from_str::<End>("\"r\"").unwrap(), End::Right);
    }

    #[test]
    fn test_display() {
        let board = Board::from_tiles([Tile::new(1, 4), Tile::new(4, 2)]);
        assert_eq!(board.to_string(), "[1|4][4|2]");
    }
}
