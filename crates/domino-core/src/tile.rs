//! Domino tiles and the double-six set.
//!
//! This module contains:
//! - The `Tile` value type (a pair of pip counts)
//! - Construction of the 28-tile double-six set
//! - Helpers used by the board and scoring rules

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Highest pip value in a double-six set
pub const MAX_PIP: u8 = 6;

/// Number of tiles in a double-six set
pub const SET_SIZE: usize = 28;

/// A pip pair that is not part of a double-six set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Pip values must be in 0..={max}, got ({left}, {right})", max = MAX_PIP)]
pub struct TileError {
    pub left: u8,
    pub right: u8,
}

/// A domino tile.
///
/// The two halves are stored in the order given. Tiles in the stock are
/// created with `left <= right`, but a tile on the board may be flipped so
/// that it lines up with its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(u8, u8)")]
pub struct Tile(u8, u8);

impl Tile {
    /// Create a tile with the given halves, keeping their order.
    pub fn try_new(left: u8, right: u8) -> Result<Self, TileError> {
        if left <= MAX_PIP && right <= MAX_PIP {
            Ok(Self(left, right))
        } else {
            Err(TileError { left, right })
        }
    }

    /// Create a tile from known-good halves.
    ///
    /// # Panics
    ///
    /// Panics if either half is above [`MAX_PIP`]. Use [`Tile::try_new`] or
    /// `Tile::try_from` for untrusted input.
    pub fn new(left: u8, right: u8) -> Self {
        match Self::try_new(left, right) {
            Ok(tile) => tile,
            Err(err) => panic!("{err}"),
        }
    }

    /// Left half
    pub fn left(&self) -> u8 {
        self.0
    }

    /// Right half
    pub fn right(&self) -> u8 {
        self.1
    }

    /// Both halves as a tuple
    pub fn pips(&self) -> (u8, u8) {
        (self.0, self.1)
    }

    /// The same tile with its halves swapped
    pub fn flipped(&self) -> Self {
        Self(self.1, self.0)
    }

    /// The same tile with the lower half first
    pub fn normalized(&self) -> Self {
        if self.0 <= self.1 {
            *self
        } else {
            self.flipped()
        }
    }

    /// Whether both halves show the same value
    pub fn is_double(&self) -> bool {
        self.0 == self.1
    }

    /// Total pips on the tile (used for blocked-game scoring)
    pub fn pip_sum(&self) -> u32 {
        self.0 as u32 + self.1 as u32
    }

    /// Whether either half shows `pip`
    pub fn contains(&self, pip: u8) -> bool {
        self.0 == pip || self.1 == pip
    }

    /// Compare as an unordered pair, ignoring orientation
    pub fn matches(&self, other: &Tile) -> bool {
        self.normalized() == other.normalized()
    }
}

impl TryFrom<(u8, u8)> for Tile {
    type Error = TileError;

    fn try_from((left, right): (u8, u8)) -> Result<Self, Self::Error> {
        Tile::try_new(left, right)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}|{}]", self.0, self.1)
    }
}

/// The full double-six set in ascending order: (0,0), (0,1), ... (6,6)
pub fn double_six_set() -> Vec<Tile> {
    let mut set = Vec::with_capacity(SET_SIZE);
    for left in 0..=MAX_PIP {
        for right in left..=MAX_PIP {
            set.push(Tile(left, right));
        }
    }
    set
}

/// A freshly shuffled stock
pub fn shuffled_stock<R: Rng + ?Sized>(rng: &mut R) -> Vec<Tile> {
    let mut stock = double_six_set();
    stock.shuffle(rng);
    stock
}

/// Highest double in a set of tiles, if any
pub fn highest_double(tiles: &[Tile]) -> Option<Tile> {
    tiles
        .iter()
        .filter(|t| t.is_double())
        .max_by_key(|t| t.left())
        .copied()
}

/// Sum of pips over a set of tiles
pub fn pip_total(tiles: &[Tile]) -> u32 {
    tiles.iter().map(Tile::pip_sum).sum()
}
