//! Computer opponent.
//!
//! The bot plays the first legal tile in hand on the first end it fits,
//! draws while it has nothing to play, and passes once the stock is empty.

use crate::actions::{GameAction, GameEvent};
use crate::game::{Game, GameError};

/// A bot player that can decide on actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bot {
    pub player: String,
}

impl Bot {
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
        }
    }

    /// Choose the next action, or `None` if the bot can't act right now
    pub fn choose_action(&self, game: &Game) -> Option<GameAction> {
        // Plays come first in hand order, then Draw or Pass
        game.valid_actions(&self.player).into_iter().next()
    }

    /// Act until the turn passes to someone else or the game ends.
    ///
    /// Returns every event produced along the way.
    pub fn take_turn(&self, game: &mut Game) -> Result<Vec<GameEvent>, GameError> {
        let mut events = Vec::new();

        while game.current_player() == self.player && !game.is_finished() {
            let Some(action) = self.choose_action(game) else {
                break;
            };
            events.extend(game.apply_action(&self.player, action)?);
            if action != GameAction::Draw {
                break;
            }
        }

        Ok(events)
    }
}
