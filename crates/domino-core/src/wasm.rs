//! WebAssembly bindings for the domino engine.
//!
//! This module exposes the game engine to JavaScript through wasm-bindgen.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::actions::GameAction;
#[cfg(feature = "wasm")]
use crate::bot::Bot;
#[cfg(feature = "wasm")]
use crate::game::{Game, GameConfig};
#[cfg(feature = "wasm")]
use rand::rngs::StdRng;
#[cfg(feature = "wasm")]
use rand::SeedableRng;

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct WasmGame {
    game: Game,
    rng: StdRng,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl WasmGame {
    /// Create a new game from a JSON `GameConfig` (empty string for defaults)
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<WasmGame, JsValue> {
        let config: GameConfig = if config_json.trim().is_empty() {
            GameConfig::default()
        } else {
            serde_json::from_str(config_json)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };

        let mut rng = StdRng::from_entropy();
        let game = Game::new(config, &mut rng).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(WasmGame { game, rng })
    }

    /// Get the game state as JSON, hiding other hands when a perspective is given
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self, perspective: Option<String>) -> String {
        let snapshot = self.game.snapshot(perspective.as_deref());
        serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the current player's name
    #[wasm_bindgen(js_name = getCurrentPlayer)]
    pub fn get_current_player(&self) -> String {
        self.game.current_player().to_string()
    }

    /// Get legal moves for a player as a JSON array of `{index, ends}`
    #[wasm_bindgen(js_name = getLegalMoves)]
    pub fn get_legal_moves(&self, player: &str) -> Result<String, JsValue> {
        let moves = self
            .game
            .legal_moves(player)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(serde_json::to_string(&moves).unwrap_or_else(|_| "[]".to_string()))
    }

    /// Apply an action from JSON, returns events JSON or error
    #[wasm_bindgen(js_name = applyAction)]
    pub fn apply_action(&mut self, player: &str, action_json: &str) -> Result<String, JsValue> {
        let action: GameAction = serde_json::from_str(action_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid action JSON: {}", e)))?;

        match self.game.apply_action(player, action) {
            Ok(events) => Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())),
            Err(e) => Err(JsValue::from_str(&format!("Action failed: {}", e))),
        }
    }

    /// Reshuffle and deal a new game for the same players
    pub fn reset(&mut self) {
        self.game.reset(&mut self.rng);
    }

    /// Check if the game is finished
    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.game.is_finished()
    }

    /// Get the winner (if there is exactly one)
    #[wasm_bindgen(js_name = getWinner)]
    pub fn get_winner(&self) -> Option<String> {
        self.game.winner().map(str::to_string)
    }

    /// Get the bot's suggested action for a player as JSON
    #[wasm_bindgen(js_name = getBotAction)]
    pub fn get_bot_action(&self, player: &str) -> String {
        match Bot::new(player).choose_action(&self.game) {
            Some(action) => serde_json::to_string(&action).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }
}
