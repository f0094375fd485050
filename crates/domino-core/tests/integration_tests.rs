//! Integration tests for the domino engine.
//!
//! These tests verify complete game flows from the deal through to a win or a
//! blocked finish, and the engine's invariants over many shuffles.

use domino_core::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Every tile in the game, sorted, regardless of where it sits
fn all_tiles(game: &Game) -> Vec<Tile> {
    let mut tiles: Vec<Tile> = game.stock().to_vec();
    for player in game.players() {
        tiles.extend(player.hand.iter().copied());
    }
    tiles.extend(game.board().iter().copied());

    let mut normalized: Vec<Tile> = tiles.iter().map(Tile::normalized).collect();
    normalized.sort_by_key(|t| t.pips());
    normalized
}

/// Let both seats play as bots until the game ends
fn play_out(game: &mut Game) {
    let bots: Vec<Bot> = game.turn_order().iter().map(|name| Bot::new(*name)).collect();
    let mut rounds = 0;
    while !game.is_finished() && rounds < 200 {
        for bot in &bots {
            bot.take_turn(game).unwrap();
        }
        rounds += 1;
    }
}

/// A game stripped down to the given board and hands, "player" to act
fn arranged(board: &[(u8, u8)], player: &[(u8, u8)], opponent: &[(u8, u8)]) -> Game {
    let mut rng = StdRng::seed_from_u64(0);
    let mut game = Game::two_player(&mut rng);
    game.set_board(board.iter().map(|&(a, b)| Tile::new(a, b)));
    game.set_hand("player", player.iter().map(|&(a, b)| Tile::new(a, b))).unwrap();
    game.set_hand("opponent", opponent.iter().map(|&(a, b)| Tile::new(a, b))).unwrap();
    game.set_stock([]);
    game.set_current_player("player").unwrap();
    game
}

#[test]
fn test_forced_reorientation() {
    let mut game = arranged(&[(1, 4)], &[(2, 4), (6, 1)], &[(0, 0)]);

    let placed = game.play_tile("player", 0, End::Right).unwrap();

    assert_eq!(placed, Tile::new(4, 2));
    assert_eq!(game.board().tiles(), vec![Tile::new(1, 4), Tile::new(4, 2)]);
    assert_eq!(game.board_ends(), Some((1, 2)));
}

#[test]
fn test_turn_round_trip_to_blocked() {
    let mut game = arranged(&[(2, 2), (2, 4)], &[(1, 3)], &[(5, 6)]);

    game.pass_turn("player").unwrap();
    assert_eq!(game.status(), GameStatus::Ongoing);
    assert_eq!(game.passes_in_row(), 1);

    let events = game.apply_action("opponent", GameAction::Pass).unwrap();

    let scores = BTreeMap::from([("opponent".to_string(), 11), ("player".to_string(), 4)]);
    assert_eq!(game.status(), GameStatus::Blocked);
    assert_eq!(game.block_scores(), Some(&scores));
    assert_eq!(game.winner(), Some("player"));
    assert_eq!(
        events.last(),
        Some(&GameEvent::GameBlocked {
            scores,
            winner: Some("player".to_string()),
        })
    );
}

#[test]
fn test_win_ignores_remaining_stock() {
    let mut game = arranged(&[(2, 3)], &[(3, 3)], &[(0, 1), (5, 5)]);
    game.set_stock([Tile::new(6, 6), Tile::new(0, 4)]);

    let events = game
        .apply_action(
            "player",
            GameAction::Play {
                tile_index: 0,
                end: End::Right,
            },
        )
        .unwrap();

    assert_eq!(game.status(), GameStatus::Won);
    assert_eq!(game.winner(), Some("player"));
    assert_eq!(
        events.last(),
        Some(&GameEvent::GameWon {
            player: "player".to_string()
        })
    );
}

#[test]
fn test_rejected_actions_leave_state_untouched() {
    let mut game = arranged(&[(1, 4)], &[(2, 4), (3, 3)], &[(4, 4)]);
    game.set_stock([Tile::new(5, 6)]);
    let before = game.clone();

    let attempts: Vec<(&str, GameAction)> = vec![
        ("ghost", GameAction::Draw),
        ("opponent", GameAction::Draw),
        ("player", GameAction::Play { tile_index: 1, end: End::Left }),
        ("player", GameAction::Play { tile_index: 0, end: End::Left }),
        ("player", GameAction::Play { tile_index: 7, end: End::Right }),
        ("player", GameAction::Pass),
    ];
    for (player, action) in attempts {
        assert!(game.apply_action(player, action).is_err());
        assert_eq!(game, before);
    }

    // Stock-related refusals
    game.set_hand("player", [Tile::new(3, 3)]).unwrap();
    let before = game.clone();
    assert_eq!(game.pass_turn("player"), Err(GameError::StockNotEmpty));
    assert_eq!(game, before);

    game.set_stock([]);
    let before = game.clone();
    assert_eq!(game.draw_tile("player"), Err(GameError::EmptyStock));
    assert_eq!(game, before);
}

#[test]
fn test_finished_game_rejects_actions() {
    let mut game = arranged(&[(2, 3)], &[(3, 3)], &[(0, 1)]);
    game.play_tile("player", 0, End::Right).unwrap();
    let before = game.clone();

    assert_eq!(
        game.pass_turn("opponent"),
        Err(GameError::TurnViolation(TurnViolation::GameFinished))
    );
    assert_eq!(game, before);
}

#[test]
fn test_snapshot_hides_other_hands() {
    let mut rng = StdRng::seed_from_u64(99);
    let game = Game::two_player(&mut rng);
    let me = game.current_player().to_string();

    let view = game.snapshot(Some(&me));
    assert_eq!(view.stock, TileView::Count(14));
    for player in &view.players {
        if player.name == me {
            assert!(matches!(player.hand, TileView::Tiles(ref tiles) if tiles.len() == 7));
        } else {
            assert_eq!(player.hand, TileView::Count(7));
        }
    }

    let json = serde_json::to_string(&game.snapshot(None)).unwrap();
    let parsed: GameSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, game.snapshot(None));
}

#[test]
fn test_reset_restores_fresh_deal() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut game = Game::two_player(&mut rng);
    play_out(&mut game);
    assert!(game.is_finished());

    game.reset(&mut rng);
    assert_eq!(game.status(), GameStatus::Ongoing);
    assert_eq!(game.winner(), None);
    assert_eq!(game.block_scores(), None);
    assert_eq!(game.passes_in_row(), 0);
    assert!(game.board().is_empty());
    assert_eq!(all_tiles(&game), double_six_set());
}

#[test]
fn test_same_seed_same_game() {
    let a = Game::two_player(&mut StdRng::seed_from_u64(31));
    let b = Game::two_player(&mut StdRng::seed_from_u64(31));
    assert_eq!(a, b);
}

proptest! {
    #[test]
    fn prop_deal_uses_every_tile_once(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let game = Game::two_player(&mut rng);
        prop_assert_eq!(all_tiles(&game), double_six_set());
    }

    #[test]
    fn prop_full_games_keep_invariants(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Game::two_player(&mut rng);
        let bots: Vec<Bot> = game.turn_order().iter().map(|name| Bot::new(*name)).collect();

        let mut steps = 0;
        while !game.is_finished() && steps < 500 {
            let player = game.current_player().to_string();

            // Legal moves match the open ends exactly
            let hand = game.player_hand(&player).unwrap();
            let moves = game.legal_moves(&player).unwrap();
            for (index, tile) in hand.iter().enumerate() {
                let expected: Vec<End> = match game.board_ends() {
                    None => vec![End::Left, End::Right],
                    Some((left, right)) => End::BOTH
                        .into_iter()
                        .filter(|end| tile.contains(if *end == End::Left { left } else { right }))
                        .collect(),
                };
                let reported = moves
                    .iter()
                    .find(|m| m.index == index)
                    .map(|m| m.ends.clone())
                    .unwrap_or_default();
                prop_assert_eq!(reported, expected);
            }

            let bot = bots.iter().find(|b| b.player == player).unwrap();
            let action = bot.choose_action(&game).unwrap();
            game.apply_action(&player, action).unwrap();

            prop_assert!(game.board().is_continuous());
            prop_assert_eq!(all_tiles(&game), double_six_set());
            if let GameAction::Play { .. } = action {
                if !game.is_finished() {
                    prop_assert_eq!(game.passes_in_row(), 0);
                    prop_assert_ne!(game.current_player(), player.as_str());
                }
            }
            steps += 1;
        }

        prop_assert!(game.is_finished());
        match game.status() {
            GameStatus::Won => {
                let winner = game.winner().unwrap();
                prop_assert!(game.player_hand(winner).unwrap().is_empty());
            }
            GameStatus::Blocked => {
                let scores = game.block_scores().unwrap();
                let min = scores.values().min().copied();
                let lowest = scores.values().filter(|s| Some(**s) == min).count();
                prop_assert_eq!(game.winner().is_some(), lowest == 1);
            }
            GameStatus::Ongoing => unreachable!(),
        }
    }
}
