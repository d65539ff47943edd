use serde::{Deserialize, Serialize};

use crate::models::board::Mark;
use crate::models::game::{Game, GameOutcome};

/// What happened to a game between two snapshots of its record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameLifecycleEvent {
    Created {
        game_id: String,
        player1: String,
    },
    OpponentJoined {
        game_id: String,
        player2: String,
        first_turn: String,
    },
    MovePlayed {
        game_id: String,
        index: usize,
        mark: Mark,
        next_turn: String,
    },
    Finished {
        game_id: String,
        outcome: GameOutcome,
        winner: Option<String>,
    },
    Reset {
        game_id: String,
        first_turn: String,
    },
    Deleted {
        game_id: String,
    },
}

impl GameLifecycleEvent {
    /// Classifies a before/after pair. Returns `None` when nothing meaningful changed.
    pub fn between(old: Option<&Game>, new: Option<&Game>) -> Option<Self> {
        match (old, new) {
            (None, None) => None,
            (None, Some(new)) => Some(GameLifecycleEvent::Created {
                game_id: new.id.clone(),
                player1: new.player1.clone(),
            }),
            (Some(old), None) => Some(GameLifecycleEvent::Deleted {
                game_id: old.id.clone(),
            }),
            (Some(old), Some(new)) => Self::between_records(old, new),
        }
    }

    fn between_records(old: &Game, new: &Game) -> Option<Self> {
        if let (None, Some(player2)) = (&old.player2, &new.player2) {
            return Some(GameLifecycleEvent::OpponentJoined {
                game_id: new.id.clone(),
                player2: player2.clone(),
                first_turn: new.turn.clone(),
            });
        }

        if let Some(outcome @ (GameOutcome::Win | GameOutcome::Tie)) = new.outcome {
            if !old.is_finished() {
                return Some(GameLifecycleEvent::Finished {
                    game_id: new.id.clone(),
                    outcome,
                    winner: new.winner.clone(),
                });
            }
        }

        if new.state.is_empty() && (!old.state.is_empty() || old.is_finished()) {
            return Some(GameLifecycleEvent::Reset {
                game_id: new.id.clone(),
                first_turn: new.turn.clone(),
            });
        }

        let changed = old.state.changed_cells(&new.state);
        match changed.as_slice() {
            [index] => new
                .state
                .cell(*index)
                .map(|mark| GameLifecycleEvent::MovePlayed {
                    game_id: new.id.clone(),
                    index: *index,
                    mark,
                    next_turn: new.turn.clone(),
                }),
            _ => None,
        }
    }

    pub fn game_id(&self) -> &str {
        match self {
            GameLifecycleEvent::Created { game_id, .. }
            | GameLifecycleEvent::OpponentJoined { game_id, .. }
            | GameLifecycleEvent::MovePlayed { game_id, .. }
            | GameLifecycleEvent::Finished { game_id, .. }
            | GameLifecycleEvent::Reset { game_id, .. }
            | GameLifecycleEvent::Deleted { game_id } => game_id,
        }
    }
}

impl std::fmt::Display for GameLifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameLifecycleEvent::Created { game_id, player1 } => {
                write!(f, "Game {} created by {}", game_id, player1)
            }
            GameLifecycleEvent::OpponentJoined {
                game_id,
                player2,
                first_turn,
            } => write!(
                f,
                "{} joined game {}, {} moves first",
                player2, game_id, first_turn
            ),
            GameLifecycleEvent::MovePlayed {
                game_id,
                index,
                mark,
                next_turn,
            } => write!(
                f,
                "{} played cell {} in game {}, {} to move",
                mark, index, game_id, next_turn
            ),
            GameLifecycleEvent::Finished {
                game_id,
                outcome,
                winner,
            } => match winner {
                Some(winner) => write!(f, "Game {} won by {}", game_id, winner),
                None => write!(f, "Game {} finished: {:?}", game_id, outcome),
            },
            GameLifecycleEvent::Reset {
                game_id,
                first_turn,
            } => write!(f, "Game {} reset, {} moves first", game_id, first_turn),
            GameLifecycleEvent::Deleted { game_id } => write!(f, "Game {} deleted", game_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started_game() -> Game {
        let mut game = Game::new("player-a");
        game.start("player-b", "player-a");
        game
    }

    #[test]
    fn test_creation_and_deletion() {
        let game = Game::new("player-a");

        assert_eq!(
            GameLifecycleEvent::between(None, Some(&game)),
            Some(GameLifecycleEvent::Created {
                game_id: game.id.clone(),
                player1: "player-a".to_string(),
            })
        );
        assert_eq!(
            GameLifecycleEvent::between(Some(&game), None),
            Some(GameLifecycleEvent::Deleted {
                game_id: game.id.clone(),
            })
        );
        assert_eq!(GameLifecycleEvent::between(None, None), None);
    }

    #[test]
    fn test_opponent_joined() {
        let waiting = Game::new("player-a");
        let mut joined = waiting.clone();
        joined.start("player-b", "player-b");

        let event = GameLifecycleEvent::between(Some(&waiting), Some(&joined)).unwrap();

        assert_eq!(
            event,
            GameLifecycleEvent::OpponentJoined {
                game_id: waiting.id.clone(),
                player2: "player-b".to_string(),
                first_turn: "player-b".to_string(),
            }
        );
    }

    #[test]
    fn test_move_played() {
        let before = started_game();
        let mut after = before.clone();
        after.state = after.state.apply_move(4, Mark::X).unwrap();
        after.turn = "player-b".to_string();

        let event = GameLifecycleEvent::between(Some(&before), Some(&after)).unwrap();

        assert_eq!(
            event,
            GameLifecycleEvent::MovePlayed {
                game_id: before.id.clone(),
                index: 4,
                mark: Mark::X,
                next_turn: "player-b".to_string(),
            }
        );
    }

    #[test]
    fn test_finished_with_winner() {
        let before = started_game();
        let mut after = before.clone();
        after.outcome = Some(GameOutcome::Win);
        after.winner = Some("player-a".to_string());

        let event = GameLifecycleEvent::between(Some(&before), Some(&after)).unwrap();

        assert_eq!(event.to_string(), format!("Game {} won by player-a", before.id));
    }

    #[test]
    fn test_reset_after_finish() {
        let mut before = started_game();
        before.state = before.state.apply_move(0, Mark::X).unwrap();
        before.outcome = Some(GameOutcome::Tie);
        let mut after = started_game();
        after.id = before.id.clone();

        let event = GameLifecycleEvent::between(Some(&before), Some(&after)).unwrap();

        assert!(matches!(event, GameLifecycleEvent::Reset { .. }));
        assert_eq!(event.game_id(), before.id);
    }

    #[test]
    fn test_unchanged_record_yields_nothing() {
        let game = started_game();

        assert_eq!(GameLifecycleEvent::between(Some(&game), Some(&game)), None);
    }
}
