use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::board::{Board, BoardOutcome, Mark};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameOutcome {
    Win,
    Tie,
    InProgress,
}

impl From<BoardOutcome> for GameOutcome {
    fn from(outcome: BoardOutcome) -> Self {
        match outcome {
            BoardOutcome::InProgress => GameOutcome::InProgress,
            BoardOutcome::Win(_) => GameOutcome::Win,
            BoardOutcome::Tie => GameOutcome::Tie,
        }
    }
}

/// The shared game record. `player1` always plays `X`, `player2` plays `O`.
///
/// `outcome` is `None` while the creator is waiting for an opponent.
/// `version` grows by one on every write and guards conditional updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub player1: String,
    pub player2: Option<String>,
    pub state: Board,
    pub turn: String,
    pub outcome: Option<GameOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    #[serde(default)]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn new(creator_id: &str) -> Self {
        let now = Utc::now();
        Game {
            id: Uuid::new_v4().to_string(),
            player1: creator_id.to_string(),
            player2: None,
            state: Board::empty(),
            turn: creator_id.to_string(),
            outcome: None,
            winner: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.player2.is_none()
    }

    pub fn is_in_progress(&self) -> bool {
        self.outcome == Some(GameOutcome::InProgress)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.outcome, Some(GameOutcome::Win | GameOutcome::Tie))
    }

    pub fn mark_for(&self, player_id: &str) -> Option<Mark> {
        if self.player1 == player_id {
            Some(Mark::X)
        } else if self.player2.as_deref() == Some(player_id) {
            Some(Mark::O)
        } else {
            None
        }
    }

    pub fn player_for(&self, mark: Mark) -> Option<&str> {
        match mark {
            Mark::X => Some(self.player1.as_str()),
            Mark::O => self.player2.as_deref(),
        }
    }

    pub fn opponent_of(&self, player_id: &str) -> Option<&str> {
        if self.player1 == player_id {
            self.player2.as_deref()
        } else if self.player2.as_deref() == Some(player_id) {
            Some(self.player1.as_str())
        } else {
            None
        }
    }

    /// Seats `player2` and starts play. `first_turn` must be one of the two players.
    pub fn start(&mut self, player2_id: &str, first_turn: &str) {
        self.player2 = Some(player2_id.to_string());
        self.state = Board::empty();
        self.turn = first_turn.to_string();
        self.outcome = Some(GameOutcome::InProgress);
        self.winner = None;
    }

    /// Marks the record as written once more.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
