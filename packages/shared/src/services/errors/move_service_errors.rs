use crate::models::board::{BoardError, Mark};
use crate::repositories::errors::game_repository_errors::GameRepositoryError;

/// Why a move was refused before anything was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidMoveReason {
    AwaitingOpponent,
    GameOver,
    NotAParticipant,
    UnknownOpponent,
    NotYourTurn,
    WrongMark { expected: Mark },
    CellOccupied(usize),
    OutOfRange(usize),
}

impl std::fmt::Display for InvalidMoveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidMoveReason::AwaitingOpponent => write!(f, "Game has no opponent yet"),
            InvalidMoveReason::GameOver => write!(f, "Game is already over"),
            InvalidMoveReason::NotAParticipant => write!(f, "Player is not part of this game"),
            InvalidMoveReason::UnknownOpponent => {
                write!(f, "Opponent is not the other player in this game")
            }
            InvalidMoveReason::NotYourTurn => write!(f, "Not your turn"),
            InvalidMoveReason::WrongMark { expected } => {
                write!(f, "Player must play {}", expected)
            }
            InvalidMoveReason::CellOccupied(index) => {
                write!(f, "Cell {} is already occupied", index)
            }
            InvalidMoveReason::OutOfRange(index) => {
                write!(f, "Cell index {} is outside the board", index)
            }
        }
    }
}

impl From<BoardError> for InvalidMoveReason {
    fn from(error: BoardError) -> Self {
        match error {
            BoardError::CellOccupied(index) => InvalidMoveReason::CellOccupied(index),
            BoardError::OutOfRange(index) => InvalidMoveReason::OutOfRange(index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveServiceError {
    GameNotFound(String),
    InvalidMove(InvalidMoveReason),
    StaleGame,
    StoreUnavailable(String),
}

impl std::fmt::Display for MoveServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveServiceError::GameNotFound(game_id) => write!(f, "Game not found: {}", game_id),
            MoveServiceError::InvalidMove(reason) => write!(f, "Invalid move: {}", reason),
            MoveServiceError::StaleGame => {
                write!(f, "Game changed since it was read, refresh and try again")
            }
            MoveServiceError::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for MoveServiceError {}

impl From<InvalidMoveReason> for MoveServiceError {
    fn from(reason: InvalidMoveReason) -> Self {
        MoveServiceError::InvalidMove(reason)
    }
}

impl From<GameRepositoryError> for MoveServiceError {
    fn from(error: GameRepositoryError) -> Self {
        match error {
            GameRepositoryError::ConditionFailed => MoveServiceError::StaleGame,
            other => MoveServiceError::StoreUnavailable(other.to_string()),
        }
    }
}
