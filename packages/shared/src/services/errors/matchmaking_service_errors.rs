use crate::repositories::errors::game_repository_errors::GameRepositoryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchmakingServiceError {
    GameNotFound(String),
    NoOpenGames,
    InvalidRequest(String),
    StaleGame,
    StoreUnavailable(String),
}

impl std::fmt::Display for MatchmakingServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchmakingServiceError::GameNotFound(game_id) => {
                write!(f, "Game not found: {}", game_id)
            }
            MatchmakingServiceError::NoOpenGames => write!(f, "No open games to join"),
            MatchmakingServiceError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            MatchmakingServiceError::StaleGame => {
                write!(f, "Game changed since it was read, refresh and try again")
            }
            MatchmakingServiceError::StoreUnavailable(msg) => {
                write!(f, "Store unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for MatchmakingServiceError {}

impl From<GameRepositoryError> for MatchmakingServiceError {
    fn from(error: GameRepositoryError) -> Self {
        match error {
            GameRepositoryError::ConditionFailed => MatchmakingServiceError::StaleGame,
            other => MatchmakingServiceError::StoreUnavailable(other.to_string()),
        }
    }
}
