use crate::repositories::errors::game_repository_errors::GameRepositoryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionServiceError {
    GameNotFound(String),
    StoreUnavailable(String),
}

impl std::fmt::Display for SubscriptionServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionServiceError::GameNotFound(game_id) => {
                write!(f, "Game not found: {}", game_id)
            }
            SubscriptionServiceError::StoreUnavailable(msg) => {
                write!(f, "Store unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for SubscriptionServiceError {}

impl From<GameRepositoryError> for SubscriptionServiceError {
    fn from(error: GameRepositoryError) -> Self {
        SubscriptionServiceError::StoreUnavailable(error.to_string())
    }
}
