use serde::{Deserialize, Serialize};

use crate::models::game::Game;

/// A single change to a game record as observed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameChange {
    Updated(Game),
    Deleted { game_id: String },
}

impl GameChange {
    pub fn game_id(&self) -> &str {
        match self {
            GameChange::Updated(game) => &game.id,
            GameChange::Deleted { game_id } => game_id,
        }
    }
}
