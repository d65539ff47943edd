use serde::{Deserialize, Serialize};

use crate::models::board::Mark;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub game_id: String,
    pub index: usize, // row-major, 0..9
    pub mark: Mark,
    pub requester_id: String,
    pub opponent_id: String,
}

impl MoveRequest {
    pub fn new(
        game_id: &str,
        index: usize,
        mark: Mark,
        requester_id: &str,
        opponent_id: &str,
    ) -> Self {
        MoveRequest {
            game_id: game_id.to_string(),
            index,
            mark,
            requester_id: requester_id.to_string(),
            opponent_id: opponent_id.to_string(),
        }
    }
}
