use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    models::{board::BoardOutcome, game::Game, move_request::MoveRequest},
    repositories::{
        errors::game_repository_errors::GameRepositoryError, game_repository::GameRepository,
    },
    services::{errors::move_service_errors::MoveServiceError, tictactoe_service::TicTacToeService},
};

/// Applies a validated move to the stored game record.
#[derive(Clone)]
pub struct MoveService {
    repository: Arc<dyn GameRepository + Send + Sync>,
    rules: TicTacToeService,
}

impl MoveService {
    pub fn new(repository: Arc<dyn GameRepository + Send + Sync>) -> Self {
        Self {
            repository,
            rules: TicTacToeService::new(),
        }
    }

    /// Reads the current record, checks the move against it and writes the
    /// result back only if nobody else wrote in between. A lost race is
    /// reported as `StaleGame` and nothing is written.
    pub async fn submit_move(&self, request: &MoveRequest) -> Result<Game, MoveServiceError> {
        // Load the game as it stands now
        let mut game = self
            .repository
            .get_game(&request.game_id)
            .await
            .inspect_err(|e| error!(game_id = %request.game_id, error = %e, "Failed to load game"))?
            .ok_or_else(|| MoveServiceError::GameNotFound(request.game_id.clone()))?;

        // Apply the move locally, remembering which version it was based on
        let expected_version = game.version;
        let outcome = self
            .rules
            .validate_and_make_move(&mut game, request)
            .inspect_err(|reason| {
                info!(
                    game_id = %request.game_id,
                    player_id = %request.requester_id,
                    index = request.index,
                    %reason,
                    "Move rejected"
                );
            })?;
        game.touch();

        // Save only if nobody wrote in between
        match self.repository.update_game(&game, expected_version).await {
            Ok(()) => {}
            Err(GameRepositoryError::NotFound) => {
                return Err(MoveServiceError::GameNotFound(request.game_id.clone()));
            }
            Err(GameRepositoryError::ConditionFailed) => {
                warn!(game_id = %request.game_id, "Game changed while the move was in flight");
                return Err(MoveServiceError::StaleGame);
            }
            Err(e) => {
                error!(game_id = %request.game_id, error = %e, "Failed to save move");
                return Err(e.into());
            }
        }

        match outcome {
            BoardOutcome::Win(mark) => {
                info!(game_id = %game.id, winner = ?game.winner, %mark, "Game won");
            }
            BoardOutcome::Tie => info!(game_id = %game.id, "Game tied"),
            BoardOutcome::InProgress => {
                info!(
                    game_id = %game.id,
                    index = request.index,
                    mark = %request.mark,
                    next_turn = %game.turn,
                    "Move played"
                );
            }
        }

        Ok(game)
    }
}
