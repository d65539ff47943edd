use crate::{
    models::{
        board::BoardOutcome,
        game::{Game, GameOutcome},
        move_request::MoveRequest,
    },
    services::errors::move_service_errors::InvalidMoveReason,
};

#[derive(Clone, Default)]
pub struct TicTacToeService;

impl TicTacToeService {
    pub fn new() -> Self {
        TicTacToeService
    }

    /// Validate and make a move on the game.
    /// Updates the board, turn, outcome and winner. Leaves `game` untouched on error.
    pub fn validate_and_make_move(
        &self,
        game: &mut Game,
        request: &MoveRequest,
    ) -> Result<BoardOutcome, InvalidMoveReason> {
        // Check the game is actually being played
        if game.is_finished() {
            return Err(InvalidMoveReason::GameOver);
        }
        if !game.is_in_progress() {
            return Err(InvalidMoveReason::AwaitingOpponent);
        }

        // Check both players belong to this game
        let requester_mark = game
            .mark_for(&request.requester_id)
            .ok_or(InvalidMoveReason::NotAParticipant)?;
        if game.opponent_of(&request.requester_id) != Some(request.opponent_id.as_str()) {
            return Err(InvalidMoveReason::UnknownOpponent);
        }

        // Check it's the player's turn and they play their own mark
        if game.turn != request.requester_id {
            return Err(InvalidMoveReason::NotYourTurn);
        }
        if request.mark != requester_mark {
            return Err(InvalidMoveReason::WrongMark {
                expected: requester_mark,
            });
        }

        // Place the mark and score the new board
        let state = game.state.apply_move(request.index, request.mark)?;
        let outcome = state.compute_outcome();

        game.state = state;
        // Handed over even when the game just ended; nobody can move after that.
        game.turn = request.opponent_id.clone();
        game.outcome = Some(GameOutcome::from(outcome));
        game.winner = match outcome {
            BoardOutcome::Win(mark) => game.player_for(mark).map(str::to_string),
            BoardOutcome::InProgress | BoardOutcome::Tie => None,
        };

        Ok(outcome)
    }
}
