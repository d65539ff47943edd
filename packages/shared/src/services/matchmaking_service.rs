use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};

use crate::{
    models::game::Game,
    repositories::{
        errors::game_repository_errors::GameRepositoryError, game_repository::GameRepository,
    },
    services::errors::matchmaking_service_errors::MatchmakingServiceError,
};

/// How many open games a joiner may lose to faster joiners before giving up.
const MAX_JOIN_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct MatchmakingService {
    repository: Arc<dyn GameRepository + Send + Sync>,
    rng: Arc<Mutex<StdRng>>,
}

impl MatchmakingService {
    pub fn new(repository: Arc<dyn GameRepository + Send + Sync>) -> Self {
        Self::with_rng(repository, StdRng::from_entropy())
    }

    /// Deterministic coin flips, for tests and replays.
    pub fn with_seed(repository: Arc<dyn GameRepository + Send + Sync>, seed: u64) -> Self {
        Self::with_rng(repository, StdRng::seed_from_u64(seed))
    }

    fn with_rng(repository: Arc<dyn GameRepository + Send + Sync>, rng: StdRng) -> Self {
        MatchmakingService {
            repository,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    fn flip_coin<'a>(&self, heads: &'a str, tails: &'a str) -> &'a str {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        if rng.gen_bool(0.5) {
            heads
        } else {
            tails
        }
    }

    fn require_id(value: &str, what: &str) -> Result<(), MatchmakingServiceError> {
        if value.trim().is_empty() {
            return Err(MatchmakingServiceError::InvalidRequest(format!(
                "{} cannot be empty",
                what
            )));
        }
        Ok(())
    }

    pub async fn create_game(&self, creator_id: &str) -> Result<Game, MatchmakingServiceError> {
        Self::require_id(creator_id, "Creator ID")?;

        let game = Game::new(creator_id);
        self.repository.create_game(&game).await.inspect_err(|e| {
            error!(player_id = creator_id, error = %e, "Failed to create game");
        })?;

        info!(game_id = %game.id, player_id = creator_id, "Game created, awaiting opponent");
        Ok(game)
    }

    pub async fn join_game(&self, joiner_id: &str) -> Result<Game, MatchmakingServiceError> {
        Self::require_id(joiner_id, "Joiner ID")?;

        for attempt in 1..=MAX_JOIN_ATTEMPTS {
            let open_game = self
                .repository
                .find_open_game(joiner_id)
                .await
                .inspect_err(|e| {
                    error!(player_id = joiner_id, error = %e, "Failed to look up open games");
                })?;

            // Nothing waiting for a second player means nothing to write
            let Some(mut game) = open_game else {
                info!(player_id = joiner_id, "No open games to join");
                return Err(MatchmakingServiceError::NoOpenGames);
            };

            // Seat the joiner and flip for who moves first
            let expected_version = game.version;
            let first_turn = self.flip_coin(&game.player1, joiner_id).to_string();
            game.start(joiner_id, &first_turn);
            game.touch();

            match self.repository.update_game(&game, expected_version).await {
                Ok(()) => {
                    info!(
                        game_id = %game.id,
                        player1 = %game.player1,
                        player2 = joiner_id,
                        first_turn = %game.turn,
                        "Player joined game"
                    );
                    return Ok(game);
                }
                // Another joiner got there first, or the creator cancelled.
                Err(GameRepositoryError::ConditionFailed | GameRepositoryError::NotFound) => {
                    warn!(
                        game_id = %game.id,
                        player_id = joiner_id,
                        attempt,
                        "Open game was taken before it could be joined"
                    );
                }
                Err(e) => {
                    error!(game_id = %game.id, player_id = joiner_id, error = %e, "Failed to join game");
                    return Err(e.into());
                }
            }
        }

        Err(MatchmakingServiceError::NoOpenGames)
    }

    pub async fn delete_game(&self, game_id: &str) -> Result<(), MatchmakingServiceError> {
        Self::require_id(game_id, "Game ID")?;

        self.repository.delete_game(game_id).await.inspect_err(|e| {
            error!(game_id, error = %e, "Failed to delete game");
        })?;

        info!(game_id, "Game deleted");
        Ok(())
    }

    pub async fn get_game(&self, game_id: &str) -> Result<Game, MatchmakingServiceError> {
        Self::require_id(game_id, "Game ID")?;

        self.repository
            .get_game(game_id)
            .await
            .inspect_err(|e| error!(game_id, error = %e, "Failed to load game"))?
            .ok_or_else(|| MatchmakingServiceError::GameNotFound(game_id.to_string()))
    }

    /// Starts a fresh round between the same two players under the same id.
    pub async fn reset_game(
        &self,
        player1: &str,
        player2: &str,
        game_id: &str,
    ) -> Result<Game, MatchmakingServiceError> {
        Self::require_id(player1, "Player 1 ID")?;
        Self::require_id(player2, "Player 2 ID")?;

        // Only the two players of this game may restart it
        let mut game = self.get_game(game_id).await?;
        if game.player1 != player1 || game.player2.as_deref() != Some(player2) {
            return Err(MatchmakingServiceError::InvalidRequest(format!(
                "Players {} and {} are not the players of game {}",
                player1, player2, game_id
            )));
        }

        let expected_version = game.version;
        let first_turn = self.flip_coin(player1, player2).to_string();
        game.start(player2, &first_turn);
        game.touch();

        match self.repository.update_game(&game, expected_version).await {
            Ok(()) => {
                info!(game_id, first_turn = %game.turn, "Game reset");
                Ok(game)
            }
            Err(GameRepositoryError::NotFound) => {
                Err(MatchmakingServiceError::GameNotFound(game_id.to_string()))
            }
            Err(e) => {
                error!(game_id, error = %e, "Failed to reset game");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::board::Mark;
    use crate::models::game::GameOutcome;
    use crate::repositories::game_repository::MockGameRepository;

    fn waiting_game(creator: &str) -> Game {
        Game::new(creator)
    }

    #[tokio::test]
    async fn test_create_game_persists_waiting_game() {
        let mut mock_repo = MockGameRepository::new();
        mock_repo
            .expect_create_game()
            .withf(|game| {
                game.player1 == "player-a"
                    && game.player2.is_none()
                    && game.outcome.is_none()
                    && game.turn == "player-a"
                    && game.state.is_empty()
            })
            .times(1)
            .returning(|_| Ok(()));
        let service = MatchmakingService::new(Arc::new(mock_repo));

        let game = service.create_game("player-a").await.unwrap();

        assert_eq!(game.player1, "player-a");
        assert_eq!(game.version, 0);
    }

    #[tokio::test]
    async fn test_create_game_rejects_empty_creator() {
        let service = MatchmakingService::new(Arc::new(MockGameRepository::new()));

        let result = service.create_game("  ").await;

        assert!(matches!(
            result,
            Err(MatchmakingServiceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_create_game_surfaces_store_failure() {
        let mut mock_repo = MockGameRepository::new();
        mock_repo
            .expect_create_game()
            .returning(|_| Err(GameRepositoryError::DynamoDb("throttled".to_string())));
        let service = MatchmakingService::new(Arc::new(mock_repo));

        let result = service.create_game("player-a").await;

        assert_eq!(
            result,
            Err(MatchmakingServiceError::StoreUnavailable(
                "DynamoDB error: throttled".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_join_game_without_open_games_writes_nothing() {
        let mut mock_repo = MockGameRepository::new();
        mock_repo
            .expect_find_open_game()
            .times(1)
            .returning(|_| Ok(None));
        mock_repo.expect_update_game().never();
        let service = MatchmakingService::new(Arc::new(mock_repo));

        let result = service.join_game("player-b").await;

        assert_eq!(result, Err(MatchmakingServiceError::NoOpenGames));
    }

    #[tokio::test]
    async fn test_join_game_starts_game() {
        let open = waiting_game("player-a");
        let expected_id = open.id.clone();
        let mut mock_repo = MockGameRepository::new();
        mock_repo
            .expect_find_open_game()
            .withf(|excluded| excluded == "player-b")
            .returning(move |_| Ok(Some(open.clone())));
        mock_repo
            .expect_update_game()
            .withf(|game, expected| {
                *expected == 0
                    && game.version == 1
                    && game.player2.as_deref() == Some("player-b")
                    && game.outcome == Some(GameOutcome::InProgress)
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let service = MatchmakingService::with_seed(Arc::new(mock_repo), 7);

        let game = service.join_game("player-b").await.unwrap();

        assert_eq!(game.id, expected_id);
        assert!(game.turn == "player-a" || game.turn == "player-b");
    }

    #[tokio::test]
    async fn test_join_game_moves_on_when_game_is_taken() {
        let first = waiting_game("player-a");
        let second = waiting_game("player-c");
        let second_id = second.id.clone();
        let mut candidates = vec![second, first];
        let mut mock_repo = MockGameRepository::new();
        mock_repo
            .expect_find_open_game()
            .times(2)
            .returning(move |_| Ok(candidates.pop()));
        let mut writes = 0;
        mock_repo.expect_update_game().times(2).returning(move |_, _| {
            writes += 1;
            if writes == 1 {
                Err(GameRepositoryError::ConditionFailed)
            } else {
                Ok(())
            }
        });
        let service = MatchmakingService::new(Arc::new(mock_repo));

        let game = service.join_game("player-b").await.unwrap();

        assert_eq!(game.id, second_id);
        assert_eq!(game.player1, "player-c");
    }

    #[tokio::test]
    async fn test_join_game_gives_up_after_repeated_races() {
        let mut mock_repo = MockGameRepository::new();
        mock_repo
            .expect_find_open_game()
            .times(MAX_JOIN_ATTEMPTS)
            .returning(|_| Ok(Some(Game::new("player-a"))));
        mock_repo
            .expect_update_game()
            .times(MAX_JOIN_ATTEMPTS)
            .returning(|_, _| Err(GameRepositoryError::ConditionFailed));
        let service = MatchmakingService::new(Arc::new(mock_repo));

        let result = service.join_game("player-b").await;

        assert_eq!(result, Err(MatchmakingServiceError::NoOpenGames));
    }

    #[tokio::test]
    async fn test_coin_flip_picks_both_players_over_time() {
        let service = MatchmakingService::with_seed(Arc::new(MockGameRepository::new()), 42);

        let picks: Vec<&str> = (0..64).map(|_| service.flip_coin("a", "b")).collect();

        assert!(picks.contains(&"a"));
        assert!(picks.contains(&"b"));
    }

    #[tokio::test]
    async fn test_delete_game_is_unconditional() {
        let mut mock_repo = MockGameRepository::new();
        mock_repo
            .expect_delete_game()
            .withf(|game_id| game_id == "game-1")
            .times(1)
            .returning(|_| Ok(()));
        let service = MatchmakingService::new(Arc::new(mock_repo));

        service.delete_game("game-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_game_keeps_id_and_players() {
        let mut finished = waiting_game("player-a");
        finished.start("player-b", "player-a");
        finished.state = finished.state.apply_move(0, Mark::X).unwrap();
        finished.outcome = Some(GameOutcome::Win);
        finished.winner = Some("player-a".to_string());
        finished.version = 6;
        let game_id = finished.id.clone();
        let stored = finished.clone();

        let mut mock_repo = MockGameRepository::new();
        mock_repo
            .expect_get_game()
            .returning(move |_| Ok(Some(stored.clone())));
        mock_repo
            .expect_update_game()
            .withf(|game, expected| *expected == 6 && game.version == 7)
            .times(1)
            .returning(|_, _| Ok(()));
        let service = MatchmakingService::new(Arc::new(mock_repo));

        let game = service
            .reset_game("player-a", "player-b", &game_id)
            .await
            .unwrap();

        assert_eq!(game.id, game_id);
        assert_eq!(game.player1, "player-a");
        assert_eq!(game.player2.as_deref(), Some("player-b"));
        assert!(game.state.is_empty());
        assert_eq!(game.outcome, Some(GameOutcome::InProgress));
        assert!(game.winner.is_none());
    }

    #[tokio::test]
    async fn test_reset_game_rejects_other_players() {
        let mut game = waiting_game("player-a");
        game.start("player-b", "player-a");
        let game_id = game.id.clone();
        let mut mock_repo = MockGameRepository::new();
        mock_repo
            .expect_get_game()
            .returning(move |_| Ok(Some(game.clone())));
        mock_repo.expect_update_game().never();
        let service = MatchmakingService::new(Arc::new(mock_repo));

        let result = service.reset_game("player-a", "player-z", &game_id).await;

        assert!(matches!(
            result,
            Err(MatchmakingServiceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_missing_game() {
        let mut mock_repo = MockGameRepository::new();
        mock_repo.expect_get_game().returning(|_| Ok(None));
        let service = MatchmakingService::new(Arc::new(mock_repo));

        let result = service.reset_game("player-a", "player-b", "gone").await;

        assert_eq!(
            result,
            Err(MatchmakingServiceError::GameNotFound("gone".to_string()))
        );
    }

    #[tokio::test]
    async fn test_reset_of_game_deleted_before_write_is_not_found() {
        let mut game = waiting_game("player-a");
        game.start("player-b", "player-a");
        let game_id = game.id.clone();
        let mut mock_repo = MockGameRepository::new();
        mock_repo
            .expect_get_game()
            .returning(move |_| Ok(Some(game.clone())));
        mock_repo
            .expect_update_game()
            .returning(|_, _| Err(GameRepositoryError::NotFound));
        let service = MatchmakingService::new(Arc::new(mock_repo));

        let result = service.reset_game("player-a", "player-b", &game_id).await;

        assert_eq!(result, Err(MatchmakingServiceError::GameNotFound(game_id)));
    }
}
