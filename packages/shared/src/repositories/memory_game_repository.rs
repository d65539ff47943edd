use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use crate::models::game::Game;
use crate::models::game_change::GameChange;
use crate::repositories::change_feed::GameChangeFeed;
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::game_repository::{GameChangeSource, GameRepository};

/// Process-local game store with built-in change notification.
///
/// Every successful write is published while the write lock is held, so
/// watchers observe changes in the order they were applied.
#[derive(Default)]
pub struct InMemoryGameRepository {
    games: RwLock<HashMap<String, Game>>,
    feed: GameChangeFeed,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.games.read().await.is_empty()
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        let mut games = self.games.write().await;
        if games.contains_key(&game.id) {
            return Err(GameRepositoryError::AlreadyExists);
        }
        games.insert(game.id.clone(), game.clone());
        self.feed.publish(GameChange::Updated(game.clone()));
        Ok(())
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, GameRepositoryError> {
        Ok(self.games.read().await.get(game_id).cloned())
    }

    async fn update_game(
        &self,
        game: &Game,
        expected_version: u64,
    ) -> Result<(), GameRepositoryError> {
        let mut games = self.games.write().await;
        let stored = games
            .get_mut(&game.id)
            .ok_or(GameRepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(GameRepositoryError::ConditionFailed);
        }
        *stored = game.clone();
        self.feed.publish(GameChange::Updated(game.clone()));
        Ok(())
    }

    async fn delete_game(&self, game_id: &str) -> Result<(), GameRepositoryError> {
        let mut games = self.games.write().await;
        if games.remove(game_id).is_some() {
            self.feed.publish(GameChange::Deleted {
                game_id: game_id.to_string(),
            });
        }
        Ok(())
    }

    async fn find_open_game(
        &self,
        excluded_player_id: &str,
    ) -> Result<Option<Game>, GameRepositoryError> {
        Ok(self
            .games
            .read()
            .await
            .values()
            .find(|game| game.is_waiting() && game.player1 != excluded_player_id)
            .cloned())
    }
}

#[async_trait]
impl GameChangeSource for InMemoryGameRepository {
    async fn watch(
        &self,
        game_id: &str,
    ) -> Result<broadcast::Receiver<GameChange>, GameRepositoryError> {
        Ok(self.feed.watch(game_id))
    }
}
