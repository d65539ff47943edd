use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::GameStoreConfig;
use crate::models::game_change::GameChange;
use crate::repositories::change_feed::GameChangeFeed;
use crate::repositories::errors::game_repository_errors::GameRepositoryError;
use crate::repositories::game_repository::{GameChangeSource, GameRepository};

/// Adds change notification to a store that has none by re-reading watched
/// games on an interval. A change is published whenever the stored version
/// moves; a vanished record is published as a deletion.
///
/// One poller task runs per watched game and exits once nobody is watching.
#[derive(Clone)]
pub struct PollingChangeSource {
    repository: Arc<dyn GameRepository + Send + Sync>,
    interval: Duration,
    feed: GameChangeFeed,
    pollers: Arc<Mutex<HashSet<String>>>,
}

impl PollingChangeSource {
    pub fn new(repository: Arc<dyn GameRepository + Send + Sync>, config: &GameStoreConfig) -> Self {
        Self {
            repository,
            interval: config.poll_interval,
            feed: GameChangeFeed::new(),
            pollers: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn active_pollers(&self) -> usize {
        self.pollers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn poll(self, game_id: String) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_version: Option<u64> = None;

        debug!(game_id = %game_id, "Started polling game");
        loop {
            ticker.tick().await;

            if self.stop_if_unwatched(&game_id) {
                debug!(game_id = %game_id, "No watchers left, stopped polling game");
                return;
            }

            match self.repository.get_game(&game_id).await {
                Ok(Some(game)) => {
                    if last_version != Some(game.version) {
                        last_version = Some(game.version);
                        self.feed.publish(GameChange::Updated(game));
                    }
                }
                Ok(None) => {
                    self.feed.publish(GameChange::Deleted {
                        game_id: game_id.clone(),
                    });
                    self.forget(&game_id);
                    debug!(game_id = %game_id, "Game is gone, stopped polling");
                    return;
                }
                Err(e) => {
                    warn!(game_id = %game_id, error = %e, "Failed to poll game");
                }
            }
        }
    }

    // Checked under the pollers lock so a concurrent `watch` either sees this
    // poller still registered or starts a fresh one.
    fn stop_if_unwatched(&self, game_id: &str) -> bool {
        let mut pollers = self.pollers.lock().unwrap_or_else(PoisonError::into_inner);
        if self.feed.remove_if_idle(game_id) {
            pollers.remove(game_id);
            true
        } else {
            false
        }
    }

    fn forget(&self, game_id: &str) {
        self.pollers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(game_id);
    }
}

#[async_trait]
impl GameChangeSource for PollingChangeSource {
    async fn watch(
        &self,
        game_id: &str,
    ) -> Result<broadcast::Receiver<GameChange>, GameRepositoryError> {
        let receiver = self.feed.watch(game_id);

        let start_poller = self
            .pollers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(game_id.to_string());
        if start_poller {
            tokio::spawn(self.clone().poll(game_id.to_string()));
        }

        Ok(receiver)
    }
}
