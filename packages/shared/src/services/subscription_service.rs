use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    models::{game::Game, game_change::GameChange},
    repositories::game_repository::{GameChangeSource, GameRepository},
    services::errors::subscription_service_errors::SubscriptionServiceError,
};

/// What a subscriber is told about the game it follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameUpdate {
    Changed(Game),
    Deleted { game_id: String },
}

/// A live view of one game record.
///
/// Starts with the record as it was when subscribing, then yields every later
/// version in order. Versions already seen are skipped. A deletion is the
/// last update; after it `next` returns `None`.
pub struct GameSubscription {
    game_id: String,
    pending: Option<Game>,
    receiver: Option<broadcast::Receiver<GameChange>>,
    last_version: u64,
}

impl GameSubscription {
    pub fn is_active(&self) -> bool {
        self.pending.is_some() || self.receiver.is_some()
    }

    /// Stops delivery. Later calls to `next` return `None`.
    pub fn unsubscribe(&mut self) {
        self.pending = None;
        self.receiver = None;
        debug!(game_id = %self.game_id, "Unsubscribed from game");
    }

    pub async fn next(&mut self) -> Option<GameUpdate> {
        if let Some(game) = self.pending.take() {
            return Some(GameUpdate::Changed(game));
        }

        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(GameChange::Updated(game)) => {
                    if game.version <= self.last_version {
                        continue;
                    }
                    self.last_version = game.version;
                    return Some(GameUpdate::Changed(game));
                }
                Ok(GameChange::Deleted { game_id }) => {
                    self.receiver = None;
                    return Some(GameUpdate::Deleted { game_id });
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Older versions are gone; newer ones are still queued.
                    warn!(game_id = %self.game_id, skipped, "Subscriber fell behind");
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }
}

/// Background delivery started by [`GameSubscriptionService::subscribe_with`].
/// Dropping the handle stops delivery.
pub struct SubscriptionHandle {
    game_id: String,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn unsubscribe(self) {
        self.task.abort();
        debug!(game_id = %self.game_id, "Stopped pushing game updates");
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Clone)]
pub struct GameSubscriptionService {
    repository: Arc<dyn GameRepository + Send + Sync>,
    changes: Arc<dyn GameChangeSource + Send + Sync>,
}

impl GameSubscriptionService {
    pub fn new(
        repository: Arc<dyn GameRepository + Send + Sync>,
        changes: Arc<dyn GameChangeSource + Send + Sync>,
    ) -> Self {
        Self {
            repository,
            changes,
        }
    }

    pub async fn subscribe(
        &self,
        game_id: &str,
    ) -> Result<GameSubscription, SubscriptionServiceError> {
        // Watch before reading so no write can fall between the two.
        let receiver = self.changes.watch(game_id).await?;
        let game = self
            .repository
            .get_game(game_id)
            .await?
            .ok_or_else(|| SubscriptionServiceError::GameNotFound(game_id.to_string()))?;

        info!(game_id, version = game.version, "Subscribed to game");
        Ok(GameSubscription {
            game_id: game_id.to_string(),
            last_version: game.version,
            pending: Some(game),
            receiver: Some(receiver),
        })
    }

    /// Pushes every update to `on_update` from a background task until the
    /// game is deleted or the handle is dropped.
    pub async fn subscribe_with<F>(
        &self,
        game_id: &str,
        mut on_update: F,
    ) -> Result<SubscriptionHandle, SubscriptionServiceError>
    where
        F: FnMut(GameUpdate) + Send + 'static,
    {
        let mut subscription = self.subscribe(game_id).await?;
        let task = tokio::spawn(async move {
            while let Some(update) = subscription.next().await {
                on_update(update);
            }
        });

        Ok(SubscriptionHandle {
            game_id: game_id.to_string(),
            task,
        })
    }
}
