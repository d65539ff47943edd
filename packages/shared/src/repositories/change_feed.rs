use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use crate::models::game_change::GameChange;

const CHANNEL_CAPACITY: usize = 16;

type Channels = HashMap<String, broadcast::Sender<GameChange>>;

/// Fans game changes out to everyone watching a particular game.
///
/// One broadcast channel per watched game. Channels are dropped once their
/// last receiver is gone.
#[derive(Clone, Default)]
pub struct GameChangeFeed {
    channels: Arc<Mutex<Channels>>,
}

impl GameChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn channels(&self) -> MutexGuard<'_, Channels> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn watch(&self, game_id: &str) -> broadcast::Receiver<GameChange> {
        self.channels()
            .entry(game_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Returns how many watchers the change reached.
    pub fn publish(&self, change: GameChange) -> usize {
        let mut channels = self.channels();
        let game_id = change.game_id().to_string();

        let Some(sender) = channels.get(&game_id) else {
            return 0;
        };
        let delivered = sender.send(change).unwrap_or(0);
        if sender.receiver_count() == 0 {
            channels.remove(&game_id);
        }
        delivered
    }

    /// Drops the channel for `game_id` if nobody is listening. Returns whether it is gone.
    pub fn remove_if_idle(&self, game_id: &str) -> bool {
        let mut channels = self.channels();
        match channels.get(game_id) {
            Some(sender) if sender.receiver_count() > 0 => false,
            _ => {
                channels.remove(game_id);
                true
            }
        }
    }

    #[cfg(test)]
    fn watcher_count(&self, game_id: &str) -> usize {
        self.channels()
            .get(game_id)
            .map_or(0, |sender| sender.receiver_count())
    }
}
