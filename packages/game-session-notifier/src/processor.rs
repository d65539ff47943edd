use std::collections::HashMap;

use aws_lambda_events::event::dynamodb::{Event, EventRecord};
use aws_sdk_dynamodb::types::AttributeValue;
use serde_dynamo::aws_sdk_dynamodb_1::from_item;
use shared::models::{game::Game, game_event::GameLifecycleEvent};
use tracing::{debug, error, info};

/// Turns games-table stream records into lifecycle events and logs them.
#[derive(Clone, Default)]
pub struct GameEventProcessor;

impl GameEventProcessor {
    pub fn new() -> Self {
        GameEventProcessor
    }

    /// Records that fail to decode are logged and skipped so one bad image
    /// cannot block the rest of the batch.
    pub fn process_event(&self, event: Event) -> Vec<GameLifecycleEvent> {
        info!("Processing {} records", event.records.len());

        let mut events = Vec::new();
        for record in event.records {
            let event_name = record.event_name.clone();
            match Self::process_record(record) {
                Ok(Some(lifecycle_event)) => {
                    Self::log_event(&lifecycle_event);
                    events.push(lifecycle_event);
                }
                Ok(None) => debug!("No game lifecycle change in {} record", event_name),
                Err(e) => error!("Failed to process {} record: {}", event_name, e),
            }
        }
        events
    }

    fn process_record(
        record: EventRecord,
    ) -> Result<Option<GameLifecycleEvent>, serde_dynamo::Error> {
        let old = decode_image(record.change.old_image.into())?;
        let new = decode_image(record.change.new_image.into())?;
        Ok(Self::classify(old.as_ref(), new.as_ref()))
    }

    pub fn classify(old: Option<&Game>, new: Option<&Game>) -> Option<GameLifecycleEvent> {
        GameLifecycleEvent::between(old, new)
    }

    fn log_event(event: &GameLifecycleEvent) {
        match serde_json::to_string(event) {
            Ok(json) => info!(game_id = event.game_id(), "{}: {}", event, json),
            Err(_) => info!(game_id = event.game_id(), "{}", event),
        }
    }
}

/// INSERT records carry no old image and REMOVE records no new one.
fn decode_image(
    image: HashMap<String, AttributeValue>,
) -> Result<Option<Game>, serde_dynamo::Error> {
    if image.is_empty() {
        return Ok(None);
    }
    from_item(image).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_dynamo::aws_sdk_dynamodb_1::to_item;
    use shared::models::board::Mark;
    use shared::models::game::GameOutcome;

    fn image_of(game: &Game) -> HashMap<String, AttributeValue> {
        to_item(game).unwrap()
    }

    #[test]
    fn test_empty_image_is_absent() {
        assert_eq!(decode_image(HashMap::new()).unwrap(), None);
    }

    #[test]
    fn test_image_decodes_to_game() {
        let game = Game::new("player-a");

        let decoded = decode_image(image_of(&game)).unwrap();

        assert_eq!(decoded, Some(game));
    }

    #[test]
    fn test_malformed_image_is_an_error() {
        let mut image = HashMap::new();
        image.insert("id".to_string(), AttributeValue::N("12".to_string()));

        assert!(decode_image(image).is_err());
    }

    #[test]
    fn test_insert_is_created() {
        let game = Game::new("player-a");

        let event = GameEventProcessor::classify(None, Some(&game));

        assert_eq!(
            event,
            Some(GameLifecycleEvent::Created {
                game_id: game.id.clone(),
                player1: "player-a".to_string(),
            })
        );
    }

    #[test]
    fn test_winning_move_is_finished() {
        let mut before = Game::new("player-a");
        before.start("player-b", "player-a");
        for (index, mark) in [(0, Mark::X), (4, Mark::O), (1, Mark::X), (3, Mark::O)] {
            before.state = before.state.apply_move(index, mark).unwrap();
        }
        let mut after = before.clone();
        after.state = after.state.apply_move(2, Mark::X).unwrap();
        after.outcome = Some(GameOutcome::Win);
        after.winner = Some("player-a".to_string());
        after.touch();

        let event = GameEventProcessor::classify(Some(&before), Some(&after));

        assert_eq!(
            event,
            Some(GameLifecycleEvent::Finished {
                game_id: after.id.clone(),
                outcome: GameOutcome::Win,
                winner: Some("player-a".to_string()),
            })
        );
    }
}
