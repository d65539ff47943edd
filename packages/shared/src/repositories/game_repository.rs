use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValuesOnConditionCheckFailure};
use aws_sdk_dynamodb::Client;
use serde_dynamo::{from_item, to_item};
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::{ConfigError, GameStoreConfig};
use crate::models::game::Game;
use crate::models::game_change::GameChange;
use crate::repositories::errors::game_repository_errors::GameRepositoryError;

#[cfg(test)]
use mockall::automock;

/// Persistence for the shared game records.
///
/// Writes after creation are conditional on the version the caller last read,
/// so two clients racing on the same record cannot silently overwrite each other.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Stores a new record. Fails with `AlreadyExists` if the id is taken.
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError>;

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, GameRepositoryError>;

    /// Overwrites the whole record if its stored version still equals `expected_version`.
    ///
    /// Fails with `NotFound` when no record has this id and with
    /// `ConditionFailed` when the record exists at another version.
    async fn update_game(
        &self,
        game: &Game,
        expected_version: u64,
    ) -> Result<(), GameRepositoryError>;

    /// Removes the record. Removing an absent record succeeds.
    async fn delete_game(&self, game_id: &str) -> Result<(), GameRepositoryError>;

    /// Any game still waiting for a second player, skipping those created by
    /// `excluded_player_id`. No ordering is guaranteed across candidates.
    async fn find_open_game(
        &self,
        excluded_player_id: &str,
    ) -> Result<Option<Game>, GameRepositoryError>;
}

/// Change notification for individual game records.
#[async_trait]
pub trait GameChangeSource: Send + Sync {
    async fn watch(
        &self,
        game_id: &str,
    ) -> Result<broadcast::Receiver<GameChange>, GameRepositoryError>;
}

pub struct DynamoDbGameRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbGameRepository {
    pub fn new(client: Client, config: &GameStoreConfig) -> Self {
        Self {
            client,
            table_name: config.games_table.clone(),
        }
    }

    pub async fn from_env() -> Result<Self, ConfigError> {
        let config = GameStoreConfig::from_env()?;
        let aws_config = aws_config::load_from_env().await;
        Ok(Self::new(Client::new(&aws_config), &config))
    }

    fn key(game_id: &str) -> (String, AttributeValue) {
        ("id".to_string(), AttributeValue::S(game_id.to_string()))
    }
}

#[async_trait]
impl GameRepository for DynamoDbGameRepository {
    async fn create_game(&self, game: &Game) -> Result<(), GameRepositoryError> {
        let item = to_item(game).map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.as_service_error()
                    .is_some_and(|err| err.is_conditional_check_failed_exception())
                {
                    return Err(GameRepositoryError::AlreadyExists);
                }
                Err(GameRepositoryError::DynamoDb(e.to_string()))
            }
        }
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>, GameRepositoryError> {
        let (key, value) = Self::key(game_id);
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(key, value)
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| GameRepositoryError::DynamoDb(e.to_string()))?;

        if let Some(item) = result.item {
            let game: Game =
                from_item(item).map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;
            Ok(Some(game))
        } else {
            Ok(None)
        }
    }

    async fn update_game(
        &self,
        game: &Game,
        expected_version: u64,
    ) -> Result<(), GameRepositoryError> {
        let item = to_item(game).map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;

        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_exists(id) AND #version = :expected")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(
                ":expected",
                AttributeValue::N(expected_version.to_string()),
            )
            // The old item comes back on failure, which tells a deleted game from a stale one
            .return_values_on_condition_check_failure(ReturnValuesOnConditionCheckFailure::AllOld)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(e
                .as_service_error()
                .and_then(update_condition_failure)
                .unwrap_or_else(|| GameRepositoryError::DynamoDb(e.to_string()))),
        }
    }

    async fn delete_game(&self, game_id: &str) -> Result<(), GameRepositoryError> {
        let (key, value) = Self::key(game_id);
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(key, value)
            .send()
            .await
            .map_err(|e| GameRepositoryError::DynamoDb(e.to_string()))?;
        Ok(())
    }

    async fn find_open_game(
        &self,
        excluded_player_id: &str,
    ) -> Result<Option<Game>, GameRepositoryError> {
        // Scan limits apply before the filter, so keep paging until a match shows up.
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        let mut pages = 0;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression(
                    "(attribute_not_exists(player2) OR attribute_type(player2, :null_type)) \
                     AND player1 <> :excluded",
                )
                .expression_attribute_values(":null_type", AttributeValue::S("NULL".to_string()))
                .expression_attribute_values(
                    ":excluded",
                    AttributeValue::S(excluded_player_id.to_string()),
                )
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| GameRepositoryError::DynamoDb(e.to_string()))?;
            pages += 1;

            if let Some(item) = output.items.and_then(|items| items.into_iter().next()) {
                let game: Game = from_item(item)
                    .map_err(|e| GameRepositoryError::Serialization(e.to_string()))?;
                debug!(game_id = %game.id, pages, "Found open game");
                return Ok(Some(game));
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => {
                    debug!(pages, "No open games in table");
                    return Ok(None);
                }
            }
        }
    }
}

/// Maps a failed conditional overwrite to the store error it stands for.
/// Returns `None` for failures that are not condition checks.
fn update_condition_failure(error: &PutItemError) -> Option<GameRepositoryError> {
    match error {
        PutItemError::ConditionalCheckFailedException(failure) => match failure.item() {
            Some(item) if !item.is_empty() => Some(GameRepositoryError::ConditionFailed),
            _ => Some(GameRepositoryError::NotFound),
        },
        _ => None,
    }
}
