use std::time::Duration;

pub const GAMES_TABLE_VAR: &str = "GAMES_TABLE";
pub const POLL_INTERVAL_VAR: &str = "GAME_POLL_INTERVAL_MS";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{} environment variable must be set", var),
            ConfigError::Invalid { var, value } => {
                write!(f, "Invalid value for {}: {}", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for the games store, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStoreConfig {
    pub games_table: String,
    pub poll_interval: Duration,
}

impl GameStoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let games_table = lookup(GAMES_TABLE_VAR)
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::Missing(GAMES_TABLE_VAR))?;

        let poll_interval = match lookup(POLL_INTERVAL_VAR) {
            None => DEFAULT_POLL_INTERVAL,
            Some(value) => match value.trim().parse::<u64>() {
                Ok(millis) if millis > 0 => Duration::from_millis(millis),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: POLL_INTERVAL_VAR,
                        value,
                    })
                }
            },
        };

        Ok(GameStoreConfig {
            games_table,
            poll_interval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_config_defaults_poll_interval() {
        let config = GameStoreConfig::from_lookup(lookup_from(&[("GAMES_TABLE", "games")])).unwrap();

        assert_eq!(config.games_table, "games");
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_config_reads_poll_interval() {
        let config = GameStoreConfig::from_lookup(lookup_from(&[
            ("GAMES_TABLE", "games"),
            ("GAME_POLL_INTERVAL_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_config_requires_table() {
        let result = GameStoreConfig::from_lookup(lookup_from(&[]));

        assert_eq!(result, Err(ConfigError::Missing("GAMES_TABLE")));
    }

    #[test_case("0" ; "zero")]
    #[test_case("-5" ; "negative")]
    #[test_case("soon" ; "not a number")]
    fn test_config_rejects_bad_interval(value: &str) {
        let result = GameStoreConfig::from_lookup(lookup_from(&[
            ("GAMES_TABLE", "games"),
            ("GAME_POLL_INTERVAL_MS", value),
        ]));

        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
