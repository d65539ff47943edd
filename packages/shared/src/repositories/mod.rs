pub mod change_feed;
pub mod errors;
pub mod game_repository;
pub mod memory_game_repository;
pub mod polling_change_source;
