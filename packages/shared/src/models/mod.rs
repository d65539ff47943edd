pub mod board;
pub mod game;
pub mod game_change;
pub mod game_event;
pub mod move_request;
