pub mod errors;
pub mod matchmaking_service;
pub mod move_service;
pub mod subscription_service;
pub mod tictactoe_service;
