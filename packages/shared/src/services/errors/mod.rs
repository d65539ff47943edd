pub mod matchmaking_service_errors;
pub mod move_service_errors;
pub mod subscription_service_errors;
