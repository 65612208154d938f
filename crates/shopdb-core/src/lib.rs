pub mod app_config;
pub mod basket;
pub mod config;
pub mod events;
pub mod orders;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use basket::{total_sum, BasketLine};
pub use config::{load_app_config, load_app_config_from_env};
pub use events::DomainEvent;
pub use orders::{AccountType, OrderState};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid account type: {0}")]
    InvalidAccountType(String),
    #[error("invalid order state: {0}")]
    InvalidOrderState(String),
}
