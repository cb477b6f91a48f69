pub mod config;
pub mod error;
pub mod relay;
pub mod routes;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{AppState, app_router};
