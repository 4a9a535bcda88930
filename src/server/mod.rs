pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::{app_router, configure_app, AppState};
pub use error::{GenerationError, InputError, Stage};
