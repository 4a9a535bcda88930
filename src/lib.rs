pub mod client;
pub mod configuration;
pub mod history;
pub mod media;
pub mod recording;
pub mod server;

pub use configuration::{get_configuration, Settings};
