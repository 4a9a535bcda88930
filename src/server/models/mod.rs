pub mod generation;
pub mod timestamp;

pub use generation::{ErrorResponse, GenerationResponse, HealthResponse};
pub use timestamp::Timestamp;
