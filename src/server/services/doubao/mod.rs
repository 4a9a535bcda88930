mod service;
mod types;

pub use service::DoubaoGateway;
pub use types::*;
