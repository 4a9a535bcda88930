pub mod doubao;
pub mod gateway;
pub mod pipeline;
pub mod stand_in;

pub use doubao::DoubaoGateway;
pub use gateway::{Gateway, GatewayError, GatewayMetadata, GeneratedImage};
pub use pipeline::{GenerationOutput, GenerationPipeline};
pub use stand_in::StandInGateway;

use crate::configuration::Settings;
use std::sync::Arc;
use tracing::{info, warn};

/// Chooses the gateway variant from configuration: a credential selects the
/// live service, its absence the offline stand-in.
pub fn build_gateway(settings: &Settings) -> Result<Arc<dyn Gateway>, GatewayError> {
    match settings.ai.credential() {
        Some(api_key) => {
            info!("Using live AI service at {}", settings.ai.base_url);
            let gateway = DoubaoGateway::new(
                api_key.clone(),
                &settings.ai,
                settings.application.request_timeout(),
            )?;
            Ok(Arc::new(gateway))
        }
        None => {
            warn!("No AI credential configured, using the offline stand-in");
            Ok(Arc::new(StandInGateway::new(&settings.stand_in)))
        }
    }
}
