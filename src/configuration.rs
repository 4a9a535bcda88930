use config::{Config, ConfigError, Environment as ConfigEnvironment, File};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_AI_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub ai: AiSettings,
    #[serde(default)]
    pub stand_in: StandInSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub frontend_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_upload_bytes: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub request_timeout_secs: u64,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct AiSettings {
    #[serde(default)]
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub transcription_model: String,
    pub image_model: String,
    pub image_size: String,
}

/// Artificial latency of the offline stand-in, in milliseconds.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct StandInSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub transcribe_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub image_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            application: ApplicationSettings::default(),
            ai: AiSettings::default(),
            stand_in: StandInSettings::default(),
        }
    }
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_AI_BASE_URL.to_string(),
            transcription_model: "doubao-asr".to_string(),
            image_model: "doubao-image".to_string(),
            image_size: "1024x1024".to_string(),
        }
    }
}

impl Default for StandInSettings {
    fn default() -> Self {
        Self {
            transcribe_delay_ms: 1000,
            image_delay_ms: 2000,
        }
    }
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AiSettings {
    /// The configured credential, ignoring blank values.
    pub fn credential(&self) -> Option<&Secret<String>> {
        self.api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))?
        .join("configuration");

    let environment: AppEnvironment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;

    load_from(&base_path, environment)
}

/// Layers defaults, `base.yaml`, `{environment}.yaml`, `APP_*` variables and
/// the plain deployment variables (`PORT`, `DOUBAO_API_KEY`, ...).
pub fn load_from(base_path: &Path, environment: AppEnvironment) -> Result<Settings, ConfigError> {
    let defaults = Settings::default();
    let environment_filename = format!("{}.yaml", environment.as_str());
    info!(
        "Loading configuration from {} ({})",
        base_path.display(),
        environment.as_str()
    );

    let settings = Config::builder()
        .set_default("application.host", defaults.application.host)?
        .set_default("application.port", i64::from(defaults.application.port))?
        .set_default("application.frontend_url", defaults.application.frontend_url)?
        .set_default(
            "application.max_upload_bytes",
            defaults.application.max_upload_bytes as i64,
        )?
        .set_default(
            "application.request_timeout_secs",
            defaults.application.request_timeout_secs as i64,
        )?
        .set_default("ai.base_url", defaults.ai.base_url)?
        .set_default("ai.transcription_model", defaults.ai.transcription_model)?
        .set_default("ai.image_model", defaults.ai.image_model)?
        .set_default("ai.image_size", defaults.ai.image_size)?
        .set_default(
            "stand_in.transcribe_delay_ms",
            defaults.stand_in.transcribe_delay_ms as i64,
        )?
        .set_default(
            "stand_in.image_delay_ms",
            defaults.stand_in.image_delay_ms as i64,
        )?
        .add_source(File::from(base_path.join("base.yaml")).required(false))
        .add_source(File::from(base_path.join(&environment_filename)).required(false))
        .add_source(
            ConfigEnvironment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("application.port", non_empty_var("PORT"))?
        .set_override_option("application.frontend_url", non_empty_var("FRONTEND_URL"))?
        .set_override_option("ai.api_key", non_empty_var("DOUBAO_API_KEY"))?
        .set_override_option("ai.base_url", non_empty_var("DOUBAO_API_BASE_URL"))?
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;

    info!("Application: {}", settings.application.address());
    info!("Frontend origin: {}", settings.application.frontend_url);
    if settings.ai.credential().is_some() {
        info!("AI service: {}", settings.ai.base_url);
    } else {
        info!("AI service: no credential configured, using the offline stand-in");
    }

    Ok(settings)
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Local,
    Production,
}

impl AppEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnvironment::Local => "local",
            AppEnvironment::Production => "production",
        }
    }
}

impl TryFrom<String> for AppEnvironment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => {
                error!("Invalid environment: {}", other);
                Err(format!(
                    "{} is not a supported environment. Use either `local` or `production`.",
                    other
                ))
            }
        }
    }
}
