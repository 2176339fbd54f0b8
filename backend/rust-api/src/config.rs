use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the generative text service.
    pub generation_api_url: String,
    /// API key for the generative text service. None means the collaborator
    /// is unconfigured; session creation then fails fast without issuing a
    /// request.
    pub generation_api_key: Option<String>,
    /// Model identifier used for question generation.
    pub generation_model: String,
    /// Per-request timeout for the generation call.
    pub generation_timeout_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up)
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            // Fallback to current directory .env for backward compatibility
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            // Load base config from TOML file
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let generation_api_url = settings
            .get_string("generation.api_url")
            .or_else(|_| env::var("GENERATION_API_URL"))
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string());

        let generation_api_key = settings
            .get_string("generation.api_key")
            .ok()
            .or_else(|| env::var("GEMINI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty());

        if generation_api_key.is_none() {
            if env == "prod" {
                eprintln!("WARNING: GEMINI_API_KEY is not set; session creation will fail");
            } else {
                eprintln!("WARNING: GEMINI_API_KEY is not set (dev mode)");
            }
        }

        let generation_model = settings
            .get_string("generation.model")
            .or_else(|_| env::var("GENERATION_MODEL"))
            .unwrap_or_else(|_| "gemini-3-pro-preview".to_string());

        let generation_timeout_secs = settings
            .get_string("generation.timeout_secs")
            .or_else(|_| env::var("GENERATION_TIMEOUT_SECS"))
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(30);

        Ok(Config {
            generation_api_url,
            generation_api_key,
            generation_model,
            generation_timeout_secs,
        })
    }
}
