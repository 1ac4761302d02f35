use crate::error::Result;
use serde::Deserialize;
use std::path::PathBuf;

/// Runtime settings. Every field has a default and can be overridden with an
/// `APP_`-prefixed environment variable, e.g. `APP_MODEL_PATH`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Serialized recommender payload produced by the offline training job
    pub model_path: PathBuf,
    pub default_top_k: usize,
    pub max_search_results: usize,
    pub top_rated_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080_i64)?
            .set_default("model_path", "model/recommender.json")?
            .set_default("default_top_k", 5_i64)?
            .set_default("max_search_results", 10_i64)?
            .set_default("top_rated_limit", 12_i64)?
            .add_source(config::Environment::with_prefix("APP").try_parsing(true))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_top_k == 0 {
            return Err(crate::error::ApiError::ConfigError(
                "default_top_k must be positive".to_string(),
            ));
        }
        if self.max_search_results == 0 {
            return Err(crate::error::ApiError::ConfigError(
                "max_search_results must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            model_path: PathBuf::from("model/recommender.json"),
            default_top_k: 5,
            max_search_results: 10,
            top_rated_limit: 12,
        }
    }
}
