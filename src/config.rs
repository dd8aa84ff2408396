//! Configuration module for the Bas Play scraper API
//!
//! Handles loading environment variables and application configuration.

use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Base URL of the Bas Play site, without trailing slash
    pub base_url: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Panics
    /// Panics if PORT is set but not a valid number
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            base_url: env::var("BASE_URL")
                .unwrap_or_else(|_| "http://103.87.212.46".to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}
