use crate::models::Catalog;
use anyhow::Result;
use std::time::Duration;

const DEFAULT_SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";
const DEFAULT_YTMUSIC_API_BASE: &str = "https://music.youtube.com/youtubei/v1";
const DEFAULT_YTMUSIC_CLIENT_VERSION: &str = "1.20240101.01.00";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub catalog: Catalog,
    pub api_base: String,
    pub access_token: String,
    pub client_version: String,
    pub request_timeout: Duration,
}

/// Load configuration for `catalog` from `.env` and environment
pub fn load_config(catalog: Catalog) -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    Config::from_lookup(catalog, |key| std::env::var(key).ok())
}

impl Config {
    /// Build a configuration from any key lookup, so tests need not touch the process env
    pub fn from_lookup<F>(catalog: Catalog, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (token_key, base_key, default_base) = match catalog {
            Catalog::Spotify => (
                "SPOTIFY_ACCESS_TOKEN",
                "SPOTIFY_API_BASE",
                DEFAULT_SPOTIFY_API_BASE,
            ),
            Catalog::YouTubeMusic => (
                "YTMUSIC_ACCESS_TOKEN",
                "YTMUSIC_API_BASE",
                DEFAULT_YTMUSIC_API_BASE,
            ),
        };

        let access_token = lookup(token_key)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("{} is not set", token_key))?;

        let api_base = lookup(base_key)
            .unwrap_or_else(|| default_base.to_string())
            .trim_end_matches('/')
            .to_string();

        let client_version = lookup("YTMUSIC_CLIENT_VERSION")
            .unwrap_or_else(|| DEFAULT_YTMUSIC_CLIENT_VERSION.to_string());

        let timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| anyhow::anyhow!("Invalid REQUEST_TIMEOUT_SECS '{}': {}", raw, e))?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be at least 1"));
        }

        Ok(Config {
            catalog,
            api_base,
            access_token: access_token.trim().to_string(),
            client_version,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_spotify_defaults() {
        let config =
            Config::from_lookup(Catalog::Spotify, lookup_from(&[("SPOTIFY_ACCESS_TOKEN", "tok")]))
                .unwrap();
        assert_eq!(config.api_base, DEFAULT_SPOTIFY_API_BASE);
        assert_eq!(config.access_token, "tok");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let result = Config::from_lookup(Catalog::YouTubeMusic, lookup_from(&[]));
        assert!(result.is_err());

        let blank = Config::from_lookup(
            Catalog::YouTubeMusic,
            lookup_from(&[("YTMUSIC_ACCESS_TOKEN", "  ")]),
        );
        assert!(blank.is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(
            Catalog::YouTubeMusic,
            lookup_from(&[
                ("YTMUSIC_ACCESS_TOKEN", "yt"),
                ("YTMUSIC_API_BASE", "http://localhost:9000/"),
                ("REQUEST_TIMEOUT_SECS", "3"),
            ]),
        )
        .unwrap();
        assert_eq!(config.api_base, "http://localhost:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        let result = Config::from_lookup(
            Catalog::Spotify,
            lookup_from(&[("SPOTIFY_ACCESS_TOKEN", "tok"), ("REQUEST_TIMEOUT_SECS", "soon")]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = Config::from_lookup(
            Catalog::Spotify,
            lookup_from(&[("SPOTIFY_ACCESS_TOKEN", "tok"), ("REQUEST_TIMEOUT_SECS", "0")]),
        );
        assert!(result.is_err());
    }
}
