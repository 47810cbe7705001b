use crate::auth::jwt::JwtConfig;

/// Default search radius when a candidate query omits `radius_km`.
const DEFAULT_SEARCH_RADIUS_KM: f64 = 25.0;
/// Upper bound accepted for `radius_km`.
const MAX_SEARCH_RADIUS_KM: f64 = 500.0;

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT` (`text` or `json`, default `text`).
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Candidate-search limits.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub default_radius_km: f64,
    pub max_radius_km: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_radius_km: DEFAULT_SEARCH_RADIUS_KM,
            max_radius_km: MAX_SEARCH_RADIUS_KM,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub search: SearchConfig,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `DEFAULT_SEARCH_RADIUS_KM` | `25`                       |
    /// | `MAX_SEARCH_RADIUS_KM`     | `500`                      |
    ///
    /// # Panics
    ///
    /// Panics on unparsable values, or when the default radius exceeds the
    /// maximum. Misconfiguration should fail at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let default_radius_km: f64 = std::env::var("DEFAULT_SEARCH_RADIUS_KM")
            .unwrap_or_else(|_| DEFAULT_SEARCH_RADIUS_KM.to_string())
            .parse()
            .expect("DEFAULT_SEARCH_RADIUS_KM must be a number");

        let max_radius_km: f64 = std::env::var("MAX_SEARCH_RADIUS_KM")
            .unwrap_or_else(|_| MAX_SEARCH_RADIUS_KM.to_string())
            .parse()
            .expect("MAX_SEARCH_RADIUS_KM must be a number");

        assert!(
            default_radius_km > 0.0 && default_radius_km <= max_radius_km,
            "DEFAULT_SEARCH_RADIUS_KM must be in (0, MAX_SEARCH_RADIUS_KM]"
        );

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            search: SearchConfig {
                default_radius_km,
                max_radius_km,
            },
            jwt,
        }
    }
}
