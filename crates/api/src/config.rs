use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Name reported by `/health` (default: `teamboard-api`).
    pub service_name: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Interval between keep-alive frames on open streams (default: `25`).
    pub heartbeat_interval_secs: u64,
    /// Base URL of the team service consulted for project leadership.
    pub team_service_url: String,
    /// Timeout for a single membership lookup in seconds (default: `5`).
    pub team_service_timeout_secs: u64,
    /// JWT verification settings.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                     |
    /// |-----------------------------|-----------------------------|
    /// | `HOST`                      | `0.0.0.0`                   |
    /// | `PORT`                      | `3000`                      |
    /// | `SERVICE_NAME`              | `teamboard-api`             |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`     |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                        |
    /// | `SHUTDOWN_TIMEOUT_SECS`     | `30`                        |
    /// | `HEARTBEAT_INTERVAL_SECS`   | `25`                        |
    /// | `TEAM_SERVICE_URL`          | `http://team-service:8082`  |
    /// | `TEAM_SERVICE_TIMEOUT_SECS` | `5`                         |
    ///
    /// JWT settings are documented on [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let service_name =
            std::env::var("SERVICE_NAME").unwrap_or_else(|_| env!("CARGO_PKG_NAME").into());

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

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let heartbeat_interval_secs: u64 = std::env::var("HEARTBEAT_INTERVAL_SECS")
            .unwrap_or_else(|_| "25".into())
            .parse()
            .expect("HEARTBEAT_INTERVAL_SECS must be a valid u64");
        assert!(
            heartbeat_interval_secs > 0,
            "HEARTBEAT_INTERVAL_SECS must be greater than zero"
        );

        let team_service_url = std::env::var("TEAM_SERVICE_URL")
            .unwrap_or_else(|_| "http://team-service:8082".into())
            .trim_end_matches('/')
            .to_string();

        let team_service_timeout_secs: u64 = std::env::var("TEAM_SERVICE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("TEAM_SERVICE_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            service_name,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            heartbeat_interval_secs,
            team_service_url,
            team_service_timeout_secs,
            jwt,
        }
    }
}
