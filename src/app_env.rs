use anyhow::{Context, anyhow};
use std::env;
use std::net::SocketAddr;
use tower_sessions::cookie::Key;

/// URL for accessing the SQLite database, such as `sqlite://todo.db`
pub const DB_URL: &str = "DATABASE_URL";
/// Log level configuration for the application. For formatting info, see [tracing_subscriber's EnvFilter documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Secret used to sign session cookies. Must be at least 64 bytes long.
pub const SESSION_SECRET: &str = "SESSION_SECRET";
/// Socket address the HTTP server binds to
pub const LISTEN_ADDR: &str = "LISTEN_ADDR";

/// OpenTelemetry span export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";

const DEFAULT_DB_URL: &str = "sqlite://todo.db";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

/// Endpoints for OpenTelemetry exporters, only present when both are configured
pub struct OtelEndpoints {
    pub spans: String,
    pub metrics: String,
}

/// Process-wide configuration, read once at startup
pub struct AppConfig {
    pub db_url: String,
    pub listen_addr: SocketAddr,
    pub session_key: Key,
    /// Set when no secret was configured and [session_key][Self::session_key] was generated
    pub ephemeral_session_key: bool,
    pub otel: Option<OtelEndpoints>,
}

impl AppConfig {
    /// Reads the configuration from the environment, falling back to defaults for
    /// anything optional. A missing session secret produces a random signing key.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let db_url = env::var(DB_URL).unwrap_or_else(|_| DEFAULT_DB_URL.to_owned());
        let listen_addr = env::var(LISTEN_ADDR)
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_owned())
            .parse::<SocketAddr>()
            .with_context(|| format!("{LISTEN_ADDR} must be a socket address"))?;
        let (session_key, ephemeral_session_key) = match env::var(SESSION_SECRET) {
            Ok(secret) => (session_key_from_secret(&secret)?, false),
            Err(_) => (Key::generate(), true),
        };
        let otel = match (env::var(OTEL_SPAN_EXPORT_URL), env::var(OTEL_METRIC_EXPORT_URL)) {
            (Ok(spans), Ok(metrics)) => Some(OtelEndpoints { spans, metrics }),
            _ => None,
        };

        Ok(AppConfig {
            db_url,
            listen_addr,
            session_key,
            ephemeral_session_key,
            otel,
        })
    }
}

/// Builds the cookie signing key from the configured secret
pub fn session_key_from_secret(secret: &str) -> Result<Key, anyhow::Error> {
    Key::try_from(secret.as_bytes())
        .map_err(|err| anyhow!("{SESSION_SECRET} is unusable ({err}), it must be at least 64 bytes"))
}
