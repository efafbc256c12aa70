use core_config::{AppInfo, FromEnv, app_info, env_parse, server::ServerConfig};
use database::postgres::PostgresConfig;
use std::time::Duration;

pub use core_config::Environment;

const DEFAULT_PORT: u16 = 4000;

/// Application configuration, composed from the shared config pieces.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: PostgresConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// Per-request deadline; an expired request rolls back its transaction
    pub request_timeout: Duration,
    /// Bound on draining requests and on cleanup after a shutdown signal
    pub shutdown_timeout: Duration,
    /// Apply pending migrations before serving
    pub run_migrations: bool,
}

impl Config {
    /// Environment variables (besides the `DATABASE_URL`/`DB_*` pool settings):
    /// - `HOST` / `PORT` (default: 0.0.0.0:4000)
    /// - `APP_ENV` (default: development)
    /// - `REQUEST_TIMEOUT_SECS` (default: 60)
    /// - `SHUTDOWN_TIMEOUT_SECS` (default: 30)
    /// - `RUN_MIGRATIONS` (default: true)
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = PostgresConfig::from_env()?;
        let server = ServerConfig::from_env_with_port(DEFAULT_PORT)?;

        Ok(Self {
            app: app_info!(),
            database,
            server,
            environment,
            request_timeout: Duration::from_secs(env_parse("REQUEST_TIMEOUT_SECS", "60")?),
            shutdown_timeout: Duration::from_secs(env_parse("SHUTDOWN_TIMEOUT_SECS", "30")?),
            run_migrations: env_parse("RUN_MIGRATIONS", "true")?,
        })
    }
}
