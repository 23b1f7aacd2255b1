/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. Channel
/// credentials are not configured here: they live in the
/// `integration_settings` table and are read at delivery time.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// PostgreSQL URL. When unset the server runs on the in-memory backend.
    pub database_url: Option<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks, in seconds (default: `10`).
    pub shutdown_timeout_secs: u64,
    /// Run the scheduler and dispatch loops in-process (default: `true`).
    pub background_jobs: bool,
    /// Seconds between scheduler runs (default: `3600`).
    pub scheduler_interval_secs: u64,
    /// Seconds between due-notification sweeps (default: `60`).
    pub dispatch_poll_secs: u64,
    /// Maximum notifications delivered per sweep (default: `100`).
    pub dispatch_batch_size: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default   |
    /// |---------------------------|-----------|
    /// | `HOST`                    | `0.0.0.0` |
    /// | `PORT`                    | `3000`    |
    /// | `DATABASE_URL`            | unset     |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`      |
    /// | `SHUTDOWN_TIMEOUT_SECS`   | `10`      |
    /// | `BACKGROUND_JOBS`         | `true`    |
    /// | `SCHEDULER_INTERVAL_SECS` | `3600`    |
    /// | `DISPATCH_POLL_SECS`      | `60`      |
    /// | `DISPATCH_BATCH_SIZE`     | `100`     |
    ///
    /// Panics on unparseable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let background_jobs: bool = std::env::var("BACKGROUND_JOBS")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("BACKGROUND_JOBS must be true or false");

        let scheduler_interval_secs: u64 = std::env::var("SCHEDULER_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("SCHEDULER_INTERVAL_SECS must be a valid u64");

        let dispatch_poll_secs: u64 = std::env::var("DISPATCH_POLL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("DISPATCH_POLL_SECS must be a valid u64");

        let dispatch_batch_size: i64 = std::env::var("DISPATCH_BATCH_SIZE")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("DISPATCH_BATCH_SIZE must be a valid i64");

        Self {
            host,
            port,
            database_url,
            request_timeout_secs,
            shutdown_timeout_secs,
            background_jobs,
            scheduler_interval_secs,
            dispatch_poll_secs,
            dispatch_batch_size,
        }
    }
}
