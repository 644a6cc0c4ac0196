use chrono::Duration;

/// Server configuration
///
/// # Environment variables
///
/// All configuration items can be overridden via environment variables:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/canteen | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | CELL_HOLD_MINUTES | 60 | Locker cell hold window |
/// | CELL_HOLD_GRACE_MINUTES | 15 | Grace past site closing time |
/// | TOKEN_TTL_MINUTES | 15 | Pickup credential validity window |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/canteen HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory holding the database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Pickup timing policy
    pub pickup: PickupPolicy,
}

/// Domain deadlines for locker holds and pickup credentials
///
/// The credential window is deliberately shorter than the cell hold: a
/// kitchen can regenerate pickup proof (reissue) without losing the
/// locker slot.
#[derive(Debug, Clone, Copy)]
pub struct PickupPolicy {
    pub hold_minutes: i64,
    pub grace_minutes: i64,
    pub token_ttl_minutes: i64,
}

impl PickupPolicy {
    pub fn hold(&self) -> Duration {
        Duration::minutes(self.hold_minutes)
    }

    pub fn grace(&self) -> Duration {
        Duration::minutes(self.grace_minutes)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::minutes(self.token_ttl_minutes)
    }
}

impl Default for PickupPolicy {
    fn default() -> Self {
        Self {
            hold_minutes: 60,
            grace_minutes: 15,
            token_ttl_minutes: 15,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset
    pub fn from_env() -> Self {
        let defaults = PickupPolicy::default();
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/canteen".into()),
            http_port: env_parse("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            pickup: PickupPolicy {
                hold_minutes: env_parse("CELL_HOLD_MINUTES", defaults.hold_minutes),
                grace_minutes: env_parse("CELL_HOLD_GRACE_MINUTES", defaults.grace_minutes),
                token_ttl_minutes: env_parse("TOKEN_TTL_MINUTES", defaults.token_ttl_minutes),
            },
        }
    }

    /// Override the basics, keeping everything else from the environment
    ///
    /// Mostly useful in tests.
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
