use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

/// Environment-driven configuration, read once at process start.
///
/// Defaults follow the original deployment; secrets default to empty strings
/// and disable the features that need them.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// MySQL server host.
    pub mysql_host: String,
    /// MySQL server port.
    pub mysql_port: u16,
    /// MySQL database name.
    pub mysql_database: String,
    /// MySQL user.
    pub mysql_user: String,
    /// MySQL password.
    pub mysql_password: String,
    /// Directory uploads are staged in before persistence.
    pub upload_dir: String,
    /// Payment processor secret key; empty disables payment routes.
    pub stripe_secret_key: String,
    /// Webhook signing secret; empty rejects all webhook deliveries.
    pub stripe_webhook_secret: String,
}

impl Config {
    /// Loads configuration from the environment.
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "3002"),
            mysql_host: try_load("MYSQL_HOST", "localhost"),
            mysql_port: try_load("MYSQL_PORT", "3306"),
            mysql_database: try_load("MYSQL_DATABASE_NAME", "nvrs"),
            mysql_user: try_load("MYSQL_USER", "root"),
            mysql_password: secret("MYSQL_PASSWORD"),
            upload_dir: try_load("UPLOAD_DIR", "uploads"),
            stripe_secret_key: secret("STRIPE_SECRET_KEY"),
            stripe_webhook_secret: secret("STRIPE_WEBHOOK_SECRET"),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn secret(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{key} not set");
        String::new()
    })
}
