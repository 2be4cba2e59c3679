//! Database connection for the storefront `SQLite` file.
//!
//! # Database: `medicart.db`
//!
//! Holds only the `tower_sessions` table, created by
//! `SqliteStore::migrate()` at start-up. Each visitor's cart and favorite
//! records live inside their session row.

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Create a `SQLite` connection pool with sensible defaults.
///
/// In-memory URLs (`sqlite::memory:`) get a single connection, since every
/// connection to an in-memory database sees its own empty database.
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the database cannot be opened.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let url = database_url.expose_secret();
    let options = SqliteConnectOptions::from_str(url)?;
    let max_connections = if url.contains(":memory:") { 1 } else { 5 };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}
