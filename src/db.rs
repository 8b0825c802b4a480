use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

/// Open the shared connection pool.
///
/// Sized for a single small API instance: onboarding and search traffic
/// is bursty but each query is short, so the pool stays modest and idle
/// connections are reclaimed quickly rather than held for half an hour.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url);
    opts.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(120))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(false);

    let db = Database::connect(opts).await?;
    Ok(db)
}
