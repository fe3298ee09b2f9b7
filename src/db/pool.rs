use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

pub type Db = DatabaseConnection;

pub async fn connect(database_url: &str) -> Result<Db, DbErr> {
    let mut opts = ConnectOptions::new(database_url.to_string());
    opts.max_connections(10)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    // Every connection to `sqlite::memory:` opens its own empty database.
    if database_url.starts_with("sqlite::memory:") {
        opts.max_connections(1).min_connections(1);
    }

    Database::connect(opts).await
}
