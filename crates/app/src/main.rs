use std::{net::SocketAddr, sync::Arc, time::Duration};

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "team_ledger={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no server settings found, nothing to run");
        return Ok(());
    };

    tracing::info!("Found server settings...");
    let db = parse_database(&server.database).await?;

    let mut builder = engine::Engine::builder().database(db.clone());
    if let Some(requests) = &settings.requests {
        builder = builder.request_ttl(requests.ttl()?);
    }
    let engine = Arc::new(builder.build().await?);

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{}:{}", bind, server.port).parse()?;
    tasks.spawn(server::run(engine.clone(), db, addr));

    if let Some(requests) = settings.requests {
        let every = Duration::from_secs(requests.sweep_interval_secs.max(1));
        tasks.spawn(sweep_change_requests(engine, every));
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

/// Expires stale change requests on a fixed interval.
async fn sweep_change_requests(engine: Arc<engine::Engine>, every: Duration) {
    tracing::info!("expiring change requests every {}s", every.as_secs());
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        match engine.expire_change_requests(chrono::Utc::now()).await {
            Ok(expired) if !expired.is_empty() => {
                tracing::info!("expired {} change requests", expired.len());
            }
            Ok(_) => {}
            Err(err) => tracing::error!("failed to expire change requests: {err}"),
        }
    }
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
