use {
    clap::Subcommand,
    spamguard_config::SpamguardConfig,
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
};

#[derive(Subcommand)]
pub enum DbAction {
    /// Run all pending membership migrations.
    Migrate,
}

pub async fn handle_db(action: DbAction, config: &SpamguardConfig) -> anyhow::Result<()> {
    match action {
        DbAction::Migrate => run_migrations(config).await,
    }
}

/// Open the membership database, creating the default data directory when
/// no explicit URL is configured.
pub async fn open_pool(config: &SpamguardConfig) -> anyhow::Result<SqlitePool> {
    if config.database.url.is_none() {
        if let Some(dir) = spamguard_config::data_dir() {
            std::fs::create_dir_all(&dir)?;
        }
    }
    let url = spamguard_config::database_url(config);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open database {url}: {e}"))?;
    Ok(pool)
}

async fn run_migrations(config: &SpamguardConfig) -> anyhow::Result<()> {
    let pool = open_pool(config).await?;

    println!("Running membership migrations...");
    spamguard_membership::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("membership migrations failed: {e}"))?;
    pool.close().await;

    println!("All migrations complete.");
    Ok(())
}
