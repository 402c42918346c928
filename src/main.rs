use anyhow::Result;
use raices_orderservice::{
    core::{
        app_state::AppState,
        bootstrap::{self, bootstrap},
        config, db,
    },
    routes,
};

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let config = config::load()?;

    tracing::info!("Running migrations...");
    let migrations_count =
        db::run_migrations_blocking(db::MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    let db_pool = db::create_pool(&config.database).await?;
    let state = AppState::new(config, db_pool)?;
    let app = routes::router(&state);

    tracing::info!("Bootstrapping...");
    bootstrap("Raíces OrderService", app, state).await?;
    Ok(())
}
