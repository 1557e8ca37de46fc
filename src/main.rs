use clap::Parser;
use tracing_subscriber::EnvFilter;

use quill::{
    config::{Cli, Command, Config},
    db, routes, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt().with_env_filter(filter_layer).init();

    let Cli { config, command } = Cli::parse();

    let pool = db::connect(&config.database_url).await?;
    db::prepare_db(&pool).await?;

    match command.unwrap_or(Command::Serve) {
        Command::Serve => serve(pool, config).await,
        Command::CreateGroup {
            title,
            slug,
            description,
        } => {
            let slug = slug.unwrap_or_else(|| slug::slugify(&title));
            let group = db::create_group(&pool, &title, &slug, &description).await?;
            tracing::info!("created group {:?} at /group/{}/", group.title, group.slug);
            Ok(())
        }
    }
}

async fn serve(pool: sqlx::SqlitePool, config: Config) -> anyhow::Result<()> {
    let state = AppState::new(pool, &config);
    let app = routes::generate_routes(state);

    tracing::info!("listening on http://{}", config.listen);
    axum::Server::bind(&config.listen)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
    }
    tracing::info!("shutting down");
}
