use clap::Parser;
use soupmate::{
    api::{create_router, AppState},
    cli::{commands, Cli, Commands},
    config::Settings,
    db, Error, Result,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,soupmate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env()?;

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            if let Some(host) = host {
                settings.server.host = host;
            }
            settings.validate()?;
            serve(settings).await?;
        }
        Commands::Migrate => {
            settings.validate()?;
            migrate(settings).await?;
        }
        Commands::Import {
            total,
            page_size,
            source,
            offset,
        } => {
            if let Some(total) = total {
                settings.import.total = total;
            }
            if let Some(page_size) = page_size {
                settings.import.page_size = page_size;
            }
            if let Some(source) = source {
                settings.import.source_name = source;
            }
            if let Some(offset) = offset {
                settings.import.start_offset = offset;
            }
            settings.validate()?;
            settings.spoonacular.require_api_key()?;
            import_recipes(settings).await?;
        }
        Commands::Embed { batch_size } => {
            if let Some(batch_size) = batch_size {
                settings.embedding.batch_size = batch_size;
            }
            settings.validate()?;
            settings.embedding.require_api_url()?;
            embed_chunks(settings).await?;
        }
        Commands::Search { query, top_k } => {
            settings.validate()?;
            settings.embedding.require_api_url()?;
            search_recipes(settings, query, top_k).await?;
        }
    }

    Ok(())
}

async fn open_pool(settings: &Settings) -> Result<db::DbPool> {
    let pool = db::init_pool_with_config(&settings.database).await?;
    db::run_migrations(&pool).await?;
    Ok(pool)
}

async fn serve(settings: Settings) -> Result<()> {
    info!("Starting SoupMate server");
    info!("Database: {}", settings.database.url);
    info!("Server: {}:{}", settings.server.host, settings.server.port);

    let pool = open_pool(&settings).await?;
    info!(
        "Database connection established (max_connections: {}, min_connections: {})",
        settings.database.max_connections, settings.database.min_connections
    );

    let retriever = commands::build_retriever(&pool, &settings)?;
    info!(
        "Retriever ready (keyword scope: {}, alpha: {})",
        settings.retrieval.keyword_scope, settings.retrieval.hybrid_alpha
    );

    let state = AppState {
        retriever,
        settings: settings.clone(),
    };

    let app = create_router(state, &settings)?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    println!("\n========================================");
    println!("SoupMate Server");
    println!("========================================");
    println!("Address: http://{addr}");
    println!("CORS origin: {}", settings.server.cors_allowed_origin);
    println!("\nAPI Endpoints:");
    println!("  GET  /api/health");
    println!("  POST /api/chat");
    println!("\nPress Ctrl+C to stop");
    println!("========================================\n");

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Internal(format!("Server error: {e}")))?;

    info!("Shutting down...");
    Ok(())
}

async fn migrate(settings: Settings) -> Result<()> {
    info!("Running database migrations");

    let pool = db::init_pool(&settings.database.url).await?;
    db::run_migrations(&pool).await?;

    println!("\u{2713} Database migrations completed successfully");
    Ok(())
}

async fn import_recipes(settings: Settings) -> Result<()> {
    let pool = open_pool(&settings).await?;
    let report = commands::import(&pool, &settings).await?;
    commands::print_import_report(&report);
    Ok(())
}

async fn embed_chunks(settings: Settings) -> Result<()> {
    let pool = open_pool(&settings).await?;
    let embedded = commands::embed(&pool, &settings, settings.embedding.batch_size).await?;
    println!("\u{2713} Embedded {embedded} chunks");
    Ok(())
}

async fn search_recipes(settings: Settings, query: String, top_k: Option<usize>) -> Result<()> {
    let pool = open_pool(&settings).await?;
    let top_k = top_k.unwrap_or(settings.retrieval.top_k);
    let answer = commands::search(&pool, &settings, &query, top_k).await?;
    commands::print_answer(&answer);
    Ok(())
}
