mod api_handlers;
mod database;
mod request_logging;
mod search;
mod service_discovery;

use clap::{Parser, Subcommand};
use database::{check_schema_applied, Database, DEFAULT_DATABASE_URL};
use poem::{
    get, listener::TcpListener, middleware::Cors, post, Endpoint, EndpointExt, Route, Server,
};
use request_logging::RequestLogging;
use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "registry-server")]
#[command(about = "Blackbox monitoring target registry")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Check database connectivity and schema
    Doctor,
}

struct AppContext {
    database: Arc<Database>,
}

fn database_url() -> String {
    env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

async fn setup_app_context() -> Result<AppContext, std::io::Error> {
    let database_url = database_url();
    let database = match Database::new(&database_url).await {
        Ok(db) => {
            tracing::info!("Database initialized at {}", database_url);
            Arc::new(db)
        }
        Err(e) => {
            tracing::error!("Failed to initialize database at {}: {:#}", database_url, e);
            return Err(std::io::Error::other(format!(
                "Database initialization failed: {}",
                e
            )));
        }
    };

    Ok(AppContext { database })
}

fn build_app(database: Arc<Database>) -> impl Endpoint {
    Route::new()
        .at("/api/health", get(api_handlers::health))
        // Target endpoints
        .at(
            "/api/targets",
            get(api_handlers::list_targets).post(api_handlers::create_target),
        )
        .at("/api/targets/batch", post(api_handlers::batch_targets))
        .at(
            "/api/targets/:id",
            get(api_handlers::get_target)
                .put(api_handlers::update_target)
                .delete(api_handlers::delete_target),
        )
        // Probe and stats endpoints
        .at("/api/probes", get(api_handlers::list_probes))
        .at("/api/statistics", get(api_handlers::get_statistics))
        // Prometheus service discovery
        .at("/api/sd/test", get(api_handlers::sd_test))
        .at("/api/sd/:protocol", get(api_handlers::sd_targets))
        .data(database)
        .with(RequestLogging)
        .with(Cors::new())
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let cli = Cli::parse();

    // Load .env file if it exists
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve => serve_command().await,
        Commands::Doctor => doctor_command().await,
    }
}

async fn serve_command() -> Result<(), std::io::Error> {
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("0.0.0.0:{}", port);

    let ctx = setup_app_context().await?;

    tracing::info!("Starting target registry server on {}", addr);
    Server::new(TcpListener::bind(&addr))
        .run(build_app(ctx.database))
        .await
}

async fn doctor_command() -> Result<(), std::io::Error> {
    let database_url = database_url();
    match check_schema_applied(&database_url).await {
        Ok(true) => {
            tracing::info!("Database at {} is reachable and migrated", database_url);
            Ok(())
        }
        Ok(false) => Err(std::io::Error::other(format!(
            "Database at {} has no targets table; run `serve` once to apply migrations",
            database_url
        ))),
        Err(e) => Err(std::io::Error::other(format!(
            "Cannot connect to database at {}: {}",
            database_url, e
        ))),
    }
}
