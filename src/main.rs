use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schemegraph::db::OrientDbClient;
use schemegraph::schema::{BuildOptions, SchemaBuilder};
use schemegraph::server::{self, SchemeService};
use schemegraph::{Config, SchemeDocument, SchemeStore};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "schemegraph", version)]
#[command(about = "Introspect a graph database schema and serve it for visualization")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load (or generate) the scheme file and serve it over HTTP (default)
    Serve {
        /// Regenerate from the database even if a scheme file exists
        #[arg(long)]
        refresh: bool,
    },
    /// Rebuild the scheme file from the database
    Regenerate,
    /// Check database connectivity and report what a build would find, without saving
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let cli = Cli::parse();

    let config = Config::load()?;
    log::info!("Configuration loaded successfully");
    log::info!(
        "Database: {} at {}:{}",
        config.database.database,
        config.database.host,
        config.database.port
    );
    log::info!("Scheme file: {}", config.scheme_file().display());

    match cli.command.unwrap_or(Command::Serve { refresh: false }) {
        Command::Serve { refresh } => run_server(config, refresh).await,
        Command::Regenerate => run_regenerate(config).await,
        Command::Check => run_check(config).await,
    }
}

fn build_service(config: &Config, client: Arc<OrientDbClient>) -> SchemeService {
    let builder = SchemaBuilder::new(client, BuildOptions::from_config(config));
    SchemeService::new(builder, SchemeStore::new(config.scheme_file()))
}

/// Serve the scheme document over HTTP
async fn run_server(config: Config, refresh: bool) -> Result<()> {
    log::info!("Starting SchemeGraph v{}", env!("CARGO_PKG_VERSION"));

    let client = Arc::new(OrientDbClient::from_config(&config)?);
    let service = Arc::new(build_service(&config, client));

    let document = service
        .load_or_regenerate(refresh)
        .await
        .context("No scheme available: the database could not be introspected and no scheme file exists")?;
    print_summary(&document);

    server::run(service, &config.http_server).await?;
    Ok(())
}

/// Rebuild and persist the scheme file
async fn run_regenerate(config: Config) -> Result<()> {
    let client = Arc::new(OrientDbClient::from_config(&config)?);
    let service = build_service(&config, client);

    let document = service.regenerate().await.context("Schema regeneration failed")?;
    print_summary(&document);
    println!("Scheme written to {}", config.scheme_file().display());
    Ok(())
}

/// Verify connectivity and report counts without touching the scheme file
async fn run_check(config: Config) -> Result<()> {
    let client = Arc::new(OrientDbClient::from_config(&config)?);
    client
        .ping()
        .await
        .with_context(|| format!("Cannot reach database {}", client.database()))?;
    log::info!("✓ Connected to {}", client.database());

    let builder = SchemaBuilder::new(client, BuildOptions::from_config(&config));
    let document = builder.build().await?;
    print_summary(&document);
    Ok(())
}

fn print_summary(document: &SchemeDocument) {
    let inheritance = document
        .relationships
        .iter()
        .filter(|r| r.is_inheritance())
        .count();
    println!(
        "Vertices: {}  Edges: {}  Relationships: {} ({} inheritance, {} data)",
        document.vertices.len(),
        document.edges.len(),
        document.relationships.len(),
        inheritance,
        document.relationships.len() - inheritance
    );
}
