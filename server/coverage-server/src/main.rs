use anyhow::{Context, Result};
use clap::Parser;
use std::{env, net::SocketAddr};
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coverage_server::{create_app, CoverageServer};

/// Coverage Engine HTTP Server
#[derive(Parser, Debug)]
#[command(name = "coverage-server")]
#[command(about = "Insurance eligibility and benefit utilization API server")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Database connection string (falls back to DATABASE_URL)
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads DATABASE_URL
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing(args.verbose);

    info!("Starting Coverage Engine HTTP Server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let server = CoverageServer::connect(&args.database_url)
        .await
        .context("failed to connect to database")?;

    let app = create_app(server);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!("Coverage Engine server running on http://{}:{}", args.host, args.port);
    info!("Health check available at: http://{}:{}/health", args.host, args.port);
    info!("API available at: http://{}:{}/api", args.host, args.port);
    info!("API docs available at: http://{}:{}/docs", args.host, args.port);

    axum::serve(listener, app)
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let is_development =
        env::var("COVERAGE_ENV").unwrap_or_else(|_| "development".to_string()) == "development";

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("coverage_server={level},coverage_service={level},tower_http=info,sqlx=warn").into()
    });

    if is_development {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    } else {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_ansi(false).json())
            .init();
    }
}
