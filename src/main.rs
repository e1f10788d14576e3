//! MixSearch: web search and page extraction server
//!
//! Serves the search tools over stdio JSON-RPC or as a REST API.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use mixsearch::{
    config::{self, Settings},
    engines::BackendLoader,
    metrics::Metrics,
    network::{BrowserFetcher, HttpClient, PageFetcher},
    tools::{rpc, ToolRegistry},
    web::{create_router, AppState},
    WebSearchService,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// HTTP server with REST routes and `POST /mcp`
    Rest,
    /// JSON-RPC tools on stdin/stdout
    Stdio,
}

/// Web search with backend fallback and page content extraction
#[derive(Parser, Debug)]
#[command(name = "mixsearch", version, about)]
struct Cli {
    /// Path to settings.yml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Front-end to serve
    #[arg(long, value_enum, default_value = "rest")]
    mode: Mode,

    /// Override the configured port (rest mode)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    init_tracing(&settings);
    info!("Starting MixSearch v{}", mixsearch::VERSION);

    let service = Arc::new(build_service(&settings)?);

    match cli.mode {
        Mode::Stdio => serve_stdio(service).await,
        Mode::Rest => serve_rest(settings, service).await,
    }
}

/// `RUST_LOG` wins over the configured level. Logs always go to stderr so
/// stdout stays free for the stdio transport.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mixsearch={}", settings.logging.level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_service(settings: &Settings) -> Result<WebSearchService> {
    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;

    // Load backends
    let registry = BackendLoader::load(settings)?;
    info!(backends = ?registry.names(), "Loaded search backends");

    let browser: Option<Arc<dyn PageFetcher>> = if settings.browser.enabled {
        Some(Arc::new(BrowserFetcher::new(&settings.browser)))
    } else {
        info!("Browser fallback disabled");
        None
    };

    Ok(WebSearchService::from_settings(
        settings,
        registry,
        client,
        browser,
        Arc::new(Metrics::new()),
    ))
}

async fn serve_stdio(service: Arc<WebSearchService>) -> Result<()> {
    let tools = ToolRegistry::new(service);
    let shutdown = CancellationToken::new();

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    rpc::serve_stdio(&tools, shutdown).await
}

async fn serve_rest(settings: Settings, service: Arc<WebSearchService>) -> Result<()> {
    // Bind address
    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);

    let state = AppState::new(settings, service);
    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
