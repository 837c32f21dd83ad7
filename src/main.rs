use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use texpng::api;
use texpng::models::{AppConfig, MathMode, DEFAULT_DPI};
use texpng::server;
use texpng::services::RenderService;

#[derive(Parser)]
#[command(name = "texpng")]
#[command(about = "Render LaTeX math expressions to transparent PNG images")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Render one expression directly to a PNG file
    Render {
        /// LaTeX math expression, without delimiters
        #[arg(short, long)]
        tex: String,

        /// Output PNG file path
        #[arg(short, long)]
        output: PathBuf,

        /// Typeset as display math instead of inline math
        #[arg(short, long)]
        display: bool,

        /// Output resolution in dots per inch
        #[arg(long, default_value_t = DEFAULT_DPI)]
        dpi: i64,
    },
    /// Show resolved configuration and tool paths
    Check,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "texpng API",
        description = "Render LaTeX math expressions to transparent PNG images",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(api::handle_render, api::handle_health),
    components(schemas(
        texpng::models::RenderRequest,
        api::RenderErrorResponse,
        api::HealthResponse,
    )),
    tags(
        (name = "Render", description = "Equation rendering"),
        (name = "Health", description = "Liveness check")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render {
            tex,
            output,
            display,
            dpi,
        }) => run_render_command(&tex, &output, display, dpi).await,
        Some(Commands::Check) => run_check_command(),
        Some(Commands::Serve) | None => run_server().await,
    }
}

/// Render a single expression to a file (no server needed)
async fn run_render_command(
    tex: &str,
    output: &Path,
    display: bool,
    dpi: i64,
) -> anyhow::Result<()> {
    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "texpng=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let config = AppConfig::load()?;
    let renderer = RenderService::new(&config)?;

    let png_bytes = match renderer
        .render(tex, MathMode::from_display_flag(display), dpi)
        .await
    {
        Ok(bytes) => bytes,
        Err(e) => {
            if let Some(log) = e.log() {
                eprintln!("{log}");
            }
            return Err(anyhow::anyhow!("Render error: {e}"));
        }
    };

    std::fs::write(output, &png_bytes)?;
    println!("Rendered {} ({} bytes)", output.display(), png_bytes.len());

    Ok(())
}

/// Print configuration and tool resolution, failing if a tool is missing
fn run_check_command() -> anyhow::Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    println!("texpng v{VERSION}\n");

    let config = AppConfig::load()?;

    println!("Configuration:");
    println!(
        "  CONFIG_FILE = {}",
        std::env::var("CONFIG_FILE").unwrap_or_else(|_| "(not set)".to_string())
    );
    println!("  bind_addr   = {}", config.bind_addr);
    println!(
        "  work_dir    = {}",
        config
            .work_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| std::env::temp_dir().display().to_string())
    );
    println!("  timeout     = {}s", config.timeout_secs);
    println!("  dpi range   = {}..={}", config.min_dpi, config.max_dpi);

    println!("\nTools:");
    let toolchain = config.resolve_toolchain();
    match &toolchain {
        Ok(t) => {
            println!("  pdflatex    = {}", t.pdflatex.display());
            println!("  gs          = {}", t.ghostscript.display());
        }
        Err(e) => println!("  {e}"),
    }

    toolchain?;
    Ok(())
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "texpng=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let bind_addr = config.socket_addr()?;

    let state = server::create_app_state(&config)?;

    let app = server::build_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "texpng server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
