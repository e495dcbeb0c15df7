use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use sheet_insight::{
    config::Config, ingest, models::FileDataView, routes::create_router, utils::init_logger,
    AppState,
};

#[derive(Parser)]
#[command(name = "sheet-insight", version, about = "Spreadsheet name/date/time extraction with AI analysis")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Parse a local XLSX/CSV file and print the extraction result as JSON
    Extract {
        path: PathBuf,
        /// Number of raw rows to include in the output
        #[arg(long, default_value_t = 100)]
        rows: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let _guard = init_logger(&config.logging);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Extract { path, rows } => extract(path, rows).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Configuration loaded: {:?}", config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config);
    let app = create_router(state);

    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn extract(path: PathBuf, rows: usize) -> anyhow::Result<()> {
    let content = tokio::fs::read(&path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let data = ingest::process_file(&file_name, &content)?;
    let view = FileDataView::from_file_data(&data, rows);

    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
