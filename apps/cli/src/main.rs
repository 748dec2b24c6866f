mod args;
mod config;
mod dirs;

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use app_api::{AppContext, QuoteRequest, StayRequest};
use clap::Parser;
use http_api::HttpState;
use tariff_app::{AppPaths, AppState, ensure_app_data_dir, write_tariff_defaults};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Command};
use crate::config::CliConfig;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::load_or_create().map_err(io::Error::other)?;
    if config.created {
        info!(path = %config.file.display(), port = config.config.port, "created config");
    }

    let data_dir = dirs::resolve_data_dir(cli.data_dir).map_err(io::Error::other)?;
    let context = open_context(data_dir, &config.config)?;

    match cli.command {
        Command::Serve { port } => serve(context, port.unwrap_or(config.config.port)).await,
        Command::Quote {
            rate,
            entry,
            exit,
            category,
            json,
        } => quote(&context, rate, entry, exit, category, json),
        Command::ExportDefaults { output } => export_defaults(&context, output),
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn open_context(data_dir: PathBuf, config: &CliConfig) -> CliResult<AppContext> {
    let paths = AppPaths::new(data_dir);
    ensure_app_data_dir(&paths).map_err(|err| io::Error::other(err.to_string()))?;

    let app_state = AppState::new(paths.db_path, paths.tariff_defaults_path);
    app_state
        .initialize()
        .map_err(|err| io::Error::other(format!("failed to initialize database: {}", err)))?;
    if let Some(currency) = config.currency.as_deref()
        && let Err(err) = app_state.services.settings.update(Some(currency), None)
    {
        warn!(error = %err, "ignoring configured currency");
    }

    Ok(AppContext {
        app_state,
        app_data_dir: paths.app_data_dir,
    })
}

async fn serve(context: AppContext, port: u16) -> CliResult<()> {
    info!(data_dir = %context.app_data_dir.display(), "using data dir");
    let router = http_api::router(HttpState::new(context));

    let (listener, actual_port, used_fallback) = bind_port(port).await?;
    if used_fallback {
        warn!(port, actual_port, "configured port unavailable, using fallback");
    }

    println!("Tariff API listening on http://127.0.0.1:{actual_port}/api");
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

fn quote(
    context: &AppContext,
    rate_id: i64,
    entry: String,
    exit: String,
    vehicle_category: Option<String>,
    json: bool,
) -> CliResult<()> {
    let result = app_api::fees_quote(
        context,
        QuoteRequest {
            rate_id,
            stay: StayRequest {
                entry,
                exit,
                vehicle_category,
            },
        },
    )
    .map_err(|err| io::Error::other(err.to_string()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let currency = context
        .app_state
        .services
        .settings
        .get()
        .map(|settings| settings.currency)
        .map_err(|err| io::Error::other(err.to_string()))?;
    println!("Rate {} over {} min", result.rate_id, result.elapsed_minutes);
    for line in &result.breakdown {
        let label = if line.quantity > 1 {
            format!("{} x{}", line.description, line.quantity)
        } else {
            line.description.clone()
        };
        println!("  {:<40} {:>12}", label, line.amount);
    }
    println!("  {:<40} {:>12} {}", "Total", result.amount, currency);
    if let Some(suggestion) = &result.suggestion {
        println!(
            "Rate {} would charge {} for this stay.",
            suggestion.target_rate_id, suggestion.target_amount
        );
    }
    for issue in &result.issues {
        eprintln!("warning: {}", issue.message);
    }
    Ok(())
}

fn export_defaults(context: &AppContext, output: Option<PathBuf>) -> CliResult<()> {
    let snapshot =
        app_api::tariffs_export(context).map_err(|err| io::Error::other(err.to_string()))?;
    let path = output.unwrap_or_else(|| context.app_state.config.tariff_defaults_path.clone());
    write_tariff_defaults(&path, &snapshot).map_err(|err| io::Error::other(err.to_string()))?;
    println!(
        "Wrote {} rates to {}",
        snapshot.rates.len(),
        path.display()
    );
    Ok(())
}

async fn bind_port(port: u16) -> Result<(tokio::net::TcpListener, u16, bool), io::Error> {
    if port == 0 {
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let actual_port = listener.local_addr()?.port();
        return Ok((listener, actual_port, false));
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => Ok((listener, port, false)),
        Err(_) => {
            let listener =
                tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
            let actual_port = listener.local_addr()?.port();
            Ok((listener, actual_port, true))
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
    }
}
