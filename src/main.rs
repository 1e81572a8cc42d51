use std::net::SocketAddr;
use std::sync::Arc;
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::oneshot,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use transaction_aggregator::config::AppConfig;
use transaction_aggregator::routes::create_app_router;
use transaction_aggregator::services::cache::TransactionCache;
use transaction_aggregator::services::coordinator::FanOutCoordinator;
use transaction_aggregator::services::metrics::Metrics;
use transaction_aggregator::services::sources::SourceClient;
use transaction_aggregator::state::AppState;

type LogReloadHandle =
    tracing_subscriber::reload::Handle<tracing_subscriber::EnvFilter, tracing_subscriber::Registry>;

struct CommandResult {
    message: String,
    shutdown: bool,
}

impl CommandResult {
    fn reply(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            shutdown: false,
        }
    }
}

#[derive(Clone)]
struct CliContext {
    state: AppState,
    log_handle: Option<LogReloadHandle>,
}

fn parse_command(input: &str) -> (&str, Vec<&str>) {
    let trimmed = input.trim();
    let mut parts = trimmed.split_whitespace();
    let cmd = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();
    (cmd, args)
}

fn command_help() -> CommandResult {
    CommandResult::reply(
        "/help - show commands\n/status - show service status\n/sources - list configured sources\n/metrics - show request and source counters\n/cache stats|clear - show or clear cached source results\n/logs level <level> - change log level\n/quit - stop the service",
    )
}

fn command_status(ctx: &CliContext) -> CommandResult {
    let config = &ctx.state.config;
    CommandResult::reply(format!(
        "Service status:\n- Address: {}:{}\n- Sources: {}\n- Max attempts per source: {}\n- Cache enabled: {}",
        config.server.host,
        config.server.port,
        ctx.state.coordinator.sources().len(),
        config.client.max_attempts,
        ctx.state.cache.is_enabled()
    ))
}

fn command_sources(ctx: &CliContext) -> CommandResult {
    let listing = ctx
        .state
        .coordinator
        .sources()
        .iter()
        .map(|s| format!("{} -> {}", s.id, s.base_url))
        .collect::<Vec<_>>()
        .join("\n");
    CommandResult::reply(listing)
}

async fn command_metrics(ctx: &CliContext) -> CommandResult {
    let stats = ctx.state.metrics.get_stats().await;
    CommandResult::reply(format!(
        "Metrics: requests={} rejected={} avg_latency_ms={:.2} p95_latency_ms={} fetches ok={} empty={} failed={} retries={}",
        stats.total_requests,
        stats.rejected_requests,
        stats.avg_latency_ms,
        stats.p95_latency_ms,
        stats.source_fetches_ok,
        stats.source_fetches_empty,
        stats.source_fetches_failed,
        stats.source_retries
    ))
}

async fn command_cache(args: &[&str], ctx: &CliContext) -> CommandResult {
    if matches!(args.first(), Some(cmd) if *cmd == "clear") {
        ctx.state.cache.clear().await;
        return CommandResult::reply("Cache cleared");
    }

    let stats = ctx.state.cache.stats().await;
    CommandResult::reply(format!(
        "Cache: enabled={}, entries={}, hits={}, misses={}, hit_rate={:.2}%",
        stats.enabled, stats.entries, stats.hits, stats.misses, stats.hit_rate
    ))
}

fn command_logs(args: &[&str], ctx: &CliContext) -> CommandResult {
    if args.len() == 2 && args[0] == "level" {
        let level = args[1].to_lowercase();
        let Some(handle) = &ctx.log_handle else {
            return CommandResult::reply("Log level reload not available in this build");
        };

        return match EnvFilter::try_new(format!("{level},tower_http=debug")) {
            Ok(filter) => {
                if handle.reload(filter).is_ok() {
                    CommandResult::reply(format!("Log level set to {level}"))
                } else {
                    CommandResult::reply("Failed to update log level")
                }
            }
            Err(e) => CommandResult::reply(format!("Invalid log level: {e}")),
        };
    }

    CommandResult::reply("Usage: /logs level <trace|debug|info|warn|error>")
}

async fn process_command(input: &str, ctx: &CliContext) -> CommandResult {
    let (cmd, args) = parse_command(input);

    match cmd {
        "/help" | "help" => command_help(),
        "/status" | "status" => command_status(ctx),
        "/sources" | "sources" => command_sources(ctx),
        "/metrics" | "metrics" => command_metrics(ctx).await,
        "/cache" | "cache" => command_cache(&args, ctx).await,
        "/logs" | "logs" => command_logs(&args, ctx),
        "/quit" | "/exit" | "quit" | "exit" => CommandResult {
            message: "Shutting down service...".to_string(),
            shutdown: true,
        },
        _ => CommandResult::reply("Unknown command. Type /help for a list of commands."),
    }
}

async fn setup_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                None
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, initiating graceful shutdown");
            }
            () = async {
                if let Some(ref mut sigterm) = sigterm {
                    if sigterm.recv().await.is_none() {
                        warn!("SIGTERM signal stream closed unexpectedly");
                    }
                } else {
                    std::future::pending::<()>().await;
                }
            } => {
                info!("Received SIGTERM, initiating graceful shutdown");
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            return;
        }
        info!("Received Ctrl+C, initiating graceful shutdown");
    }
}

fn setup_logging(config: &AppConfig) -> LogReloadHandle {
    let filter = EnvFilter::try_new(format!(
        "{level},tower_http=debug",
        level = config.log.level
    ))
    .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    let (filter_layer, reload_handle) = tracing_subscriber::reload::Layer::new(filter);

    match config.log.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(false)
                        .with_file(true)
                        .with_line_number(true)
                        .with_current_span(true)
                        .with_span_list(true),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .init();
        }
    }

    reload_handle
}

fn initialize_services(config: AppConfig) -> anyhow::Result<AppState> {
    let sources = config
        .source_descriptors()
        .map_err(|e| anyhow::anyhow!("Invalid source configuration: {e}"))?;

    let metrics = Arc::new(Metrics::new());
    let client = SourceClient::new(&config.client)
        .map_err(|e| {
            error!("Failed to initialize source client: {e}");
            e
        })?
        .with_metrics(Arc::clone(&metrics));
    let cache = TransactionCache::new(config.cache.enabled);
    let coordinator = Arc::new(FanOutCoordinator::new(
        sources,
        Arc::new(client),
        cache.clone(),
    ));

    Ok(AppState {
        config: Arc::new(config),
        coordinator,
        cache,
        metrics,
    })
}

async fn run_server(
    state: AppState,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let host = state.config.server.host.clone();
    let port = state.config.server.port;
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address {host}:{port}: {e}"))?;

    let app = create_app_router(state);

    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown = async move {
        tokio::select! {
            () = setup_shutdown_signal() => {},
            _ = &mut shutdown_rx => {},
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown);

    if let Err(e) = server.await {
        error!("Server error: {e}");
        return Err(anyhow::anyhow!("Server failed: {e}"));
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn run_command_loop(ctx: CliContext, shutdown_tx: oneshot::Sender<()>) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();
    let mut shutdown_tx = Some(shutdown_tx);

    println!("Interactive CLI ready. Type /help for available commands.");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let result = process_command(&line, &ctx).await;
        println!("{}", result.message);

        if result.shutdown {
            if let Some(tx) = shutdown_tx.take() {
                let _ = tx.send(());
            }
            break;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::new().map_err(|e| {
        anyhow::anyhow!(
            "Failed to load configuration: {e}. Please check your environment variables and configuration."
        )
    })?;

    let log_handle = Some(setup_logging(&config));

    info!("Starting Transaction Aggregator v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Config loaded: Host={}, Port={}, Sources={}",
        config.server.host,
        config.server.port,
        config.sources.urls.len()
    );

    let state = initialize_services(config)?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let cli_context = CliContext {
        state: state.clone(),
        log_handle,
    };
    tokio::spawn(async move {
        if let Err(e) = run_command_loop(cli_context, shutdown_tx).await {
            warn!("CLI loop terminated with error: {e}");
        }
    });

    run_server(state, shutdown_rx).await
}
