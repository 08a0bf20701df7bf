use std::net::{IpAddr, SocketAddr};

use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gosozvon::config::{AppConfig, LiveKitConfig, TelegramConfig, WebConfig};
use gosozvon::livekit::DEFAULT_TOKEN_TTL_SECS;
use gosozvon::rooms::ROOM_LIFETIME_MS;
use gosozvon::state::AppState;
use gosozvon::web;

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Verbose,
    Debug,
    Trace,
}

/// gosozvon command line arguments
#[derive(Parser, Debug)]
#[command(name = "gosozvon")]
#[command(version, about = "Video calls with short-lived rooms", long_about = None)]
struct CliArgs {
    /// Listen address
    #[arg(short = 'a', long, value_name = "ADDRESS", env = "GOSOZVON_ADDRESS", default_value = "0.0.0.0")]
    address: String,

    /// HTTP port
    #[arg(short = 'p', long, value_name = "PORT", env = "PORT", default_value_t = 3000)]
    http_port: u16,

    /// LiveKit API key
    #[arg(long, env = "LIVEKIT_API_KEY", hide_env_values = true)]
    livekit_api_key: Option<String>,

    /// LiveKit API secret
    #[arg(long, env = "LIVEKIT_API_SECRET", hide_env_values = true)]
    livekit_api_secret: Option<String>,

    /// LiveKit server URL
    #[arg(long, env = "LIVEKIT_URL")]
    livekit_url: Option<String>,

    /// Participant token lifetime in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TOKEN_TTL_SECS)]
    token_ttl: u32,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    telegram_bot_token: Option<String>,

    /// Public base URL used in Telegram room links
    #[arg(long, env = "TELEGRAM_CALL_BASE_URL")]
    telegram_call_base_url: Option<String>,

    /// Log level (error, warn, info, verbose, debug, trace)
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Increase verbosity (-v for verbose, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl CliArgs {
    fn into_config(self) -> AppConfig {
        AppConfig {
            web: WebConfig {
                bind_address: self.address,
                http_port: self.http_port,
            },
            livekit: LiveKitConfig {
                api_key: self.livekit_api_key,
                api_secret: self.livekit_api_secret,
                url: self.livekit_url,
                token_ttl_secs: self.token_ttl,
            },
            telegram: TelegramConfig {
                bot_token: self.telegram_bot_token,
                call_base_url: self.telegram_call_base_url,
                ..TelegramConfig::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_level, args.verbose);

    tracing::info!("Starting gosozvon v{}", env!("CARGO_PKG_VERSION"));

    let config = args.into_config();
    let bind_ip: IpAddr = config
        .web
        .bind_address
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid bind address: {}", config.web.bind_address))?;
    let addr = SocketAddr::new(bind_ip, config.web.http_port);

    if config.livekit.credentials().is_none() {
        tracing::warn!("LiveKit credentials not configured, connection details will fail");
    }
    if config.telegram.credentials().is_none() {
        tracing::warn!("Telegram bot not configured, webhook will reject updates");
    }
    tracing::info!(
        "Rooms expire {} minutes after registration",
        ROOM_LIFETIME_MS / 60_000
    );

    let state = AppState::from_config(config);
    let app = web::create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Starting HTTP server on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize logging with tracing
fn init_logging(level: LogLevel, verbose_count: u8) {
    // Verbose count overrides log level
    let effective_level = match verbose_count {
        0 => level,
        1 => LogLevel::Verbose,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    let filter = match effective_level {
        LogLevel::Error => "gosozvon=error,tower_http=error",
        LogLevel::Warn => "gosozvon=warn,tower_http=warn",
        LogLevel::Info => "gosozvon=info,tower_http=info",
        LogLevel::Verbose => "gosozvon=debug,tower_http=info",
        LogLevel::Debug => "gosozvon=debug,tower_http=debug",
        LogLevel::Trace => "gosozvon=trace,tower_http=debug",
    };

    // Environment variable takes highest priority
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }
}
