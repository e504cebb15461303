use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sprout_control::{
    ActivityConfig, ActivitySink, ApiState, Collaborators, Command, Config, DeviceClient, Engine,
    FixedWeather, HttpActivityLog, HttpDevice, HttpRecommender, MemoryActivityLog, OpenWeather,
    RecommendationProvider, RecommenderConfig, RuleBasedRecommender, WeatherConfig, WeatherSource,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sprout-control")]
#[command(about = "Sprout irrigation pump controller")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "sprout-control.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tracing=info,sprout_control=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    info!(
        http_addr = %config.server.http_addr,
        device = config.device.addr.as_deref(),
        location = config.session.location.as_deref(),
        "Starting sprout-control"
    );

    let collaborators = build_collaborators(&config)?;
    let activity = Arc::clone(&collaborators.activity);

    let cancel = CancellationToken::new();
    let (engine, engine_task) = Engine::spawn(&config, collaborators, cancel.clone());

    if config.session.auto_start {
        engine.send(Command::StartSession).await?;
    }
    if let Some(addr) = config.device.addr.clone() {
        engine.send(Command::Connect(addr)).await?;
    }

    // HTTP server
    let http_addr = config.server.http_addr;
    let axum_app = sprout_control::router(ApiState { engine, activity });
    let axum_listener = TcpListener::bind(http_addr).await?;
    info!(%http_addr, "HTTP server listening");

    let cancel_for_http = cancel.clone();

    tokio::select! {
        result = axum::serve(axum_listener, axum_app).with_graceful_shutdown(async move {
            cancel_for_http.cancelled().await;
        }) => {
            if let Err(e) = result {
                error!(error = ?e, "HTTP server error");
            }
            info!("HTTP server shut down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            cancel.cancel();
        }
    }

    // Wait for the control loop to finish
    cancel.cancel();
    let _ = engine_task.await;

    info!("sprout-control shut down complete");
    Ok(())
}

fn build_collaborators(config: &Config) -> color_eyre::Result<Collaborators> {
    let device: Arc<dyn DeviceClient> =
        Arc::new(HttpDevice::new(config.device.request_timeout())?);

    let weather: Arc<dyn WeatherSource> = match &config.weather {
        WeatherConfig::Static => {
            info!("Using built-in static forecast");
            Arc::new(FixedWeather)
        }
        WeatherConfig::OpenWeather { api_key, base_url } => {
            info!(%base_url, "Using OpenWeather forecast");
            Arc::new(OpenWeather::new(api_key.as_str(), base_url.as_str()))
        }
    };

    let provider: Arc<dyn RecommendationProvider> = match &config.recommender {
        RecommenderConfig::Rules => {
            info!("Using offline recommendation rules");
            Arc::new(RuleBasedRecommender)
        }
        RecommenderConfig::Http {
            url,
            api_key,
            timeout_secs,
        } => {
            info!(%url, timeout_secs, "Using remote recommendation provider");
            Arc::new(HttpRecommender::new(
                url.as_str(),
                api_key.clone(),
                Duration::from_secs(*timeout_secs),
            ))
        }
    };

    let activity: Arc<dyn ActivitySink> = match &config.activity {
        ActivityConfig::Memory { capacity } => {
            info!(capacity, "Using in-memory activity log");
            Arc::new(MemoryActivityLog::new(*capacity))
        }
        ActivityConfig::Http { base_url, token } => {
            info!(%base_url, "Using remote activity log");
            Arc::new(HttpActivityLog::new(base_url.as_str(), token.as_str()))
        }
    };

    Ok(Collaborators {
        device,
        weather,
        provider,
        activity,
    })
}
