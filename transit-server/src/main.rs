use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono_tz::Tz;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use transit_server::catalog::{CatalogHandle, import::load_gtfs_dir};
use transit_server::departures::ResolverConfig;
use transit_server::query::QueryService;
use transit_server::web::{AppState, create_router};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding the unpacked GTFS feed.
    #[arg(env, long, default_value = "OtwartyWroclaw_rozklad_jazdy_GTFS")]
    gtfs_dir: PathBuf,

    /// Address to serve HTTP on.
    #[arg(env, long, default_value = "127.0.0.1:5001")]
    bind: SocketAddr,

    /// The one city the API answers for.
    #[arg(env, long, default_value = "wroclaw")]
    city: String,

    /// Timezone used when the feed declares none.
    #[arg(env, long, default_value = "Europe/Warsaw")]
    timezone: String,

    /// Seconds between feed reloads; 0 disables periodic reloading.
    #[arg(env, long, default_value_t = 24 * 60 * 60)]
    reload_interval_secs: u64,

    /// Stops considered around the start point before widening the search.
    #[arg(env, long, default_value_t = 20)]
    nearest_stops: usize,

    /// Upper bound on stops examined per request.
    #[arg(env, long, default_value_t = 200)]
    max_candidate_stops: usize,

    /// Radius in meters of the widened stop search.
    #[arg(env, long, default_value_t = 1500.0)]
    max_search_radius_m: f64,

    /// How far past the start time departures are looked for.
    #[arg(env, long, default_value_t = 120)]
    look_ahead_mins: i64,

    /// Results returned when a request gives no limit.
    #[arg(env, long, default_value_t = 5)]
    default_limit: usize,

    /// Largest limit honoured.
    #[arg(env, long, default_value_t = 50)]
    max_limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer().with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            ),
        )
        .init();

    let timezone: Tz = cli
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid timezone {}: {e}", cli.timezone))?;

    let dir = cli.gtfs_dir.clone();
    let catalog = tokio::task::spawn_blocking(move || load_gtfs_dir(&dir, timezone))
        .await?
        .with_context(|| format!("failed to load GTFS feed from {}", cli.gtfs_dir.display()))?;
    let catalogs = CatalogHandle::new(catalog);

    if cli.reload_interval_secs > 0 {
        let catalogs = catalogs.clone();
        let dir = cli.gtfs_dir.clone();
        let period = Duration::from_secs(cli.reload_interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // First tick is immediate, skip it
            loop {
                interval.tick().await;
                // Failures are logged by the handle; the old catalog keeps serving
                if let Ok(generation) = catalogs.reload_from(dir.clone(), timezone).await {
                    debug!(generation, trigger = "interval", "Catalog reloaded");
                }
            }
        });
    }

    #[cfg(unix)]
    {
        let catalogs = catalogs.clone();
        let dir = cli.gtfs_dir.clone();
        let mut hangup = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
            .context("failed to install SIGHUP handler")?;
        tokio::spawn(async move {
            while hangup.recv().await.is_some() {
                info!("SIGHUP received, reloading catalog");
                if let Ok(generation) = catalogs.reload_from(dir.clone(), timezone).await {
                    debug!(generation, trigger = "sighup", "Catalog reloaded");
                }
            }
        });
    }

    let config = ResolverConfig::new(
        cli.nearest_stops,
        cli.max_candidate_stops,
        cli.max_search_radius_m,
        cli.look_ahead_mins,
        cli.default_limit,
        cli.max_limit,
    );
    let queries = QueryService::new(catalogs, cli.city.clone(), config);
    let app = create_router(AppState::new(queries));

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    info!(addr = %cli.bind, city = %cli.city, "Public transport API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("Ctrl-C received; shutting down...");
        })
        .await?;

    Ok(())
}
