use std::net::SocketAddr;

use axum_server::Handle;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use giftshop_core::startup::StartupGuard;
use giftshop_core::{Database, Error, ShopConfig};

mod context;
use context::ServerContext;

static TRACING: StartupGuard<()> = StartupGuard::new("tracing");

#[derive(Parser, Debug, Clone)]
#[command(name = "giftshop")]
#[command(author, version, about = "Telegram Mini-App gift storefront backend")]
struct Args {
    /// Address to which the HTTP server will bind
    #[arg(long, default_value = "0.0.0.0:8080")]
    server_addr: String,

    /// Postgres connection URL.
    #[arg(long, env = "DATABASE_URL")]
    db_url: String,

    /// Ceiling for the sum of active roulette drop chances, in percent.
    #[arg(long, default_value_t = 100.0)]
    max_total_drop_chance: f64,

    /// Task start times closer than this are treated as "start now".
    #[arg(long, default_value_t = 30)]
    immediate_start_window_secs: i64,

    /// Result cap for gift search.
    #[arg(long, default_value_t = 20)]
    search_limit: i64,

    /// Run pending migrations before serving.
    #[arg(long, default_value = "false")]
    migrate: bool,
}

impl Args {
    fn shop_config(&self) -> Result<ShopConfig, Error> {
        let immediate_start_window = chrono::Duration::try_seconds(self.immediate_start_window_secs)
            .ok_or_else(|| {
                Error::Config(format!(
                    "immediate_start_window_secs out of range: {}",
                    self.immediate_start_window_secs
                ))
            })?;
        let config = ShopConfig {
            max_total_drop_chance: self.max_total_drop_chance,
            immediate_start_window,
            search_limit: self.search_limit,
            ..ShopConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing() -> Result<(), Error> {
    TRACING.run(|| {
        tracing_log::LogTracer::init().map_err(|e| Error::Config(e.to_string()))?;
        let filter = EnvFilter::from_default_env()
            .add_directive("giftshop=info".parse().unwrap_or_default());
        let sub = fmt().with_env_filter(filter).finish();
        tracing::subscriber::set_global_default(sub).map_err(|e| Error::Config(e.to_string()))
    })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing()?;
    let args = Args::parse();
    info!("Giftshop starting. addr={}, migrate={}", args.server_addr, args.migrate);

    if let Err(e) = run_server(args).await {
        error!("Server error: {:?}", e);
        return Err(e.into());
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn run_server(args: Args) -> Result<(), Error> {
    let config = args.shop_config()?;
    let addr: SocketAddr = args.server_addr.parse()?;

    let db = Database::new(&args.db_url).await?;
    if args.migrate {
        db.migrate().await?;
    }

    let ctx = ServerContext::new(db, config);
    info!(
        "Roulette ceiling {}%, search limit {}",
        ctx.config.max_total_drop_chance, ctx.config.search_limit
    );
    let app = giftshop_core::http::router(ctx.state.clone());

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received; shutting down.");
        }
        shutdown.graceful_shutdown(Some(std::time::Duration::from_secs(10)));
    });

    info!("HTTP server listening on http://{}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;

    ctx.db.pool().close().await;
    info!("Server shut down.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_feed_shop_config() {
        let args = Args::parse_from([
            "giftshop",
            "--db-url",
            "postgres://localhost/giftshop",
            "--max-total-drop-chance",
            "90",
            "--immediate-start-window-secs",
            "45",
        ]);
        let config = args.shop_config().unwrap();
        assert_eq!(config.max_total_drop_chance, 90.0);
        assert_eq!(config.immediate_start_window, chrono::Duration::seconds(45));
        assert_eq!(config.search_limit, 20);
        assert!(!args.migrate);
    }

    #[test]
    fn oversized_start_window_is_rejected() {
        for secs in ["86401", "9223372036854775807"] {
            let args = Args::parse_from([
                "giftshop",
                "--db-url",
                "x",
                "--immediate-start-window-secs",
                secs,
            ]);
            assert!(matches!(args.shop_config(), Err(Error::Config(_))), "{secs}");
        }
    }

    #[test]
    fn bad_ceiling_is_rejected() {
        let args = Args::parse_from(["giftshop", "--db-url", "x", "--max-total-drop-chance", "0"]);
        assert!(matches!(args.shop_config(), Err(Error::Config(_))));
    }
}
