//! Entry point for the Rent Engine binary.
//!
//! Running this binary starts an HTTP server exposing the pricing
//! calculators and calculation records.  The rate file may be set via
//! the `RENT_RATES_FILE` environment variable and the bind address via
//! `RENT_BIND_ADDR`; both may also come from a `.env` file.

use rent_engine::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rent_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env();
    tracing::info!(rates_file = %settings.rates_file.display(), "starting rent engine");
    rent_engine::api::serve(&settings).await
}
