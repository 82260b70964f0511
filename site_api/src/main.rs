use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wcag_site_api::{AppState, Settings, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load_with_dotenv()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,wcag_site_api=debug,wcag_core=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if settings.cron_secret().is_none() {
        tracing::warn!("CRON_SECRET is not set; the blog cron route accepts every caller");
    }
    if settings.openrouter_api_key().is_none() {
        tracing::warn!("OPENROUTER_API_KEY is not set; blog generation will fail");
    }

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        data_dir = %settings.data_dir.display(),
        environment = %settings.environment,
        "site API listening"
    );

    let app = routes::router(AppState::new(settings)?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
