use relay_core::{config::Config, services::Services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    relay_core::logging::init("relay", &cfg.log_level, cfg.log_json)?;

    let services = Services::from_config(&cfg)?;
    tracing::info!(
        api_url = %cfg.api_url,
        partner_id = cfg.partner_id.as_deref(),
        rate_limit_ms = cfg.rate_limit_window.as_millis() as u64,
        "starting relay bot"
    );

    relay_telegram::router::run_polling(&cfg, services).await
}
