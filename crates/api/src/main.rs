use anyhow::Context as _;

use roster_infra::AppConfig;
use roster_observability::LogFormat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;

    roster_observability::init(if config.mode.is_development() {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    });
    roster_observability::install_panic_hook();

    let repo = roster_api::server::open_repository(&config).await?;
    let app = roster_api::app::build_app(&config, repo);

    roster_api::server::serve(&config, app).await
}
