use anyhow::Result;

use crate::api;
use crate::core::AppConfig;

pub async fn run(host: String, port: String) -> Result<()> {
    api::init_tracing();
    let config = AppConfig::from_env()?;
    api::serve(host, port, config).await
}
