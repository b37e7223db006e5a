use anyhow::Context;
use realty::core::config::AppConfig;

pub use realty::api::handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    realty::setup_logging();

    // Fail the cold start instead of every invocation when the environment is wrong.
    AppConfig::from_env().context("invalid environment configuration")?;

    lambda_runtime::run(lambda_runtime::service_fn(handler))
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
