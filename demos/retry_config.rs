use std::time::Duration;

use copyfactory::{CopyFactory, HttpClientBuilder, ListConfigurationParams, RetryConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let token = std::env::var("COPYFACTORY_TOKEN")?;
    let copyfactory = CopyFactory::builder(token)
        .with_http_client_builder(
            HttpClientBuilder::default()
                .with_retry_config(RetryConfig {
                    retries: 3,
                    min_delay: Duration::from_millis(500),
                    max_delay: Duration::from_secs(10),
                })
                .with_timeout(Duration::from_secs(20))
                .with_connect_timeout(Duration::from_secs(3))
                .with_user_agent("copyfactory-rs/example-retry-config"),
        )
        .build()?;

    let strategies = copyfactory
        .configuration()
        .get_strategies(&ListConfigurationParams {
            include_removed: Some(false),
            limit: Some(100),
            ..Default::default()
        })
        .await?;
    for strategy in strategies {
        println!(
            "strategy={} name={}",
            strategy.id,
            strategy.settings.name.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
