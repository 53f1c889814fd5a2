use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use copyfactory::{
    CopyFactory, CopyFactoryError, CopyFactoryStrategyStopout, StopoutFilter, StreamListener,
};
use tracing_subscriber::EnvFilter;

struct PrintStopouts;

#[async_trait]
impl StreamListener<CopyFactoryStrategyStopout> for PrintStopouts {
    async fn on_event(&self, batch: Vec<CopyFactoryStrategyStopout>) {
        for stopout in batch {
            println!(
                "seq={:?} strategy={} reason={} stopped_at={} till={:?}",
                stopout.sequence_number,
                stopout.strategy.id,
                stopout.reason,
                stopout.stopped_at,
                stopout.stopped_till,
            );
        }
    }

    async fn on_error(&self, error: &CopyFactoryError) {
        eprintln!("stopout stream error: {error}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let token = std::env::var("COPYFACTORY_TOKEN")?;
    let subscriber_id = std::env::var("COPYFACTORY_SUBSCRIBER_ID").ok();
    let copyfactory = CopyFactory::new(token)?;

    let listener_id = copyfactory.trading().add_stopout_listener(
        Arc::new(PrintStopouts),
        StopoutFilter {
            subscriber_id,
            ..Default::default()
        },
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = tokio::time::sleep(Duration::from_secs(600)) => {}
    }

    copyfactory.trading().remove_stopout_listener(&listener_id);
    copyfactory.shutdown().await;
    Ok(())
}
