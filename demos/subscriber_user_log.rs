use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use copyfactory::{
    CopyFactory, CopyFactoryError, CopyFactoryUserLogMessage, GetUserLogParams, LogLevel,
    StreamListener, SubscriberLogFilter,
};
use tracing_subscriber::EnvFilter;

struct PrintLog;

#[async_trait]
impl StreamListener<CopyFactoryUserLogMessage> for PrintLog {
    async fn on_event(&self, batch: Vec<CopyFactoryUserLogMessage>) {
        for record in batch {
            println!("{} {} {}", record.time, record.level, record.message);
        }
    }

    async fn on_error(&self, error: &CopyFactoryError) {
        eprintln!("user log stream error: {error}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let token = std::env::var("COPYFACTORY_TOKEN")?;
    let subscriber_id = std::env::var("COPYFACTORY_SUBSCRIBER_ID")?;
    let copyfactory = CopyFactory::new(token)?;
    let trading = copyfactory.trading();

    let start_time = chrono::Utc::now() - chrono::TimeDelta::days(1);
    let history = trading
        .get_user_log(
            &subscriber_id,
            &GetUserLogParams {
                start_time: Some(start_time),
                limit: Some(50),
                ..Default::default()
            },
        )
        .await?;
    println!("last day: {} records", history.len());

    let listener_id = trading.add_subscriber_log_listener(
        Arc::new(PrintLog),
        &subscriber_id,
        SubscriberLogFilter {
            level: Some(LogLevel::Warn),
            ..Default::default()
        },
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = tokio::time::sleep(Duration::from_secs(600)) => {}
    }

    trading.remove_subscriber_log_listener(&listener_id);
    copyfactory.shutdown().await;
    Ok(())
}
