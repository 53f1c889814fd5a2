use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use copyfactory::{CopyFactory, CopyFactoryError, CopyFactoryTransaction, StreamListener};
use tracing_subscriber::EnvFilter;

struct PrintTransactions;

#[async_trait]
impl StreamListener<CopyFactoryTransaction> for PrintTransactions {
    async fn on_event(&self, batch: Vec<CopyFactoryTransaction>) {
        for transaction in batch {
            println!(
                "time={} id={} type={} symbol={} profit={:?}",
                transaction.time,
                transaction.id,
                transaction.transaction_type.as_deref().unwrap_or("-"),
                transaction.symbol.as_deref().unwrap_or("-"),
                transaction.profit,
            );
        }
    }

    async fn on_error(&self, error: &CopyFactoryError) {
        eprintln!("transaction stream error: {error}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let token = std::env::var("COPYFACTORY_TOKEN")?;
    let strategy_id = std::env::var("COPYFACTORY_STRATEGY_ID")?;
    let copyfactory = CopyFactory::new(token)?;

    let start_time = chrono::Utc::now() - chrono::TimeDelta::hours(1);
    let listener_id = copyfactory.history().add_strategy_transaction_listener(
        Arc::new(PrintTransactions),
        &strategy_id,
        Some(start_time),
    );
    println!("listening listener_id={listener_id}");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = tokio::time::sleep(Duration::from_secs(600)) => {}
    }

    copyfactory
        .history()
        .remove_strategy_transaction_listener(&listener_id);
    copyfactory.shutdown().await;
    Ok(())
}
