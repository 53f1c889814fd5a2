use copyfactory::{
    CopyFactory, CopyFactoryExternalSignalRemove, CopyFactoryExternalSignalUpdate, SignalClient,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let token = std::env::var("COPYFACTORY_TOKEN")?;
    let account_id = std::env::var("COPYFACTORY_ACCOUNT_ID")?;
    let strategy_id = std::env::var("COPYFACTORY_STRATEGY_ID")?;
    let copyfactory = CopyFactory::new(token)?;

    let signals = copyfactory.trading().get_signal_client(&account_id).await?;
    let signal_id = SignalClient::generate_signal_id();

    signals
        .update_external_signal(
            &strategy_id,
            &signal_id,
            &CopyFactoryExternalSignalUpdate {
                symbol: "EURUSD".to_string(),
                signal_type: "POSITION_TYPE_BUY".to_string(),
                time: chrono::Utc::now(),
                volume: Some(0.01),
                ..Default::default()
            },
        )
        .await?;
    println!("opened signal_id={signal_id} via {}", signals.origin());

    for signal in signals.get_trading_signals().await? {
        println!(
            "strategy={} symbol={} type={} volume={:?}",
            signal.strategy.id, signal.symbol, signal.signal_type, signal.subscriber_volume
        );
    }

    signals
        .remove_external_signal(
            &strategy_id,
            &signal_id,
            &CopyFactoryExternalSignalRemove {
                time: chrono::Utc::now(),
            },
        )
        .await?;
    println!("removed signal_id={signal_id}");

    Ok(())
}
