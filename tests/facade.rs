//! Facade tests through the public API, without any remote service.

use async_trait::async_trait;
use copyfactory::{
    AccountInfo, CopyFactory, CopyFactoryAuth, CopyFactoryEnvironment, CopyFactoryError,
    DomainResolver, FixedDomainResolver, ListConfigurationParams, RetryConfig, StopoutReason,
    TokenKind,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

const API_TOKEN: &str = "header.payload.sign";

/// Serves `responses` in order, one connection each, counting accepted requests.
async fn spawn_http_sequence_server(responses: Vec<(u16, &'static str)>) -> (Url, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = vec![0u8; 8192];
            let _ = stream.read(&mut buf).await;
            counter.fetch_add(1, Ordering::SeqCst);
            let response = format!(
                "HTTP/1.1 {status} Status\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    let origin = Url::parse(&format!("http://{addr}")).expect("origin");
    (origin, hits)
}

struct RegionalResolver;

#[async_trait]
impl DomainResolver for RegionalResolver {
    async fn copyfactory_origin(&self) -> Result<Url, CopyFactoryError> {
        CopyFactoryEnvironment::default().copyfactory_origin()
    }

    async fn account_info(&self, account_id: &str) -> Result<AccountInfo, CopyFactoryError> {
        Ok(AccountInfo {
            id: account_id.to_string(),
            regions: vec!["vint-hill".to_string(), "new-york".to_string()],
        })
    }

    async fn signal_client_origin(&self, regions: &[String]) -> Result<Url, CopyFactoryError> {
        CopyFactoryEnvironment::with_domain("example.com").regional_copyfactory_origin(&regions[0])
    }
}

#[test]
fn token_kind_follows_segment_count() {
    assert_eq!(CopyFactoryAuth::new(API_TOKEN).kind(), TokenKind::ApiAccess);
    assert_eq!(CopyFactoryAuth::new("abc.def").kind(), TokenKind::AccountAccess);
    assert_eq!(CopyFactoryAuth::new("account-token").kind(), TokenKind::AccountAccess);
}

#[tokio::test]
async fn account_token_is_rejected_without_network() {
    let copyfactory = CopyFactory::new("account-token").expect("build");

    let err = copyfactory
        .configuration()
        .get_strategies(&ListConfigurationParams::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "You can not invoke get_strategies method, because you have connected with account access token. \
         Please use API access token from https://app.metaapi.cloud/token page to invoke this method."
    );

    let err = copyfactory
        .trading()
        .reset_stopouts("e8867baa", "ABCD", StopoutReason::MaxDrawdown)
        .await
        .unwrap_err();
    assert!(matches!(err, CopyFactoryError::WrongTokenType { method: "reset_stopouts" }));

    let err = copyfactory.history().get_providers().await.unwrap_err();
    assert!(matches!(err, CopyFactoryError::WrongTokenType { .. }));
}

#[tokio::test]
async fn signal_client_uses_primary_region() {
    let copyfactory = CopyFactory::builder(API_TOKEN)
        .with_domain_resolver(Arc::new(RegionalResolver))
        .build()
        .expect("build");

    let signals = copyfactory
        .trading()
        .get_signal_client("e8867baa")
        .await
        .expect("signal client");
    assert_eq!(signals.account_id(), "e8867baa");
    assert_eq!(
        signals.origin().as_str(),
        "https://copyfactory-api-v1.vint-hill.example.com/"
    );
}

#[tokio::test]
async fn retryable_failures_are_retried_through_the_facade() {
    let (origin, hits) = spawn_http_sequence_server(vec![
        (500, r#"{"id":1,"error":"InternalError","message":"try again"}"#),
        (409, r#"{"id":1,"error":"ConflictError","message":"busy"}"#),
        (200, r#"[{"_id":"ABCD","name":"Test strategy"}]"#),
    ])
    .await;
    let copyfactory = CopyFactory::builder(API_TOKEN)
        .with_retry_config(RetryConfig {
            retries: 3,
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        })
        .with_domain_resolver(Arc::new(FixedDomainResolver::new(origin)))
        .build()
        .expect("build");

    let strategies = copyfactory
        .configuration()
        .get_strategies(&ListConfigurationParams::default())
        .await
        .expect("third attempt succeeds");
    assert_eq!(strategies[0].id, "ABCD");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn not_found_is_classified_and_not_retried() {
    let (origin, hits) = spawn_http_sequence_server(vec![
        (404, r#"{"id":1,"error":"NotFoundError","message":"Subscriber not found"}"#),
        (200, "[]"),
    ])
    .await;
    let copyfactory = CopyFactory::builder(API_TOKEN)
        .with_retry_config(RetryConfig {
            retries: 3,
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
        })
        .with_domain_resolver(Arc::new(FixedDomainResolver::new(origin)))
        .build()
        .expect("build");

    let err = copyfactory
        .trading()
        .get_stopouts("e8867baa")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.message(), "Subscriber not found");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
