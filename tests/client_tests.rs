// Client behavior that does not depend on the network
use spacemerchants::{AcquireError, SpaceMerchantClient};

#[tokio::test]
async fn tokenless_client_rejects_authenticated_endpoints() {
    let client = SpaceMerchantClient::new(None).unwrap();
    assert!(!client.has_token());

    let err = client.get_agent().await.unwrap_err();
    assert!(err.to_string().contains("token"), "got: {}", err);

    let err = client.list_ships(20, 1).await.unwrap_err();
    assert!(err.to_string().contains("token"), "got: {}", err);

    let err = client.accept_contract("some-contract").await.unwrap_err();
    assert!(err.to_string().contains("token"), "got: {}", err);
}

#[tokio::test]
async fn client_with_token_passes_the_guard() {
    let client = SpaceMerchantClient::new(Some("test-token".to_string())).unwrap();
    assert!(client.has_token());
}

#[tokio::test]
async fn closing_the_client_shuts_the_limiter_down() {
    let client = SpaceMerchantClient::new(None).unwrap();
    client.close();

    assert!(client.limiter().is_closed());
    assert_eq!(
        client.limiter().acquire().await.map(|_| ()),
        Err(AcquireError::Closed)
    );
}
