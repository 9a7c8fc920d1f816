//! Round trips against a real Redis server.
//!
//! Run with `REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`.

use std::collections::HashMap;

use cachemq_cache::{
    CacheClient, HashCommands, KeyCommands, KeyTtl, ListCommands, SetCommands,
    SortedSetCommands, StoreConfig, StringCommands,
};

async fn live_client() -> CacheClient {
    let config = StoreConfig {
        url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
        namespace: Some(format!("cachemq-test-{}", uuid::Uuid::new_v4())),
        ..StoreConfig::default()
    };
    CacheClient::new(config).await.expect("redis reachable")
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn live_string_and_counter() {
    let cache = live_client().await;

    cache.set("test", "test").await.unwrap();
    assert_eq!(cache.get("test").await.unwrap().as_deref(), Some("test"));

    assert_eq!(cache.increment("counter", 5).await.unwrap(), 5);
    assert_eq!(cache.decrement("counter", 2).await.unwrap(), 3);

    cache.set_with_ttl("otp", "123456", 30).await.unwrap();
    assert!(matches!(
        cache.ttl_remaining("otp").await.unwrap(),
        KeyTtl::Expires(_)
    ));

    cache.delete(&["test", "counter", "otp"]).await.unwrap();
    cache.close().await;
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn live_collections() {
    let cache = live_client().await;

    let fields = HashMap::from([
        ("a".to_string(), "1".to_string()),
        ("b".to_string(), "2".to_string()),
    ]);
    cache.h_set_all("h", &fields).await.unwrap();
    assert_eq!(cache.h_get_all("h").await.unwrap(), fields);

    cache.l_right_push("l", "x").await.unwrap();
    cache.l_right_push("l", "y").await.unwrap();
    assert_eq!(cache.l_range("l", 0, -1).await.unwrap(), ["x", "y"]);

    assert!(cache.s_add("s", &["m"]).await.unwrap());
    assert!(!cache.s_add("s", &["m"]).await.unwrap());

    cache.z_add("lb", "alice", 10.0).await.unwrap();
    cache.z_add("lb", "bob", 5.0).await.unwrap();
    assert_eq!(cache.z_range("lb", 0, -1).await.unwrap(), ["bob", "alice"]);
    assert_eq!(cache.z_score("lb", "alice").await.unwrap(), Some(10.0));

    cache.delete(&["h", "l", "s", "lb"]).await.unwrap();
    cache.close().await;
}
