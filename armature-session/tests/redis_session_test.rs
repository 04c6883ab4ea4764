//! Integration tests for the Redis session driver.
//!
//! These tests require a running Redis server. They are disabled by default
//! and can be run with: cargo test -- --ignored
//!
//! `REDIS_SERVER` overrides the default `127.0.0.1:6379`.

use armature_session::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn server() -> String {
    std::env::var("REDIS_SERVER").unwrap_or_else(|_| "127.0.0.1:6379".to_string())
}

fn unique_prefix(test: &str) -> String {
    format!("armature-test:{}:{}:", test, std::process::id())
}

fn sample() -> SessionMap {
    let mut value = SessionMap::new();
    value.insert("user_id".to_string(), json!(123));
    value.insert("username".to_string(), json!("alice"));
    value.insert("roles".to_string(), json!(["admin", "editor"]));
    value
}

async fn open(expiry: Duration) -> RedisSessionConnect {
    let config = SessionConfig::new(expiry).with_setting("server", server());
    let conn = RedisSessionConnect::new("integration", config).unwrap();
    conn.open().await.unwrap();
    conn
}

async fn ttl(key: &str) -> i64 {
    let client = redis::Client::open(format!("redis://{}/", server())).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    redis::cmd("TTL").arg(key).query_async(&mut conn).await.unwrap()
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_write_then_read_round_trip() {
    let conn = open(Duration::from_secs(3600)).await;
    let id = format!("{}session", unique_prefix("round_trip"));

    conn.write(&id, &sample(), Duration::from_secs(60))
        .await
        .unwrap();
    let stored = conn.read(&id).await.unwrap();
    assert_eq!(stored, sample());

    let mut updated = sample();
    updated.insert("username".to_string(), json!("bob"));
    conn.write(&id, &updated, Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(conn.read(&id).await.unwrap()["username"], json!("bob"));

    conn.delete(&id).await.unwrap();
    conn.close().await.unwrap();
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_empty_session_is_not_missing() {
    let conn = open(Duration::from_secs(3600)).await;
    let id = format!("{}empty", unique_prefix("empty"));

    conn.write(&id, &SessionMap::new(), Duration::from_secs(60))
        .await
        .unwrap();
    assert!(conn.read(&id).await.unwrap().is_empty());

    conn.delete(&id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_read_missing_is_not_found() {
    let conn = open(Duration::from_secs(3600)).await;
    let id = format!("{}never-written", unique_prefix("missing"));

    let err = conn.read(&id).await.unwrap_err();
    assert!(err.is_not_found());

    conn.write(&id, &sample(), Duration::from_secs(60))
        .await
        .unwrap();
    conn.delete(&id).await.unwrap();

    let err = conn.read(&id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_caller_expiry_is_honoured() {
    let conn = open(Duration::from_secs(3600)).await;
    let id = format!("{}explicit", unique_prefix("expiry"));

    conn.write(&id, &sample(), Duration::from_secs(120))
        .await
        .unwrap();
    let remaining = ttl(&id).await;
    assert!(remaining > 100 && remaining <= 120, "ttl was {remaining}");

    conn.delete(&id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_zero_expiry_uses_default() {
    let conn = open(Duration::from_secs(900)).await;
    let id = format!("{}default", unique_prefix("expiry"));

    conn.write(&id, &sample(), Duration::ZERO).await.unwrap();
    let remaining = ttl(&id).await;
    assert!(remaining > 880 && remaining <= 900, "ttl was {remaining}");

    conn.delete(&id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_zero_default_expiry_persists() {
    let conn = open(Duration::ZERO).await;
    let id = format!("{}persist", unique_prefix("expiry"));

    conn.write(&id, &sample(), Duration::ZERO).await.unwrap();
    assert_eq!(ttl(&id).await, -1);

    conn.delete(&id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_session_expires() {
    let conn = open(Duration::from_secs(3600)).await;
    let id = format!("{}short", unique_prefix("expires"));

    conn.write(&id, &sample(), Duration::from_secs(1))
        .await
        .unwrap();
    assert!(conn.read(&id).await.is_ok());

    tokio::time::sleep(Duration::from_millis(2100)).await;

    assert!(conn.read(&id).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_delete_missing_succeeds() {
    let conn = open(Duration::from_secs(3600)).await;
    let id = format!("{}ghost", unique_prefix("delete"));

    conn.delete(&id).await.unwrap();
    conn.delete(&id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_clear_removes_only_prefixed_sessions() {
    let conn = open(Duration::from_secs(3600)).await;
    let prefix = unique_prefix("clear");
    let other = format!("{}other", unique_prefix("clear-keep"));

    conn.write(&format!("{prefix}a"), &sample(), Duration::from_secs(60))
        .await
        .unwrap();
    conn.write(&format!("{prefix}b"), &sample(), Duration::from_secs(60))
        .await
        .unwrap();
    conn.write(&other, &sample(), Duration::from_secs(60))
        .await
        .unwrap();

    let cleared = conn.clear(&prefix).await.unwrap();
    assert_eq!(cleared, 2);

    assert!(conn.read(&format!("{prefix}a")).await.unwrap_err().is_not_found());
    assert!(conn.read(&format!("{prefix}b")).await.unwrap_err().is_not_found());
    assert_eq!(conn.read(&other).await.unwrap(), sample());

    assert_eq!(conn.clear(&prefix).await.unwrap(), 0);
    conn.delete(&other).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_concurrent_writes_complete() {
    let config = SessionConfig::new(Duration::from_secs(3600))
        .with_setting("server", server())
        .with_setting("active", 16)
        .with_setting("idle", 4);
    let conn = Arc::new(RedisSessionConnect::new("concurrent", config).unwrap());
    conn.open().await.unwrap();

    let prefix = unique_prefix("concurrent");
    let writes = (0..16).map(|i| {
        let conn = Arc::clone(&conn);
        let id = format!("{prefix}{i}");
        tokio::spawn(async move {
            let mut value = SessionMap::new();
            value.insert("n".to_string(), json!(i));
            conn.write(&id, &value, Duration::from_secs(60)).await?;
            conn.read(&id).await
        })
    });

    for (i, result) in futures::future::join_all(writes).await.into_iter().enumerate() {
        let value = result.unwrap().unwrap();
        assert_eq!(value["n"], json!(i));
    }

    assert!(conn.pool_stats().unwrap().connections <= 16);

    assert_eq!(conn.clear(&prefix).await.unwrap(), 16);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_close_invalidates_handle() {
    let conn = open(Duration::from_secs(3600)).await;
    assert!(conn.is_open());

    conn.close().await.unwrap();
    assert!(!conn.is_open());
    assert!(matches!(
        conn.read("anything").await,
        Err(SessionError::InvalidConnection)
    ));

    // Reopening after close works
    conn.open().await.unwrap();
    assert!(conn.is_open());
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_database_selection_isolates_sessions() {
    let id = format!("{}isolated", unique_prefix("database"));

    let config = SessionConfig::default()
        .with_setting("server", server())
        .with_setting("database", "1");
    let db1 = RedisSessionConnect::new("db1", config).unwrap();
    db1.open().await.unwrap();

    let db0 = open(Duration::from_secs(3600)).await;

    db1.write(&id, &sample(), Duration::from_secs(60))
        .await
        .unwrap();
    assert!(db0.read(&id).await.unwrap_err().is_not_found());
    assert_eq!(db1.read(&id).await.unwrap(), sample());

    db1.delete(&id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_corrupt_payload_is_deserialization_error() {
    let conn = open(Duration::from_secs(3600)).await;
    let id = format!("{}corrupt", unique_prefix("corrupt"));

    let client = redis::Client::open(format!("redis://{}/", server())).unwrap();
    let mut raw = client.get_multiplexed_async_connection().await.unwrap();
    let _: () = redis::cmd("SET")
        .arg(&id)
        .arg("not json")
        .query_async(&mut raw)
        .await
        .unwrap();

    assert!(matches!(
        conn.read(&id).await,
        Err(SessionError::Deserialization(_))
    ));

    conn.delete(&id).await.unwrap();
}
