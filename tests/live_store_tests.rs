//! Runs against a real S3-compatible server (SeaweedFS on :8333 by default).
//!
//! Start one with `weed server -s3` and run `cargo test -- --ignored`.
//! S3_* variables override the defaults below.

use bytes::Bytes;
use object_store_smoke::{
    config::{ACCESS_KEY_KEY, SECRET_KEY_KEY},
    AppBuilder, ConfigOverrides, ConfigResolver, ConnectionConfig, ConnectionDefaults,
    ObjectKey, ObjectPayload, ObjectStore, RunState, S3ObjectStoreAdapter, TEST_PAYLOAD,
};
use std::{env, time::Duration};

// Environment first, local test credentials when unset
fn resolver() -> ConfigResolver<impl Fn(&str) -> Option<String>> {
    ConfigResolver::new(
        ConnectionDefaults::default(),
        ConfigOverrides::default(),
        |key: &str| {
            env::var(key).ok().or_else(|| {
                (key == ACCESS_KEY_KEY || key == SECRET_KEY_KEY).then(|| "test".to_string())
            })
        },
    )
}

fn connection() -> ConnectionConfig {
    let connection = resolver().resolve().expect("connection settings");

    println!(
        "Connecting to {} (bucket {}, path style {})",
        connection.endpoint(),
        connection.bucket(),
        connection.path_style()
    );
    connection
}

#[tokio::test]
#[ignore = "requires a running S3-compatible server"]
async fn full_verification_run() {
    let app = AppBuilder::from_resolver(&resolver())
        .expect("connection settings")
        .with_key_prefix("live-test")
        .build()
        .expect("application");

    let report = app.runner.run().await;
    for step in &report.steps {
        println!("{}", step);
    }

    assert_eq!(report.state, RunState::Done, "{:?}", report.error);
}

#[tokio::test]
#[ignore = "requires a running S3-compatible server"]
async fn object_lifecycle_against_server() {
    let connection = connection();
    let bucket = connection.bucket().clone();
    let store = S3ObjectStoreAdapter::new(connection).expect("adapter");

    // Created or already exists, both are fine
    let creation = store.create_bucket(&bucket).await.expect("create bucket");
    println!("Bucket {}: {}", bucket, creation);
    tokio::time::sleep(Duration::from_secs(1)).await;

    let key = ObjectKey::new(format!(
        "live-test/{}/test-file.txt",
        chrono::Utc::now().timestamp_millis()
    ));

    let receipt = store
        .put_object(&bucket, &key, ObjectPayload::text(Bytes::from_static(TEST_PAYLOAD)))
        .await
        .expect("put");
    assert_eq!(receipt.size, TEST_PAYLOAD.len() as u64);

    let downloaded = store.get_object(&bucket, &key).await.expect("get");
    assert_eq!(downloaded.as_ref(), TEST_PAYLOAD);

    let listing = store.list_objects(&bucket).await.expect("list");
    let matching: Vec<_> = listing.iter().filter(|item| item.key == key).collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].size, TEST_PAYLOAD.len() as u64);

    store.delete_object(&bucket, &key).await.expect("delete");

    let listing = store.list_objects(&bucket).await.expect("list after delete");
    assert!(listing.iter().all(|item| item.key != key));

    // Deleting an absent key is not an error
    store
        .delete_object(&bucket, &key)
        .await
        .expect("delete absent key");

    assert!(store
        .get_object(&bucket, &key)
        .await
        .unwrap_err()
        .is_not_found());
}
