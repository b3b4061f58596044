mod test_utils;

use std::time::{Duration, SystemTime};

use stage_store::{entities::asset::ImageData, errors::AppError};
use test_utils::*;

const ASSET_SIZE: usize = 1000;

async fn seed(store: &TestStore, count: usize) -> Vec<String> {
    let mut ids = Vec::new();
    for _ in 0..count {
        let saved = store.assets
            .save_image(ImageData::Bytes(png_bytes(ASSET_SIZE)), metadata(Some("u1"), None))
            .await
            .unwrap();
        ids.push(saved.asset.id);
        tick().await;
    }
    ids
}

#[actix_rt::test]
async fn eviction_removes_oldest_until_eighty_percent() {
    let store = TestStore::new();
    let ids = seed(&store, 10).await;
    let max_bytes = 8000;

    let report = store.assets.cleanup_old_images(mb(max_bytes)).await.unwrap();

    assert_eq!(report.bytes_before, 10_000);
    assert_eq!(report.files_before, 10);
    assert_eq!(report.deleted, ids[..4].to_vec());
    assert_eq!(report.bytes_after, 6000);

    let usage = store.blobs().usage().await.unwrap();
    assert_eq!(usage.bytes, report.bytes_after);
    assert!(usage.bytes <= max_bytes);
    assert!(usage.bytes + ASSET_SIZE as u64 > (max_bytes as f64 * 0.8) as u64);

    let remaining: Vec<String> = store.assets
        .get_all_images(None, None)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.asset.id)
        .collect();
    let mut expected: Vec<String> = ids[4..].to_vec();
    expected.reverse();
    assert_eq!(remaining, expected);
}

#[actix_rt::test]
async fn eviction_is_a_no_op_below_the_limit() {
    let store = TestStore::new();
    seed(&store, 3).await;

    let report = store.assets.cleanup_old_images(mb(5000)).await.unwrap();

    assert!(report.deleted.is_empty());
    assert_eq!(report.bytes_before, 3000);
    assert_eq!(report.bytes_after, 3000);
    assert_eq!(store.blobs().usage().await.unwrap().files, 3);
}

#[actix_rt::test]
async fn eviction_includes_untracked_files_by_modification_time() {
    let store = TestStore::new();
    let ids = seed(&store, 4).await;

    let legacy = store.asset_root().join("legacy.png");
    std::fs::write(&legacy, png_bytes(ASSET_SIZE)).unwrap();
    let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
    std::fs::File::options()
        .write(true)
        .open(&legacy)
        .unwrap()
        .set_modified(an_hour_ago)
        .unwrap();

    // 5000 bytes against a 4000 byte ceiling: target 3200, so two go.
    let report = store.assets.cleanup_old_images(mb(4000)).await.unwrap();

    assert_eq!(report.deleted, vec!["legacy".to_string(), ids[0].clone()]);
    assert!(!legacy.exists());
    assert_eq!(store.blobs().usage().await.unwrap().bytes, 3000);
}

#[actix_rt::test]
async fn eviction_rejects_non_positive_limits() {
    let store = TestStore::new();

    let err = store.assets.cleanup_old_images(0.0).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}
