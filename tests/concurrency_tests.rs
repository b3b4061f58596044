mod test_utils;

use stage_store::entities::asset::ImageData;
use test_utils::*;

const ROUNDS: usize = 60;
const LISTERS: usize = 3;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn listings_running_during_saves_keep_owner_metadata() {
    let store = TestStore::new();
    let mut saved_ids = Vec::with_capacity(ROUNDS);

    for _ in 0..ROUNDS {
        let listers: Vec<_> = (0..LISTERS)
            .map(|_| {
                let assets = store.assets.clone();
                tokio::spawn(async move { assets.get_all_images(None, None).await })
            })
            .collect();

        let assets = store.assets.clone();
        let save = tokio::spawn(async move {
            assets
                .save_image(ImageData::Bytes(png_bytes(128)), metadata(Some("u1"), Some("c1")))
                .await
        });

        for lister in listers {
            lister.await.unwrap().expect("listing failed");
        }
        let saved = save.await.unwrap().expect("save failed");

        let found = store.assets.get_image(&saved.asset.id).await.unwrap().expect("asset missing");
        assert_eq!(found.asset.owner_id.as_deref(), Some("u1"), "asset {} lost its owner", saved.asset.id);
        saved_ids.push(saved.asset.id);
    }

    let listed = store.assets.get_all_images(Some("u1"), Some("c1")).await.unwrap();
    assert_eq!(listed.len(), ROUNDS);
    for id in &saved_ids {
        assert!(listed.iter().any(|image| &image.asset.id == id));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn eviction_running_during_saves_keeps_survivors_owned() {
    let store = TestStore::new();

    let assets = store.assets.clone();
    let evictor = tokio::spawn(async move {
        for _ in 0..20 {
            // A ceiling no test write reaches: the pass only reads.
            assets.cleanup_old_images(1024.0).await.expect("eviction failed");
        }
    });

    let mut saved_ids = Vec::new();
    for _ in 0..20 {
        let saved = store.assets
            .save_image(ImageData::Bytes(png_bytes(64)), metadata(Some("u2"), None))
            .await
            .unwrap();
        saved_ids.push(saved.asset.id);
    }
    evictor.await.unwrap();

    let listed = store.assets.get_all_images(Some("u2"), None).await.unwrap();
    assert_eq!(listed.len(), saved_ids.len());
}
