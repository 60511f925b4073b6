//! Store persistence through the public API.

use haarmatch::{create_hash, Store};
use image::{DynamicImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Composite id, the kind a caller might use to point into paged documents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct ImageKey {
    name: String,
    page: u32,
}

fn key(page: u32) -> ImageKey {
    ImageKey {
        name: "image".to_string(),
        page,
    }
}

fn pattern_image(seed: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(96, 64, |x, y| {
        let v = (((x * 13) ^ (y * 7) ^ (x * y) ^ seed) & 0xFF) as u8;
        Rgb([v, v.wrapping_add(60), v / 2])
    }))
}

#[test]
fn roundtrip_reconstructs_the_store_structurally() {
    let store: Store<ImageKey> = Store::new();
    for page in 1..=3 {
        let (hash, _) = create_hash(&pattern_image(page * 37));
        store.add(key(page), &hash);
    }

    let bytes = store.encode().unwrap();
    let decoded: Store<ImageKey> = Store::decode(&bytes).unwrap();

    assert_eq!(decoded, store);
    assert_eq!(decoded.size(), 3);
    for page in 1..=3 {
        assert!(decoded.has(&key(page)));
    }
    assert!(!decoded.modified());
}

#[test]
fn decoded_stores_keep_answering_queries() {
    let store: Store<ImageKey> = Store::new();
    let (hash, _) = create_hash(&pattern_image(11));
    store.add(key(1), &hash);
    let (other, _) = create_hash(&pattern_image(400));
    store.add(key(2), &other);

    let decoded: Store<ImageKey> = Store::decode(&store.encode().unwrap()).unwrap();
    let matches = decoded.query(&hash);
    assert!(matches.iter().any(|m| m.id == key(1)));
}

#[test]
fn empty_stores_roundtrip() {
    let store: Store<String> = Store::new();
    let decoded: Store<String> = Store::decode(&store.encode().unwrap()).unwrap();
    assert_eq!(decoded, store);
    assert_eq!(decoded.size(), 0);
    assert!(decoded.ids().is_empty());
}

#[test]
fn mutations_after_decode_are_tracked() {
    let store: Store<String> = Store::new();
    let (hash, _) = create_hash(&pattern_image(5));
    store.add("a".to_string(), &hash);

    let decoded: Store<String> = Store::decode(&store.encode().unwrap()).unwrap();
    assert!(!decoded.modified());
    decoded.delete(&"a".to_string());
    assert!(decoded.modified());
}
