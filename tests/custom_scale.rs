//! The full pipeline under non-default tuning.
//!
//! Tuning is process-global, so this lives in its own test binary and sets
//! the knobs exactly once, before any hash or store exists.

use haarmatch::{config, create_hash, sort_matches, Store};
use image::{DynamicImage, Rgb, RgbImage};

fn pattern_image(seed: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(80, 60, |x, y| {
        let v = (((x * 13) ^ (y * 7) ^ (x * y) ^ seed) & 0xFF) as u8;
        Rgb([v, v / 2, v.wrapping_add(90)])
    }))
}

#[test]
fn hashing_querying_and_persistence_follow_the_configured_scale() {
    config::set_image_scale(32);
    config::set_top_coefs(12);
    assert_eq!(config::image_scale(), 32);
    assert_eq!(config::top_coefs(), 12);

    let (hash, scaled) = create_hash(&pattern_image(1));
    assert_eq!(scaled.dimensions(), (32, 32));
    assert_eq!(hash.matrix.coefs.len(), 32 * 32);

    let store: Store<u32> = Store::new();
    store.add(1, &hash);
    let (other, _) = create_hash(&pattern_image(900));
    store.add(2, &other);

    let mut matches = store.query(&hash);
    assert!(!matches.is_empty());
    sort_matches(&mut matches);
    assert_eq!(matches[0].id, 1);

    let decoded: Store<u32> = Store::decode(&store.encode().unwrap()).unwrap();
    assert_eq!(decoded, store);
    assert_eq!(decoded.query(&hash).len(), matches.len());
}
