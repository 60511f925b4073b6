//! Shared-access behavior: many readers, one writer at a time.

use std::thread;

use haarmatch::haar::{Coef, Matrix};
use haarmatch::{config, Hash, Store};

/// Builds a hash without going through pixels; positions and signs are
/// derived from the seed so different seeds index mostly disjoint buckets.
fn synthetic_hash(seed: u64) -> Hash {
    let scale = config::image_scale();
    let mut coefs = vec![Coef::default(); scale * scale];
    coefs[0] = Coef::new([seed as f64, 64.0, 64.0]);
    for k in 0..40usize {
        let position = 1 + ((seed as usize).wrapping_mul(131) + k * 97) % (scale * scale - 1);
        let magnitude = k as f64 + 2.0;
        let value = if k % 3 == 0 { -magnitude } else { magnitude };
        coefs[position] = Coef::new([value, 0.0, 0.0]);
    }
    Hash {
        matrix: Matrix {
            coefs,
            width: scale,
            height: scale,
        },
        thresholds: Coef::new([2.0, 1.0, 1.0]),
        ratio: 1.0,
        dhash: [seed, seed.rotate_left(7)],
        histogram: seed ^ 0xABCD,
        histo_max: [0.1, 0.2, 0.3],
    }
}

#[test]
fn queries_and_snapshots_run_alongside_a_writer() {
    let store: Store<u64> = Store::new();
    for seed in 0..8 {
        store.add(seed, &synthetic_hash(seed));
    }

    thread::scope(|scope| {
        for reader in 0..4u64 {
            let store = &store;
            scope.spawn(move || {
                let probe = synthetic_hash(reader);
                for _ in 0..50 {
                    let matches = store.query(&probe);
                    // The probe's own image never leaves the store.
                    assert!(matches.iter().any(|m| m.id == reader));
                    assert!(store.has(&reader));
                    assert!(store.ids().len() >= 8);
                    assert!(store.size() >= 8);
                }
            });
        }

        let store = &store;
        scope.spawn(move || {
            for seed in 100..120 {
                store.add(seed, &synthetic_hash(seed));
            }
        });
    });

    assert_eq!(store.size(), 28);
    for seed in (0..8).chain(100..120) {
        assert!(store.has(&seed));
    }
}

#[test]
fn an_added_image_is_visible_to_the_next_query() {
    let store: Store<u64> = Store::new();
    let hash = synthetic_hash(42);
    store.add(42, &hash);
    // The write lock is released before query takes the read side, so the
    // posting lists already contain the new slot.
    let matches = store.query(&hash);
    assert!(matches.iter().any(|m| m.id == 42));
}
