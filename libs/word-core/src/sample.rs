//! Uniform random sampling for practice draws.

use rand::Rng;

/// Draw up to `count` distinct elements of `pool` in uniformly random order.
///
/// Shuffles an index array with Fisher–Yates and keeps a prefix of length
/// `min(count, pool.len())`, so the pool itself is never reordered.
pub fn draw<T: Clone, R: Rng>(pool: &[T], count: usize, rng: &mut R) -> Vec<T> {
    let mut order: Vec<usize> = (0..pool.len()).collect();
    for i in (1..order.len()).rev() {
        let j = rng.random_range(0..=i);
        order.swap(i, j);
    }
    order.truncate(count.min(pool.len()));
    order.into_iter().map(|i| pool[i].clone()).collect()
}
