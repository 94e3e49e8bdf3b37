use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

/// A uniformly chosen index into a collection of `len` items.
/// None if the collection is empty.
#[inline]
pub fn random_index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(rng.gen_range(0..len))
    }
}

/// A uniformly chosen element of `items`, None if there are no items.
#[inline]
pub fn random_entry<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    random_index(rng, items.len()).map(|index| &items[index])
}

/// A uniformly chosen integer in the half open range `min..max`.
/// None if the range is empty.
#[inline]
pub fn random_range<R: Rng + ?Sized>(rng: &mut R, min: usize, max: usize) -> Option<usize> {
    if min < max {
        Some(rng.gen_range(min..max))
    } else {
        None
    }
}

/// Fisher-Yates shuffle in place.
#[inline]
pub fn shuffle<T, R: Rng + ?Sized>(rng: &mut R, items: &mut [T]) {
    items.shuffle(rng);
}

/// Reproducible generator for tests and seeded driver runs.
pub fn seeded_rng(seed: u64) -> XorShiftRng {
    XorShiftRng::seed_from_u64(seed)
}

/// Fast generator seeded from the thread local entropy source.
pub fn entropy_rng() -> XorShiftRng {
    XorShiftRng::from_rng(rand::thread_rng()).unwrap_or_else(|_| seeded_rng(rand::random()))
}
